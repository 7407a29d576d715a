//! Blocked-domain and prompt management for the settings page.
//!
//! Every rejected operation leaves the stored lists exactly as they were.

use crate::store::{StateKey, StateRecord, StateStore, StoreError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Please enter a domain")]
    EmptyDomain,
    #[error("'{0}' is not a valid domain (e.g., example.com)")]
    InvalidDomain(String),
    #[error("'{0}' already exists in the blocked list")]
    DomainExists(String),
    #[error("'{0}' is not in the blocked list")]
    DomainNotFound(String),
    #[error("Please enter a prompt message")]
    EmptyPrompt,
    #[error("Prompt \"{0}\" already exists")]
    PromptExists(String),
    #[error("Prompt \"{0}\" not found")]
    PromptNotFound(String),
    #[error("You must have at least one prompt")]
    LastPrompt,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SettingsError {
    /// True for mistakes the user can fix by changing their input.
    pub fn is_validation(&self) -> bool {
        !matches!(self, SettingsError::Store(_))
    }
}

/// Reduces user input such as `https://www.Example.com/path/` to `example.com`.
pub fn normalize_domain(input: &str) -> Result<String, SettingsError> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(SettingsError::EmptyDomain);
    }

    let mut domain = lowered.as_str();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = domain.strip_prefix(scheme) {
            domain = rest;
            break;
        }
    }
    domain = domain.strip_prefix("www.").unwrap_or(domain);
    domain = domain.strip_suffix('/').unwrap_or(domain);
    let domain = domain.split('/').next().unwrap_or_default();

    if !domain.contains('.') {
        return Err(SettingsError::InvalidDomain(input.trim().to_string()));
    }
    Ok(domain.to_string())
}

/// Trims a prompt and gives it a trailing "..." unless it already ends in
/// "...", "!" or "?".
pub fn normalize_prompt(input: &str) -> Result<String, SettingsError> {
    let prompt = input.trim();
    if prompt.is_empty() {
        return Err(SettingsError::EmptyPrompt);
    }
    if prompt.ends_with("...") || prompt.ends_with('!') || prompt.ends_with('?') {
        Ok(prompt.to_string())
    } else {
        Ok(format!("{}...", prompt))
    }
}

pub struct SettingsService {
    store: Arc<dyn StateStore>,
    // Serializes list read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn blocked_domains(&self) -> Result<Vec<String>, SettingsError> {
        Ok(self
            .store
            .get(&[StateKey::BlockedDomains])
            .await?
            .blocked_domains
            .unwrap_or_default())
    }

    pub async fn prompts(&self) -> Result<Vec<String>, SettingsError> {
        Ok(self
            .store
            .get(&[StateKey::BlockPrompts])
            .await?
            .block_prompts
            .unwrap_or_default())
    }

    /// Adds a domain after normalizing it; returns the stored form.
    pub async fn add_domain(&self, input: &str) -> Result<String, SettingsError> {
        let domain = normalize_domain(input)?;

        let _guard = self.write_lock.lock().await;
        let mut domains = self.blocked_domains().await?;
        if domains.contains(&domain) {
            return Err(SettingsError::DomainExists(domain));
        }
        domains.push(domain.clone());
        self.store
            .set(StateRecord::with_blocked_domains(domains))
            .await?;

        info!("Added {} to blocked list", domain);
        Ok(domain)
    }

    pub async fn remove_domain(&self, domain: &str) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;
        let mut domains = self.blocked_domains().await?;
        let Some(index) = domains.iter().position(|d| d == domain) else {
            return Err(SettingsError::DomainNotFound(domain.to_string()));
        };
        domains.remove(index);
        self.store
            .set(StateRecord::with_blocked_domains(domains))
            .await?;

        info!("Removed {} from blocked list", domain);
        Ok(())
    }

    pub async fn add_prompt(&self, input: &str) -> Result<String, SettingsError> {
        let prompt = normalize_prompt(input)?;

        let _guard = self.write_lock.lock().await;
        let mut prompts = self.prompts().await?;
        if prompts.contains(&prompt) {
            return Err(SettingsError::PromptExists(prompt));
        }
        prompts.push(prompt.clone());
        self.store
            .set(StateRecord::with_block_prompts(prompts))
            .await?;

        info!("Added prompt \"{}\"", prompt);
        Ok(prompt)
    }

    /// Removes a prompt. The list can never become empty.
    pub async fn remove_prompt(&self, prompt: &str) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;
        let mut prompts = self.prompts().await?;
        let Some(index) = prompts.iter().position(|p| p == prompt) else {
            return Err(SettingsError::PromptNotFound(prompt.to_string()));
        };
        if prompts.len() == 1 {
            return Err(SettingsError::LastPrompt);
        }
        prompts.remove(index);
        self.store
            .set(StateRecord::with_block_prompts(prompts))
            .await?;

        info!("Removed prompt \"{}\"", prompt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(
            normalize_domain("https://www.Example.com/path/").unwrap(),
            "example.com"
        );
        assert_eq!(normalize_domain("  Reddit.com  ").unwrap(), "reddit.com");
        assert_eq!(normalize_domain("http://old.reddit.com/").unwrap(), "old.reddit.com");
        assert!(matches!(normalize_domain("   "), Err(SettingsError::EmptyDomain)));
        assert!(matches!(
            normalize_domain("localhost"),
            Err(SettingsError::InvalidDomain(_))
        ));
        assert!(matches!(
            normalize_domain("https:///x.com"),
            Err(SettingsError::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_normalize_prompt() {
        assert_eq!(normalize_prompt(" Really ").unwrap(), "Really...");
        assert_eq!(normalize_prompt("Again?").unwrap(), "Again?");
        assert_eq!(normalize_prompt("Stop!").unwrap(), "Stop!");
        assert_eq!(normalize_prompt("Hmm...").unwrap(), "Hmm...");
        assert!(matches!(normalize_prompt(""), Err(SettingsError::EmptyPrompt)));
    }

    #[tokio::test]
    async fn test_duplicate_domain_is_rejected() {
        let service = SettingsService::new(Arc::new(MemoryStore::new()));

        assert_eq!(
            service.add_domain("https://www.Example.com/path/").await.unwrap(),
            "example.com"
        );
        let err = service.add_domain("example.com").await.unwrap_err();
        assert!(matches!(err, SettingsError::DomainExists(_)));
        assert!(err.to_string().contains("already exists"));

        assert_eq!(service.blocked_domains().await.unwrap(), vec!["example.com"]);
    }

    #[tokio::test]
    async fn test_remove_domain() {
        let service = SettingsService::new(Arc::new(MemoryStore::new()));
        service.add_domain("a.com").await.unwrap();
        service.add_domain("b.com").await.unwrap();

        service.remove_domain("a.com").await.unwrap();
        assert_eq!(service.blocked_domains().await.unwrap(), vec!["b.com"]);
        assert!(matches!(
            service.remove_domain("a.com").await,
            Err(SettingsError::DomainNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_last_prompt_cannot_be_removed() {
        let service = SettingsService::new(Arc::new(MemoryStore::with_state(
            StateRecord::with_block_prompts(vec!["Hold on...".to_string(), "Bruh...".to_string()]),
        )));

        service.remove_prompt("Bruh...").await.unwrap();
        assert!(matches!(
            service.remove_prompt("Hold on...").await,
            Err(SettingsError::LastPrompt)
        ));
        assert_eq!(service.prompts().await.unwrap(), vec!["Hold on..."]);
    }

    #[tokio::test]
    async fn test_add_prompt_normalizes_and_dedupes() {
        let service = SettingsService::new(Arc::new(MemoryStore::new()));
        assert_eq!(service.add_prompt("Seriously").await.unwrap(), "Seriously...");
        assert!(matches!(
            service.add_prompt("Seriously...").await,
            Err(SettingsError::PromptExists(_))
        ));
        assert!(matches!(
            service.remove_prompt("Nope...").await,
            Err(SettingsError::PromptNotFound(_))
        ));
    }
}
