use super::decision::{decide, precheck, Decision, Disposition, NavigationEvent, SessionUpdate};
use super::error::EngineError;
use super::matcher::DomainMatcher;
use super::session::{TabId, TabSession, TabSessionTracker};
use super::traits::BrowserHost;
use crate::config::Config;
use crate::counters::{badge_text, DailyCounterService};
use crate::interstitial::interstitial_url;
use crate::logger::{DecisionAction, DecisionLogEntry, DecisionLogger};
use crate::messages::Message;
use crate::store::{seed_defaults, StateKey, StateStore};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const BADGE_COLOR: &str = "#FF6B6B";

/// Page locations and first-install defaults the engine needs.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub extension_origin: String,
    pub interstitial_url: String,
    pub focus_url: String,
    pub default_domains: Vec<String>,
    pub default_prompts: Vec<String>,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            extension_origin: config.pages.extension_origin.clone(),
            interstitial_url: config.pages.interstitial_url(),
            focus_url: config.pages.focus_url(),
            default_domains: config.defaults.blocked_domains.clone(),
            default_prompts: config.defaults.prompts.clone(),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Applies navigation decisions against the store and the browser host.
///
/// Every public handler absorbs its own errors: failures are logged and the
/// navigation is left alone.
pub struct NavigationEngine {
    store: Arc<dyn StateStore>,
    host: Arc<dyn BrowserHost>,
    counters: Arc<DailyCounterService>,
    sessions: TabSessionTracker,
    logger: Option<Arc<DecisionLogger>>,
    options: EngineOptions,
}

impl NavigationEngine {
    pub fn new(
        store: Arc<dyn StateStore>,
        host: Arc<dyn BrowserHost>,
        counters: Arc<DailyCounterService>,
        options: EngineOptions,
    ) -> Self {
        Self {
            store,
            host,
            counters,
            sessions: TabSessionTracker::new(),
            logger: None,
            options,
        }
    }

    pub fn with_logger(mut self, logger: Arc<DecisionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn sessions(&self) -> &TabSessionTracker {
        &self.sessions
    }

    pub fn counters(&self) -> &Arc<DailyCounterService> {
        &self.counters
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn session(&self, tab_id: TabId) -> TabSession {
        self.sessions.get(tab_id)
    }

    pub async fn handle_navigation(&self, event: NavigationEvent) -> Disposition {
        match self.try_handle_navigation(&event).await {
            Ok(disposition) => disposition,
            Err(e) => {
                error!(
                    tab = event.tab_id,
                    url = %event.url,
                    "Error in navigation handler: {}", e
                );
                Disposition::Ignore
            }
        }
    }

    async fn try_handle_navigation(
        &self,
        event: &NavigationEvent,
    ) -> Result<Disposition, EngineError> {
        if precheck(event, &self.options.extension_origin).is_some() {
            return Ok(Disposition::Ignore);
        }

        let record = self.store.get(&[StateKey::BlockedDomains]).await?;
        let matcher = DomainMatcher::new(record.blocked_domains.unwrap_or_default());
        let session = self.sessions.get(event.tab_id);
        let decision = decide(event, &matcher, session, &self.options.extension_origin)?;

        match decision.session_update {
            SessionUpdate::Keep => {}
            SessionUpdate::Reset => self.sessions.reset(event.tab_id),
            SessionUpdate::MarkOnInterstitial => self.sessions.mark_on_interstitial(event.tab_id),
        }

        let count = match &decision.disposition {
            Disposition::Intercept { domain } => {
                match self.intercept(event, &decision, domain).await {
                    Ok(count) => Some(count),
                    Err(e) => {
                        // Nothing was shown, so the next attempt should prompt again.
                        self.sessions.clear_interstitial(event.tab_id);
                        return Err(e);
                    }
                }
            }
            _ => None,
        };

        self.log_decision(event, &decision, count);
        Ok(decision.disposition)
    }

    async fn intercept(
        &self,
        event: &NavigationEvent,
        decision: &Decision,
        domain: &str,
    ) -> Result<u64, EngineError> {
        info!(
            "Blocking navigation to: {}",
            decision.host.as_deref().unwrap_or(domain)
        );

        // Counted before redirecting: an abandoned interstitial is still a visit.
        let count = self.counters.increment(domain).await?;

        let target = interstitial_url(&self.options.interstitial_url, &event.url, domain, count)
            .map_err(|source| EngineError::InvalidUrl {
                url: self.options.interstitial_url.clone(),
                source,
            })?;
        self.host.update_tab(event.tab_id, &target).await?;

        self.update_badge().await;
        Ok(count)
    }

    pub async fn handle_message(&self, tab_id: Option<TabId>, message: Message) {
        match message {
            Message::UpdateBadge => self.update_badge().await,
            Message::LeavingBlockPage => match tab_id {
                Some(tab_id) => {
                    debug!("Tab {} left the interstitial", tab_id);
                    self.sessions.clear_interstitial(tab_id);
                }
                None => warn!("LEAVING_BLOCK_PAGE without a sender tab"),
            },
            Message::BlockDecision {
                allowed,
                original_url,
            } => match tab_id {
                Some(tab_id) => {
                    self.handle_block_decision(tab_id, allowed, original_url.as_deref())
                        .await
                }
                None => warn!("BLOCK_DECISION without a sender tab"),
            },
        }
    }

    pub async fn handle_block_decision(
        &self,
        tab_id: TabId,
        allowed: bool,
        original_url: Option<&str>,
    ) {
        self.sessions.clear_interstitial(tab_id);

        let (action, target) = if allowed {
            self.sessions.mark_allowed(tab_id);
            (DecisionAction::Allowed, original_url)
        } else {
            (DecisionAction::Declined, Some(self.options.focus_url.as_str()))
        };

        match target {
            Some(url) => {
                if let Err(e) = self.host.update_tab(tab_id, url).await {
                    error!(tab = tab_id, "Failed to redirect after decision: {}", e);
                }
            }
            None => warn!(
                tab = tab_id,
                "Continue chosen without an original url, leaving tab in place"
            ),
        }

        if let Some(logger) = &self.logger {
            logger.log(DecisionLogEntry::new(
                tab_id,
                target.unwrap_or_default(),
                action,
            ));
        }
    }

    pub fn handle_tab_removed(&self, tab_id: TabId) {
        debug!("Tab {} closed, dropping session", tab_id);
        self.sessions.clear_all(tab_id);
    }

    /// Browser startup: only the badge needs restoring.
    pub async fn on_startup(&self) {
        self.update_badge().await;
    }

    /// First install or update: seed defaults that are missing, then badge.
    pub async fn on_installed(&self) {
        if let Err(e) = seed_defaults(
            self.store.as_ref(),
            &self.options.default_domains,
            &self.options.default_prompts,
        )
        .await
        {
            error!("Failed to seed default settings: {}", e);
        }
        self.update_badge().await;
    }

    pub async fn update_badge(&self) {
        if let Err(e) = self.try_update_badge().await {
            error!("Failed to update badge: {}", e);
        }
    }

    /// Recomputes today's total and pushes it to the badge.
    pub async fn try_update_badge(&self) -> Result<String, EngineError> {
        let total = self.counters.get_total().await?;
        let text = badge_text(total);
        let color = (total > 0).then_some(BADGE_COLOR);
        self.host.set_badge(&text, color).await?;
        Ok(text)
    }

    fn log_decision(&self, event: &NavigationEvent, decision: &Decision, count: Option<u64>) {
        let Some(logger) = &self.logger else {
            return;
        };
        let (action, domain) = match &decision.disposition {
            Disposition::Ignore => (DecisionAction::Ignored, None),
            Disposition::PassThrough => (DecisionAction::PassedThrough, None),
            Disposition::Intercept { domain } => (DecisionAction::Intercepted, Some(domain.clone())),
        };
        let mut entry = DecisionLogEntry::new(event.tab_id, event.url.clone(), action);
        entry.host = decision.host.clone();
        entry.domain = domain;
        entry.count = count;
        logger.log(entry);
    }
}
