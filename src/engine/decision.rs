//! Pure per-navigation decision logic.
//!
//! [`decide`] looks only at the event, the blocked-domain matcher and the
//! tab's current session flags. It performs no I/O; the caller applies the
//! returned [`SessionUpdate`] and carries out any redirect.

use super::error::EngineError;
use super::matcher::DomainMatcher;
use super::session::{TabId, TabSession};
use serde::{Deserialize, Serialize};
use url::Url;

/// A navigation reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    pub tab_id: TabId,
    pub url: String,
    /// 0 for the tab's top-level frame.
    #[serde(default)]
    pub frame_id: i64,
}

impl NavigationEvent {
    pub fn top_level(tab_id: TabId, url: impl Into<String>) -> Self {
        Self {
            tab_id,
            url: url.into(),
            frame_id: 0,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.frame_id == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Disposition {
    Ignore,
    PassThrough,
    /// Show the interstitial; `domain` is the blocked entry that matched.
    Intercept { domain: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IgnoreReason {
    SubFrame,
    ExtensionPage,
    NotBlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    Keep,
    Reset,
    MarkOnInterstitial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub disposition: Disposition,
    pub ignore_reason: Option<IgnoreReason>,
    /// Hostname of the navigation target, when one was parsed.
    pub host: Option<String>,
    pub session_update: SessionUpdate,
}

impl Decision {
    fn ignore(reason: IgnoreReason, host: Option<String>, update: SessionUpdate) -> Self {
        Self {
            disposition: Disposition::Ignore,
            ignore_reason: Some(reason),
            host,
            session_update: update,
        }
    }
}

/// Cheap checks that need neither the URL parsed nor stored state.
pub fn precheck(event: &NavigationEvent, extension_origin: &str) -> Option<IgnoreReason> {
    if !event.is_top_level() {
        return Some(IgnoreReason::SubFrame);
    }
    if !extension_origin.is_empty() && event.url.starts_with(extension_origin) {
        return Some(IgnoreReason::ExtensionPage);
    }
    None
}

/// Hostname of `url`; empty for URLs without one (`about:blank`, `data:`).
pub fn target_host(url: &str) -> Result<String, EngineError> {
    let parsed = Url::parse(url).map_err(|source| EngineError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    Ok(parsed.host_str().unwrap_or_default().to_string())
}

pub fn decide(
    event: &NavigationEvent,
    matcher: &DomainMatcher,
    session: TabSession,
    extension_origin: &str,
) -> Result<Decision, EngineError> {
    if let Some(reason) = precheck(event, extension_origin) {
        return Ok(Decision::ignore(reason, None, SessionUpdate::Keep));
    }

    let host = target_host(&event.url)?;
    let Some(domain) = matcher.matching_entry(&host) else {
        return Ok(Decision::ignore(
            IgnoreReason::NotBlocked,
            Some(host),
            SessionUpdate::Reset,
        ));
    };

    if session.allowed_on_blocked_site || session.on_interstitial {
        return Ok(Decision {
            disposition: Disposition::PassThrough,
            ignore_reason: None,
            host: Some(host),
            session_update: SessionUpdate::Keep,
        });
    }

    Ok(Decision {
        disposition: Disposition::Intercept {
            domain: domain.to_string(),
        },
        ignore_reason: None,
        host: Some(host),
        session_update: SessionUpdate::MarkOnInterstitial,
    })
}
