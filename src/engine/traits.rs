use super::error::EngineError;
use super::session::TabId;

/// The browser side of the engine: what it can ask the host to do.
#[async_trait::async_trait]
pub trait BrowserHost: Send + Sync {
    /// Points `tab_id` at `url`.
    async fn update_tab(&self, tab_id: TabId, url: &str) -> Result<(), EngineError>;

    /// Sets the toolbar badge. An empty `text` hides it.
    async fn set_badge(&self, text: &str, color: Option<&str>) -> Result<(), EngineError>;
}
