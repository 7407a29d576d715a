pub mod decision;
mod error;
pub mod host;
mod matcher;
mod navigation;
pub mod session;
mod traits;

pub use decision::{decide, Decision, Disposition, IgnoreReason, NavigationEvent, SessionUpdate};
pub use error::EngineError;
pub use host::{CommandQueue, HostCommand};
pub use matcher::DomainMatcher;
pub use navigation::{EngineOptions, NavigationEngine, BADGE_COLOR};
pub use session::{TabId, TabSession, TabSessionTracker};
pub use traits::BrowserHost;
