// OneThing Core Library - Platform-agnostic business logic
// Layers: Util -> Tasks -> Briefing

pub mod briefing; // Briefing protocol and conversation driver
pub mod config; // TOML configuration with environment overrides
pub mod tasks; // Task domain and persistence
pub mod util; // Errors and shared helpers

// Export main types
pub use util::errors::*;

pub use briefing::{
    BriefingCommitter, BriefingDriver, BriefingEvent, BriefingRequest, BriefingResult,
    BriefingState, BriefingTransport, HttpBriefingTransport, Message, Role,
};
pub use config::AppConfig;
pub use tasks::{DailyReview, Task, TaskRef, TaskStore, TaskTier};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CORE_NAME: &str = "OneThing Core";
