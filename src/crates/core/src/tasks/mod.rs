//! Task domain: tiers, tasks, daily reviews and their store

pub mod store;
pub mod types;

pub use store::TaskStore;
pub use types::{DailyReview, Task, TaskRef, TaskTier};
