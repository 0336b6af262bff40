use crate::tasks::TaskStore;
use crate::util::errors::OneThingResult;
use async_trait::async_trait;

/// Persists the outcome of a finished briefing.
#[async_trait]
pub trait BriefingCommitter: Send + Sync {
    async fn complete_briefing(&self, task_id: &str, goal: &str) -> OneThingResult<()>;
}

#[async_trait]
impl BriefingCommitter for TaskStore {
    async fn complete_briefing(&self, task_id: &str, goal: &str) -> OneThingResult<()> {
        TaskStore::complete_briefing(self, task_id, goal).await?;
        Ok(())
    }
}
