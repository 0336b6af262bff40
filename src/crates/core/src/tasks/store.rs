//! Task persistence
//!
//! Tasks and daily reviews live in memory behind a single lock. When a data
//! file is configured every mutation is followed by a full JSON snapshot,
//! written to a sibling temp file and renamed into place.

use super::types::{DailyReview, Task, TaskTier};
use crate::util::errors::{OneThingError, OneThingResult};
use chrono::{Local, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreState {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    daily_reviews: Vec<DailyReview>,
}

impl StoreState {
    fn task_mut(&mut self, id: &str) -> OneThingResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| OneThingError::NotFound(format!("Task not found: {}", id)))
    }
}

pub struct TaskStore {
    state: RwLock<StoreState>,
    data_file: Option<PathBuf>,
}

impl TaskStore {
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            data_file: None,
        }
    }

    /// Open a store backed by `data_file`, loading it when it already exists.
    pub async fn open(data_file: impl Into<PathBuf>) -> OneThingResult<Self> {
        let data_file = data_file.into();
        let state = match tokio::fs::read(&data_file).await {
            Ok(bytes) => {
                let state: StoreState = serde_json::from_slice(&bytes)?;
                info!(
                    "Loaded task store: path={}, tasks={}, reviews={}",
                    data_file.display(),
                    state.tasks.len(),
                    state.daily_reviews.len()
                );
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Task store file missing, starting empty: path={}", data_file.display());
                StoreState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            state: RwLock::new(state),
            data_file: Some(data_file),
        })
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    /// All tasks, open ones first, newest first within each group.
    pub async fn get_tasks(&self) -> Vec<Task> {
        let state = self.state.read().await;
        let mut tasks = state.tasks.clone();
        tasks.sort_by(|a, b| {
            a.completed
                .cmp(&b.completed)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        tasks
    }

    #[cfg(test)]
    pub async fn get_task(&self, id: &str) -> OneThingResult<Task> {
        let state = self.state.read().await;
        state
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| OneThingError::NotFound(format!("Task not found: {}", id)))
    }

    pub async fn create_task(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> OneThingResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(OneThingError::Validation("Title is required".to_string()));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let task = Task::new(title, description);
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.tasks.push(task.clone());
        self.commit(&mut state, next).await?;

        debug!("Task created: id={}, title={}", task.id, task.title);
        Ok(task)
    }

    pub async fn toggle_task_complete(&self, id: &str) -> OneThingResult<Task> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let task = next.task_mut(id)?;
        task.completed = !task.completed;
        task.updated_at = Utc::now();
        let task = task.clone();
        self.commit(&mut state, next).await?;
        Ok(task)
    }

    pub async fn delete_task(&self, id: &str) -> OneThingResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.tasks.retain(|task| task.id != id);
        if next.tasks.len() == state.tasks.len() {
            return Err(OneThingError::NotFound(format!("Task not found: {}", id)));
        }
        self.commit(&mut state, next).await?;
        debug!("Task deleted: id={}", id);
        Ok(())
    }

    pub async fn update_task_tier(&self, id: &str, tier: TaskTier) -> OneThingResult<Task> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let task = next.task_mut(id)?;
        task.tier = tier;
        task.updated_at = Utc::now();
        let task = task.clone();
        self.commit(&mut state, next).await?;
        Ok(task)
    }

    /// Commit a briefing outcome for today (local calendar date).
    pub async fn complete_briefing(
        &self,
        task_id: &str,
        goal: &str,
    ) -> OneThingResult<DailyReview> {
        self.complete_briefing_on(Local::now().date_naive(), task_id, goal)
            .await
    }

    /// Demote any current ONE Thing to `supporting`, promote `task_id`, and
    /// upsert the review for `date`. Nothing changes if the task is unknown
    /// or the snapshot cannot be written.
    pub async fn complete_briefing_on(
        &self,
        date: NaiveDate,
        task_id: &str,
        goal: &str,
    ) -> OneThingResult<DailyReview> {
        let mut state = self.state.write().await;
        if !state.tasks.iter().any(|task| task.id == task_id) {
            return Err(OneThingError::NotFound(format!("Task not found: {}", task_id)));
        }

        let mut next = state.clone();
        let now = Utc::now();
        for task in next.tasks.iter_mut() {
            if task.tier == TaskTier::OneThing && task.id != task_id {
                task.tier = TaskTier::Supporting;
                task.updated_at = now;
            }
        }
        let task = next.task_mut(task_id)?;
        task.tier = TaskTier::OneThing;
        task.updated_at = now;

        let review = match next.daily_reviews.iter_mut().find(|r| r.date == date) {
            Some(review) => {
                review.one_thing_id = task_id.to_string();
                review.one_thing_goal = goal.to_string();
                review.updated_at = now;
                review.clone()
            }
            None => {
                let review = DailyReview {
                    date,
                    one_thing_id: task_id.to_string(),
                    one_thing_goal: goal.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                next.daily_reviews.push(review.clone());
                review
            }
        };

        self.commit(&mut state, next).await?;
        info!("Briefing completed: date={}, task_id={}", date, task_id);
        Ok(review)
    }

    pub async fn get_todays_briefing(&self) -> Option<DailyReview> {
        self.get_briefing_on(Local::now().date_naive()).await
    }

    pub async fn get_briefing_on(&self, date: NaiveDate) -> Option<DailyReview> {
        let state = self.state.read().await;
        state.daily_reviews.iter().find(|r| r.date == date).cloned()
    }

    /// Write `next` to disk, then make it the live state. On failure the
    /// live state is left untouched.
    async fn commit(&self, state: &mut StoreState, next: StoreState) -> OneThingResult<()> {
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    async fn persist(&self, state: &StoreState) -> OneThingResult<()> {
        let Some(path) = self.data_file.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes).await.map_err(|e| {
            OneThingError::Storage(format!(
                "Failed to write task store snapshot {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
            OneThingError::Storage(format!(
                "Failed to replace task store {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_task_requires_a_title() {
        let store = TaskStore::in_memory();
        let err = store.create_task("   ", None).await.unwrap_err();
        assert!(matches!(err, OneThingError::Validation(_)));

        let task = store
            .create_task("  Write report ", Some("  "))
            .await
            .unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, None);
        assert_eq!(task.tier, TaskTier::Backlog);
    }

    #[tokio::test]
    async fn tasks_list_open_first_then_newest() {
        let store = TaskStore::in_memory();
        let first = store.create_task("first", None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_task("second", None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let third = store.create_task("third", None).await.unwrap();
        store.toggle_task_complete(&third.id).await.unwrap();

        let ids: Vec<String> = store.get_tasks().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id, third.id]);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = TaskStore::in_memory();
        assert!(matches!(
            store.toggle_task_complete("nope").await,
            Err(OneThingError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_task("nope").await,
            Err(OneThingError::NotFound(_))
        ));
        assert!(matches!(
            store.update_task_tier("nope", TaskTier::IfTime).await,
            Err(OneThingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn complete_briefing_swaps_the_one_thing_and_upserts_review() {
        let store = TaskStore::in_memory();
        let old = store.create_task("Old focus", None).await.unwrap();
        let new = store.create_task("Write report", None).await.unwrap();
        store
            .update_task_tier(&old.id, TaskTier::OneThing)
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let review = store
            .complete_briefing_on(date, &new.id, "ship the Q3 summary")
            .await
            .unwrap();
        assert_eq!(review.one_thing_id, new.id);

        assert_eq!(store.get_task(&old.id).await.unwrap().tier, TaskTier::Supporting);
        assert_eq!(store.get_task(&new.id).await.unwrap().tier, TaskTier::OneThing);

        let again = store
            .complete_briefing_on(date, &old.id, "changed my mind")
            .await
            .unwrap();
        assert_eq!(again.created_at, review.created_at);
        let stored = store.get_briefing_on(date).await.unwrap();
        assert_eq!(stored.one_thing_id, old.id);
        assert_eq!(stored.one_thing_goal, "changed my mind");
        assert_eq!(store.get_task(&new.id).await.unwrap().tier, TaskTier::Supporting);
    }

    #[tokio::test]
    async fn complete_briefing_with_unknown_task_changes_nothing() {
        let store = TaskStore::in_memory();
        let current = store.create_task("Current", None).await.unwrap();
        store
            .update_task_tier(&current.id, TaskTier::OneThing)
            .await
            .unwrap();

        assert!(store.complete_briefing("missing", "goal").await.is_err());
        assert_eq!(
            store.get_task(&current.id).await.unwrap().tier,
            TaskTier::OneThing
        );
        assert!(store.get_todays_briefing().await.is_none());
    }

    #[tokio::test]
    async fn failed_snapshot_leaves_the_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("sub");
        let store = TaskStore::open(data_dir.join("tasks.json")).await.unwrap();
        let old = store.create_task("Old focus", None).await.unwrap();
        let new = store.create_task("Write report", None).await.unwrap();
        store
            .update_task_tier(&old.id, TaskTier::OneThing)
            .await
            .unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, b"not a directory").unwrap();

        assert!(store.complete_briefing(&new.id, "ship it").await.is_err());
        assert_eq!(store.get_task(&old.id).await.unwrap().tier, TaskTier::OneThing);
        assert_eq!(store.get_task(&new.id).await.unwrap().tier, TaskTier::Backlog);
        assert!(store.get_todays_briefing().await.is_none());

        assert!(store.create_task("Ghost", None).await.is_err());
        assert!(store.toggle_task_complete(&new.id).await.is_err());
        assert!(store.delete_task(&old.id).await.is_err());
        let tasks = store.get_tasks().await;
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|task| !task.completed));
    }

    #[tokio::test]
    async fn snapshots_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");

        let store = TaskStore::open(&path).await.unwrap();
        let task = store.create_task("Persist me", None).await.unwrap();
        store.complete_briefing(&task.id, "keep it").await.unwrap();
        drop(store);

        let reopened = TaskStore::open(&path).await.unwrap();
        let tasks = reopened.get_tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].tier, TaskTier::OneThing);
        assert_eq!(
            reopened.get_todays_briefing().await.unwrap().one_thing_goal,
            "keep it"
        );
    }
}
