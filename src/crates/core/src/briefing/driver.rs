//! Morning briefing conversation driver
//!
//! Owns one briefing session: sends turns through a [`BriefingTransport`],
//! folds the streamed reply into the transcript fragment by fragment, and
//! commits the selection once the model emits the completion marker.
//!
//! Every turn captures the session generation when it starts. `start()` and
//! `reset()` bump the generation, so a stream that outlives its session can
//! never write into the new one.

use super::commit::BriefingCommitter;
use super::decoder::Utf8StreamDecoder;
use super::marker::parse_selection;
use super::transport::BriefingTransport;
use super::types::{BriefingRequest, Message};
use crate::tasks::Task;
use crate::util::errors::OneThingResult;
use futures::StreamExt;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

pub const OPENING_MESSAGE: &str = "Start my morning briefing.";
pub const APOLOGY_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Snapshot of a briefing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BriefingState {
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_complete: bool,
    pub selected_task: Option<Task>,
}

/// Notifications for the display layer, emitted only for the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum BriefingEvent {
    Loading { is_loading: bool },
    /// The streaming assistant message now reads `content` (raw, unstripped).
    AssistantUpdated { content: String },
    Completed { task: Task, goal: String },
    /// A marker was parsed but its title matched no known task.
    SelectionUnresolved { task_title: String },
    Failed { message: String },
    CommitFailed { task_id: String, message: String },
}

#[derive(Default)]
struct Session {
    state: BriefingState,
    generation: u64,
}

struct DriverInner {
    transport: Arc<dyn BriefingTransport>,
    committer: Arc<dyn BriefingCommitter>,
    tasks: Mutex<Vec<Task>>,
    session: Mutex<Session>,
    events: Mutex<Option<mpsc::UnboundedSender<BriefingEvent>>>,
}

impl DriverInner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` if `generation` is still current. Returns whether it ran.
    fn update<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut BriefingState),
    {
        let mut session = self.session();
        if session.generation != generation {
            return false;
        }
        f(&mut session.state);
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session().generation == generation
    }

    fn emit(&self, event: BriefingEvent) {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = events.as_ref() {
            let _ = tx.send(event);
        }
    }
}

#[derive(Clone)]
pub struct BriefingDriver {
    inner: Arc<DriverInner>,
}

impl BriefingDriver {
    pub fn new(
        transport: Arc<dyn BriefingTransport>,
        committer: Arc<dyn BriefingCommitter>,
        tasks: Vec<Task>,
    ) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                transport,
                committer,
                tasks: Mutex::new(tasks),
                session: Mutex::new(Session::default()),
                events: Mutex::new(None),
            }),
        }
    }

    /// Route display events to a new receiver, replacing any previous one.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<BriefingEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    pub fn state(&self) -> BriefingState {
        self.inner.session().state.clone()
    }

    /// Clear the session and open a new briefing with the synthetic opener.
    pub async fn start(&self) {
        let (generation, request) = {
            let mut session = self.inner.session();
            session.generation += 1;
            session.state = BriefingState {
                is_loading: true,
                ..Default::default()
            };
            let request = BriefingRequest {
                messages: vec![Message::user(OPENING_MESSAGE)],
                tasks: self.task_refs(),
            };
            (session.generation, request)
        };
        debug!("Briefing started: generation={}", generation);
        self.inner.emit(BriefingEvent::Loading { is_loading: true });

        if let Err(e) = self.run_turn(generation, &request).await {
            error!("Briefing error: {}", e);
            let replaced = self.inner.update(generation, |state| {
                state.messages = vec![Message::assistant(APOLOGY_MESSAGE)];
            });
            if replaced {
                self.inner.emit(BriefingEvent::Failed {
                    message: e.to_string(),
                });
            }
        }

        self.finish_loading(generation);
    }

    /// Send a user reply. Ignored while a turn is in flight or after completion.
    pub async fn send(&self, text: impl Into<String>) {
        let text = text.into();
        let (generation, request) = {
            let mut session = self.inner.session();
            if session.state.is_loading || session.state.is_complete {
                debug!(
                    "Briefing send ignored: is_loading={}, is_complete={}",
                    session.state.is_loading, session.state.is_complete
                );
                return;
            }
            session.state.messages.push(Message::user(text));
            session.state.is_loading = true;
            let request = BriefingRequest {
                messages: session.state.messages.clone(),
                tasks: self.task_refs(),
            };
            (session.generation, request)
        };
        self.inner.emit(BriefingEvent::Loading { is_loading: true });

        if let Err(e) = self.run_turn(generation, &request).await {
            error!("Briefing error: {}", e);
            if self.inner.is_current(generation) {
                self.inner.emit(BriefingEvent::Failed {
                    message: e.to_string(),
                });
            }
        }

        self.finish_loading(generation);
    }

    /// Drop the session. Any stream still in flight becomes inert.
    pub fn reset(&self) {
        let mut session = self.inner.session();
        session.generation += 1;
        session.state = BriefingState::default();
    }

    fn finish_loading(&self, generation: u64) {
        if self.inner.update(generation, |state| state.is_loading = false) {
            self.inner.emit(BriefingEvent::Loading { is_loading: false });
        }
    }

    fn task_refs(&self) -> Vec<crate::tasks::TaskRef> {
        self.inner.tasks().iter().map(Task::to_ref).collect()
    }

    async fn run_turn(&self, generation: u64, request: &BriefingRequest) -> OneThingResult<()> {
        let mut stream = self.inner.transport.open_stream(request).await?;
        let mut decoder = Utf8StreamDecoder::new();
        let mut assistant = String::new();
        let mut started = false;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let text = decoder.decode(&chunk);
            if text.is_empty() {
                continue;
            }
            assistant.push_str(&text);
            if !self.publish_partial(generation, &assistant, &mut started) {
                debug!("Briefing stream outlived its session: generation={}", generation);
                return Ok(());
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            assistant.push_str(&tail);
            if !self.publish_partial(generation, &assistant, &mut started) {
                return Ok(());
            }
        }

        self.finish_turn(generation, &assistant).await;
        Ok(())
    }

    /// Show `assistant` as the last transcript message. The first fragment of
    /// a turn appends the message; later fragments replace it.
    fn publish_partial(&self, generation: u64, assistant: &str, started: &mut bool) -> bool {
        let replace_last = *started;
        let applied = self.inner.update(generation, |state| {
            if replace_last {
                if let Some(last) = state.messages.last_mut() {
                    last.content = assistant.to_string();
                    return;
                }
            }
            state.messages.push(Message::assistant(assistant));
        });
        if applied {
            *started = true;
            self.inner.emit(BriefingEvent::AssistantUpdated {
                content: assistant.to_string(),
            });
        }
        applied
    }

    async fn finish_turn(&self, generation: u64, assistant: &str) {
        let Some(result) = parse_selection(assistant) else {
            return;
        };

        let wanted = result.task_title.to_lowercase();
        let task = {
            let tasks = self.inner.tasks();
            tasks
                .iter()
                .find(|task| task.title.to_lowercase() == wanted)
                .cloned()
        };

        let Some(task) = task else {
            warn!(
                "Briefing selection did not match any task: task_title={}",
                result.task_title
            );
            if self.inner.is_current(generation) {
                self.inner.emit(BriefingEvent::SelectionUnresolved {
                    task_title: result.task_title,
                });
            }
            return;
        };

        let applied = self.inner.update(generation, |state| {
            state.selected_task = Some(task.clone());
            state.is_complete = true;
        });
        if !applied {
            return;
        }

        info!("Briefing complete: task_id={}, title={}", task.id, task.title);
        self.inner.emit(BriefingEvent::Completed {
            task: task.clone(),
            goal: result.goal.clone(),
        });

        if let Err(e) = self
            .inner
            .committer
            .complete_briefing(&task.id, &result.goal)
            .await
        {
            error!("Failed to commit briefing: task_id={}, error={}", task.id, e);
            self.inner.emit(BriefingEvent::CommitFailed {
                task_id: task.id,
                message: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::briefing::transport::ByteStream;
    use crate::tasks::TaskTier;
    use crate::util::errors::OneThingError;
    use async_trait::async_trait;
    use futures::channel::mpsc as fmpsc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    enum Reply {
        Chunks(Vec<Vec<u8>>),
        Items(Vec<OneThingResult<Vec<u8>>>),
        Live(fmpsc::UnboundedReceiver<OneThingResult<Vec<u8>>>),
        Blocked(Arc<Notify>),
        Fail,
    }

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<BriefingRequest>>,
        calls: AtomicUsize,
        entered: Notify,
    }

    impl ScriptedTransport {
        fn with(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            })
        }

        fn requests(&self) -> Vec<BriefingRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BriefingTransport for ScriptedTransport {
        async fn open_stream(&self, request: &BriefingRequest) -> OneThingResult<ByteStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            let reply = self.replies.lock().unwrap().pop_front();
            self.entered.notify_one();
            match reply {
                Some(Reply::Chunks(chunks)) => {
                    Ok(futures::stream::iter(chunks.into_iter().map(Ok)).boxed())
                }
                Some(Reply::Items(items)) => Ok(futures::stream::iter(items).boxed()),
                Some(Reply::Live(rx)) => Ok(rx.boxed()),
                Some(Reply::Blocked(gate)) => {
                    gate.notified().await;
                    Ok(futures::stream::empty().boxed())
                }
                Some(Reply::Fail) | None => {
                    Err(OneThingError::Transport("connection refused".to_string()))
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingCommitter {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl BriefingCommitter for RecordingCommitter {
        async fn complete_briefing(&self, task_id: &str, goal: &str) -> OneThingResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((task_id.to_string(), goal.to_string()));
            if self.fail {
                return Err(OneThingError::Storage("disk full".to_string()));
            }
            Ok(())
        }
    }

    fn tasks() -> Vec<Task> {
        vec![
            Task::new("Write report", None),
            Task::new("Call Sam", None).with_tier(TaskTier::Supporting),
            Task::new("Current focus", None).with_tier(TaskTier::OneThing),
        ]
    }

    fn chunks(parts: &[&str]) -> Reply {
        Reply::Chunks(parts.iter().map(|p| p.as_bytes().to_vec()).collect())
    }

    const SELECTION_REPLY: [&str; 3] = [
        "Pick ",
        "item ",
        "A.[ONE_THING_SELECTED]\ntask: Write report\ngoal: ship the Q3 summary\n[/ONE_THING_SELECTED]",
    ];

    #[tokio::test]
    async fn start_sends_opener_with_all_tasks_and_streams_reply() {
        let transport = ScriptedTransport::with(vec![chunks(&["Good ", "morning!"])]);
        let committer = Arc::new(RecordingCommitter::default());
        let driver = BriefingDriver::new(transport.clone(), committer.clone(), tasks());
        let mut events = driver.subscribe();

        driver.start().await;

        let state = driver.state();
        assert_eq!(state.messages, vec![Message::assistant("Good morning!")]);
        assert!(!state.is_loading);
        assert!(!state.is_complete);

        let request = &transport.requests()[0];
        assert_eq!(request.messages, vec![Message::user(OPENING_MESSAGE)]);
        assert_eq!(request.tasks.len(), 3);
        assert_eq!(request.tasks[2].tier, "one-thing");

        assert_eq!(
            events.recv().await,
            Some(BriefingEvent::Loading { is_loading: true })
        );
        assert_eq!(
            events.recv().await,
            Some(BriefingEvent::AssistantUpdated {
                content: "Good ".to_string()
            })
        );
        assert_eq!(
            events.recv().await,
            Some(BriefingEvent::AssistantUpdated {
                content: "Good morning!".to_string()
            })
        );
        assert_eq!(
            events.recv().await,
            Some(BriefingEvent::Loading { is_loading: false })
        );
        assert!(committer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn marker_in_streamed_reply_completes_and_commits_once() {
        let transport = ScriptedTransport::with(vec![
            chunks(&["Which matters most?"]),
            chunks(&SELECTION_REPLY),
        ]);
        let committer = Arc::new(RecordingCommitter::default());
        let all_tasks = tasks();
        let report_id = all_tasks[0].id.clone();
        let driver = BriefingDriver::new(transport.clone(), committer.clone(), all_tasks);

        driver.start().await;
        driver.send("the report").await;

        let state = driver.state();
        assert!(state.is_complete);
        assert!(!state.is_loading);
        assert_eq!(
            state.selected_task.as_ref().map(|t| t.id.as_str()),
            Some(report_id.as_str())
        );
        assert_eq!(state.messages.len(), 3);
        assert_eq!(
            crate::briefing::marker::strip_selection(&state.messages[2].content),
            "Pick item A."
        );
        assert_eq!(
            committer.calls.lock().unwrap().clone(),
            vec![(report_id, "ship the Q3 summary".to_string())]
        );

        let second = &transport.requests()[1];
        assert_eq!(
            second.messages,
            vec![
                Message::assistant("Which matters most?"),
                Message::user("the report"),
            ]
        );

        driver.send("anything else").await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(driver.state().messages.len(), 3);
    }

    #[tokio::test]
    async fn title_match_ignores_case_only() {
        let transport = ScriptedTransport::with(vec![
            chunks(&["[ONE_THING_SELECTED]\ntask: WRITE REPORT\ngoal: g\n[/ONE_THING_SELECTED]"]),
            chunks(&["[ONE_THING_SELECTED]\ntask: Write report.\ngoal: g\n[/ONE_THING_SELECTED]"]),
        ]);
        let committer = Arc::new(RecordingCommitter::default());
        let driver = BriefingDriver::new(transport, committer.clone(), tasks());

        driver.start().await;
        assert!(driver.state().is_complete);

        driver.start().await;
        assert!(!driver.state().is_complete);
        assert_eq!(committer.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unresolvable_selection_stays_open_without_commit() {
        let transport = ScriptedTransport::with(vec![chunks(&[
            "Done.[ONE_THING_SELECTED]\ntask: Finish the report\ngoal: g\n[/ONE_THING_SELECTED]",
        ])]);
        let committer = Arc::new(RecordingCommitter::default());
        let driver = BriefingDriver::new(transport, committer.clone(), tasks());
        let mut events = driver.subscribe();

        driver.start().await;

        let state = driver.state();
        assert!(!state.is_complete);
        assert!(state.selected_task.is_none());
        assert!(committer.calls.lock().unwrap().is_empty());

        let mut saw_unresolved = false;
        while let Ok(event) = events.try_recv() {
            if let BriefingEvent::SelectionUnresolved { task_title } = event {
                assert_eq!(task_title, "Finish the report");
                saw_unresolved = true;
            }
        }
        assert!(saw_unresolved);
    }

    #[tokio::test]
    async fn start_failure_replaces_transcript_with_apology() {
        let transport = ScriptedTransport::with(vec![Reply::Fail]);
        let driver = BriefingDriver::new(
            transport,
            Arc::new(RecordingCommitter::default()),
            tasks(),
        );

        driver.start().await;

        let state = driver.state();
        assert_eq!(state.messages, vec![Message::assistant(APOLOGY_MESSAGE)]);
        assert!(!state.is_loading);
        assert!(!state.is_complete);
    }

    #[tokio::test]
    async fn send_failure_keeps_the_user_message() {
        let transport = ScriptedTransport::with(vec![chunks(&["Hello"]), Reply::Fail]);
        let driver = BriefingDriver::new(
            transport,
            Arc::new(RecordingCommitter::default()),
            tasks(),
        );

        driver.start().await;
        driver.send("the report").await;

        let state = driver.state();
        assert_eq!(
            state.messages,
            vec![Message::assistant("Hello"), Message::user("the report")]
        );
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn send_failure_mid_stream_keeps_partial_reply() {
        let transport = ScriptedTransport::with(vec![
            chunks(&["Hello"]),
            Reply::Items(vec![
                Ok(b"Which one ".to_vec()),
                Err(OneThingError::Transport("connection reset".to_string())),
            ]),
        ]);
        let driver = BriefingDriver::new(
            transport,
            Arc::new(RecordingCommitter::default()),
            tasks(),
        );
        let mut events = driver.subscribe();

        driver.start().await;
        driver.send("the report").await;

        let state = driver.state();
        assert_eq!(
            state.messages,
            vec![
                Message::assistant("Hello"),
                Message::user("the report"),
                Message::assistant("Which one "),
            ]
        );
        assert!(!state.is_loading);
        assert!(!state.is_complete);

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, BriefingEvent::Failed { .. }) {
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn send_while_loading_is_a_no_op() {
        let gate = Arc::new(Notify::new());
        let transport = ScriptedTransport::with(vec![Reply::Blocked(gate.clone())]);
        let driver = BriefingDriver::new(
            transport.clone(),
            Arc::new(RecordingCommitter::default()),
            tasks(),
        );

        let running = tokio::spawn({
            let driver = driver.clone();
            async move { driver.start().await }
        });
        transport.entered.notified().await;
        assert!(driver.state().is_loading);

        driver.send("impatient").await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(driver.state().messages.is_empty());

        gate.notify_one();
        running.await.unwrap();
        assert!(!driver.state().is_loading);
    }

    #[tokio::test]
    async fn reset_mid_stream_is_not_resurrected() {
        let (tx, rx) = fmpsc::unbounded();
        let transport = ScriptedTransport::with(vec![Reply::Live(rx)]);
        let committer = Arc::new(RecordingCommitter::default());
        let driver = BriefingDriver::new(transport.clone(), committer.clone(), tasks());

        let running = tokio::spawn({
            let driver = driver.clone();
            async move { driver.start().await }
        });
        transport.entered.notified().await;

        tx.unbounded_send(Ok(b"Pick ".to_vec())).unwrap();
        while driver.state().messages.is_empty() {
            tokio::task::yield_now().await;
        }

        driver.reset();
        tx.unbounded_send(Ok(SELECTION_REPLY[2].as_bytes().to_vec()))
            .unwrap();
        drop(tx);
        running.await.unwrap();

        assert_eq!(driver.state(), BriefingState::default());
        assert!(committer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let transport = ScriptedTransport::with(vec![chunks(&["Hi"])]);
        let driver = BriefingDriver::new(
            transport,
            Arc::new(RecordingCommitter::default()),
            tasks(),
        );
        driver.start().await;

        driver.reset();
        let once = driver.state();
        driver.reset();
        assert_eq!(driver.state(), once);
        assert_eq!(once, BriefingState::default());
    }

    #[tokio::test]
    async fn split_multi_byte_character_renders_whole() {
        let bytes = "Let’s go".as_bytes();
        let split = 5; // inside the 3-byte apostrophe
        let transport = ScriptedTransport::with(vec![Reply::Chunks(vec![
            bytes[..split].to_vec(),
            bytes[split..].to_vec(),
        ])]);
        let driver = BriefingDriver::new(
            transport,
            Arc::new(RecordingCommitter::default()),
            tasks(),
        );

        driver.start().await;
        assert_eq!(driver.state().messages, vec![Message::assistant("Let’s go")]);
    }

    #[tokio::test]
    async fn commit_failure_is_reported_but_selection_stands() {
        let transport = ScriptedTransport::with(vec![chunks(&SELECTION_REPLY)]);
        let committer = Arc::new(RecordingCommitter {
            fail: true,
            ..Default::default()
        });
        let driver = BriefingDriver::new(transport, committer, tasks());
        let mut events = driver.subscribe();

        driver.start().await;
        assert!(driver.state().is_complete);

        let mut saw_commit_failure = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, BriefingEvent::CommitFailed { .. }) {
                saw_commit_failure = true;
            }
        }
        assert!(saw_commit_failure);
    }
}
