//! Decision oracle capability and the async request dispatcher
//!
//! The oracle is the only nondeterministic, networked collaborator. The core
//! sees it through `DecisionOracle::decide(prompt) -> TaskKind`; replies come
//! back through `OracleDispatcher`, tagged with the worker and request they
//! answer so the planner can drop any that arrive too late.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::core::error::{Result, SimError};
use crate::core::types::{RequestId, WorkerId};
use crate::entity::tasks::TaskKind;
use crate::llm::client::LlmClient;
use crate::llm::parser::{parse_task_kind, DECISION_SYSTEM_PROMPT};

pub type OracleFuture = Pin<Box<dyn Future<Output = Result<TaskKind>> + Send + 'static>>;

/// Chooses a task kind for a worker from a text prompt
pub trait DecisionOracle: Send + Sync {
    fn decide(&self, prompt: String) -> OracleFuture;
}

/// Always answers Idle
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOracle;

impl DecisionOracle for NoopOracle {
    fn decide(&self, _prompt: String) -> OracleFuture {
        Box::pin(async { Ok(TaskKind::Idle) })
    }
}

/// Replays a fixed list of raw replies, then answers Idle
///
/// Replies go through the same defensive parser as real oracle output.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    delay: Option<Duration>,
}

impl ScriptedOracle {
    pub fn new(kinds: impl IntoIterator<Item = TaskKind>) -> Self {
        Self::from_text(kinds.into_iter().map(|k| k.name().to_string()))
    }

    pub fn from_text(replies: impl IntoIterator<Item = String>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            delay: None,
        }
    }

    /// Queue a failing reply
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(message.into()));
        }
        self
    }

    /// Hold every reply back by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl DecisionOracle for ScriptedOracle {
    fn decide(&self, _prompt: String) -> OracleFuture {
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match next {
                Some(Ok(text)) => Ok(parse_task_kind(&text)),
                Some(Err(message)) => Err(SimError::OracleFailure(message)),
                None => Ok(TaskKind::Idle),
            }
        })
    }
}

/// Oracle backed by an LLM endpoint
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: Arc<LlmClient>,
}

impl LlmOracle {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn from_env() -> Result<Self> {
        LlmClient::from_env().map(Self::new)
    }
}

impl DecisionOracle for LlmOracle {
    fn decide(&self, prompt: String) -> OracleFuture {
        let client = Arc::clone(&self.client);
        Box::pin(async move {
            let reply = client.complete(DECISION_SYSTEM_PROMPT, &prompt).await?;
            let kind = parse_task_kind(&reply);
            tracing::debug!(%kind, reply = %reply.trim(), "oracle reply");
            Ok(kind)
        })
    }
}

/// Answer to one request
#[derive(Debug)]
pub struct OracleReply {
    pub worker_id: WorkerId,
    pub request_id: RequestId,
    pub result: Result<TaskKind>,
}

/// Runs oracle calls on a tokio runtime and collects their replies
///
/// Each request is its own task with a hard timeout; a timeout becomes an
/// `OracleFailure` reply. Requests are numbered from 1 and never reused.
pub struct OracleDispatcher {
    oracle: Arc<dyn DecisionOracle>,
    runtime: Handle,
    timeout: Duration,
    tx: mpsc::UnboundedSender<OracleReply>,
    rx: mpsc::UnboundedReceiver<OracleReply>,
    next_request: RequestId,
    in_flight: usize,
}

impl OracleDispatcher {
    pub fn new(oracle: Arc<dyn DecisionOracle>, runtime: Handle, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            oracle,
            runtime,
            timeout,
            tx,
            rx,
            next_request: 1,
            in_flight: 0,
        }
    }

    /// Use the runtime the caller is running in
    pub fn on_current_runtime(oracle: Arc<dyn DecisionOracle>, timeout: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| SimError::OracleFailure(format!("no tokio runtime: {e}")))?;
        Ok(Self::new(oracle, runtime, timeout))
    }

    /// Start a request; the reply shows up in a later `drain`
    pub fn request(&mut self, worker_id: WorkerId, prompt: String) -> RequestId {
        let request_id = self.next_request;
        self.next_request += 1;
        self.in_flight += 1;

        let oracle = Arc::clone(&self.oracle);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        self.runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, oracle.decide(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(SimError::OracleFailure(format!(
                    "no reply within {}ms",
                    timeout.as_millis()
                ))),
            };
            let _ = tx.send(OracleReply {
                worker_id,
                request_id,
                result,
            });
        });
        request_id
    }

    /// Every reply received so far, without waiting
    pub fn drain(&mut self) -> Vec<OracleReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            replies.push(reply);
        }
        self.in_flight = self.in_flight.saturating_sub(replies.len());
        replies
    }

    /// Requests sent whose replies have not been drained yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl std::fmt::Debug for OracleDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleDispatcher")
            .field("timeout", &self.timeout)
            .field("next_request", &self.next_request)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn wait_for_replies(dispatcher: &mut OracleDispatcher, n: usize) -> Vec<OracleReply> {
        let mut replies = Vec::new();
        for _ in 0..200 {
            replies.extend(dispatcher.drain());
            if replies.len() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        replies
    }

    #[tokio::test]
    async fn test_noop_oracle() {
        assert_eq!(NoopOracle.decide(String::new()).await.unwrap(), TaskKind::Idle);
    }

    #[tokio::test]
    async fn test_scripted_oracle_parses_and_runs_out() {
        let oracle = ScriptedOracle::from_text(vec!["go mining".to_string(), "juggle".to_string()])
            .then_fail("offline");
        assert_eq!(oracle.decide(String::new()).await.unwrap(), TaskKind::Mining);
        assert_eq!(oracle.decide(String::new()).await.unwrap(), TaskKind::Idle);
        assert!(matches!(
            oracle.decide(String::new()).await,
            Err(SimError::OracleFailure(_))
        ));
        assert_eq!(oracle.decide(String::new()).await.unwrap(), TaskKind::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dispatcher_tags_replies() {
        let oracle = Arc::new(ScriptedOracle::new([TaskKind::Eating]));
        let mut dispatcher =
            OracleDispatcher::on_current_runtime(oracle, Duration::from_secs(1)).unwrap();
        let id = dispatcher.request(WorkerId(4), "prompt".into());
        assert_eq!(id, 1);
        assert_eq!(dispatcher.in_flight(), 1);

        let replies = wait_for_replies(&mut dispatcher, 1).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].worker_id, WorkerId(4));
        assert_eq!(replies[0].request_id, 1);
        assert_eq!(replies[0].result.as_ref().ok(), Some(&TaskKind::Eating));
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dispatcher_times_out() {
        let oracle = Arc::new(
            ScriptedOracle::new([TaskKind::Mining]).with_delay(Duration::from_millis(500)),
        );
        let mut dispatcher =
            OracleDispatcher::on_current_runtime(oracle, Duration::from_millis(20)).unwrap();
        dispatcher.request(WorkerId(1), String::new());
        let replies = wait_for_replies(&mut dispatcher, 1).await;
        assert!(matches!(replies[0].result, Err(SimError::OracleFailure(_))));
    }

    #[test]
    fn test_dispatcher_needs_runtime() {
        let result = OracleDispatcher::on_current_runtime(Arc::new(NoopOracle), Duration::from_secs(1));
        assert!(result.is_err());
    }
}
