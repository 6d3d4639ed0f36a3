//! Mock LLM for tests and offline runs.
//!
//! Replies come from a responder closure, a scripted queue, or a fixed string.
//! The mock records call counts, the last request, and the peak number of
//! concurrent calls so fan-out can be asserted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{LlmClient, LlmError, LlmResponse};
use crate::message::Message;

type Responder = Box<dyn Fn(&[Message]) -> Result<String, LlmError> + Send + Sync>;

/// Mock LLM: scripted or computed replies, optional artificial latency.
///
/// Scripted replies are consumed in call order; once exhausted, the fallback
/// reply is returned for every further call.
pub struct MockLlm {
    responder: Option<Responder>,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Result<String, LlmError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
}

impl MockLlm {
    fn build(fallback: Result<String, LlmError>) -> Self {
        Self {
            responder: None,
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with `content`.
    pub fn with_reply(content: impl Into<String>) -> Self {
        Self::build(Ok(content.into()))
    }

    /// Replies with each entry of `replies` in turn, then with `fallback`.
    pub fn scripted<I, S>(replies: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::build(Ok(fallback.into()));
        if let Ok(mut script) = mock.script.lock() {
            script.extend(replies.into_iter().map(|r| Ok(r.into())));
        }
        mock
    }

    /// Every call fails with [`LlmError::Other`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::build(Err(LlmError::Other(message.into())))
    }

    /// Computes each reply from the request messages.
    pub fn with_responder<F>(f: F) -> Self
    where
        F: Fn(&[Message]) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        let mut mock = Self::build(Err(LlmError::Other("unreachable fallback".into())));
        mock.responder = Some(Box::new(f));
        mock
    }

    /// Sleeps for `delay` inside every call before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `invoke` calls started so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Messages of the most recent call.
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Some(responder) = &self.responder {
            return responder(messages);
        }
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Decrements the in-flight counter even when the call future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let reply = self.next_reply(messages);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply.map(LlmResponse::text)
    }
}
