//! [`MockChannel`] – a recording in-process channel for tests.
//!
//! Responses are queued per route (`/<service>/<method>`). A unary call with
//! nothing queued answers `{}`, which is what the remote side sends for an
//! empty message. A stream with nothing queued ends immediately.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use parking_lot::Mutex;
use serde_json::{Value, json};
use viam_types::ViamError;

use crate::channel::{Channel, MethodPath, ResponseStream};

/// One request observed by the mock, in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub request: Value,
    pub streaming: bool,
}

struct ScriptedStream {
    chunks: Vec<Result<Value, ViamError>>,
    hang: bool,
}

/// Channel double that records every request and replays scripted answers.
#[derive(Default)]
pub struct MockChannel {
    calls: Mutex<Vec<RecordedCall>>,
    unary: Mutex<HashMap<String, VecDeque<Result<Value, ViamError>>>>,
    streams: Mutex<HashMap<String, VecDeque<ScriptedStream>>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response for the next unary call on `path`.
    pub fn respond(&self, path: &str, response: Value) {
        self.unary
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queue a failure for the next unary call on `path`.
    pub fn fail(&self, path: &str, error: ViamError) {
        self.unary
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Queue the chunks of the next stream opened on `path`. The stream ends
    /// after the last chunk.
    pub fn stream(&self, path: &str, chunks: Vec<Result<Value, ViamError>>) {
        self.push_stream(path, chunks, false);
    }

    /// Like [`stream`][Self::stream] but the stream stays open after the
    /// last chunk, as a live tail would.
    pub fn stream_then_hang(&self, path: &str, chunks: Vec<Result<Value, ViamError>>) {
        self.push_stream(path, chunks, true);
    }

    /// Every call seen so far, in dispatch order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// The request of the most recent call.
    pub fn last_request(&self) -> Option<Value> {
        self.calls.lock().last().map(|c| c.request.clone())
    }

    fn push_stream(&self, path: &str, chunks: Vec<Result<Value, ViamError>>, hang: bool) {
        self.streams
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(ScriptedStream { chunks, hang });
    }

    fn record(&self, path: String, request: Value, streaming: bool) {
        self.calls.lock().push(RecordedCall {
            path,
            request,
            streaming,
        });
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn unary(&self, method: &MethodPath, request: Value) -> Result<Value, ViamError> {
        let path = method.path();
        self.record(path.clone(), request, false);
        self.unary
            .lock()
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(json!({})))
    }

    async fn server_stream(
        &self,
        method: &MethodPath,
        request: Value,
    ) -> Result<ResponseStream, ViamError> {
        let path = method.path();
        self.record(path.clone(), request, true);
        let scripted = self.streams.lock().get_mut(&path).and_then(VecDeque::pop_front);
        let stream: ResponseStream = match scripted {
            Some(ScriptedStream { chunks, hang: true }) => {
                Box::pin(stream::iter(chunks).chain(stream::pending()))
            }
            Some(ScriptedStream { chunks, hang: false }) => Box::pin(stream::iter(chunks)),
            None => Box::pin(stream::empty()),
        };
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: MethodPath = MethodPath::new("viam.component.sensor.v1.SensorService", "GetReadings");

    #[tokio::test]
    async fn unscripted_unary_answers_empty_message() {
        let mock = MockChannel::new();
        let resp = mock.unary(&PATH, json!({ "name": "s" })).await.unwrap();
        assert_eq!(resp, json!({}));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn scripted_responses_are_consumed_in_order() {
        let mock = MockChannel::new();
        let path = PATH.path();
        mock.respond(&path, json!({ "n": 1 }));
        mock.fail(&path, ViamError::Transport("down".into()));

        assert_eq!(mock.unary(&PATH, json!({})).await.unwrap(), json!({ "n": 1 }));
        assert!(mock.unary(&PATH, json!({})).await.is_err());
        assert_eq!(mock.unary(&PATH, json!({})).await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn streams_replay_chunks_and_record_calls() {
        let mock = MockChannel::new();
        mock.stream(&PATH.path(), vec![Ok(json!(1)), Ok(json!(2))]);

        let items: Vec<_> = mock
            .server_stream(&PATH, json!({ "name": "s" }))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items, vec![Ok(json!(1)), Ok(json!(2))]);

        let calls = mock.calls();
        assert!(calls[0].streaming);
        assert_eq!(calls[0].request, json!({ "name": "s" }));
    }
}
