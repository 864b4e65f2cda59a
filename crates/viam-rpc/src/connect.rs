//! [`ConnectChannel`] – Connect-protocol JSON transport over HTTP.
//!
//! * **Unary** – `POST {base}/{service}/{method}` with an
//!   `application/json` body. A 2xx answer carries the response message;
//!   anything else carries a `{code, message}` error document.
//!
//! * **Server streaming** – `application/connect+json`. Request and response
//!   messages are wrapped in envelopes: one flag byte, a big-endian `u32`
//!   length, then the JSON payload. The last envelope has
//!   [`END_STREAM_FLAG`] set and carries `{error?, metadata?}`. A body
//!   that closes before that envelope is a transport error, and so is an
//!   envelope longer than the channel's message limit.
//!
//! The channel holds a `reqwest::Client` and a base URL; it does not
//! authenticate or reconnect.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use viam_types::ViamError;

use crate::channel::{Channel, MethodPath, ResponseStream};

/// Value of the `Connect-Protocol-Version` header.
pub const CONNECT_PROTOCOL_VERSION: &str = "1";

/// Envelope flag: payload is compressed (never negotiated by this client).
pub const COMPRESSED_FLAG: u8 = 0x01;

/// Envelope flag: this is the end-of-stream message.
pub const END_STREAM_FLAG: u8 = 0x02;

/// Largest envelope payload accepted by default (4 MiB).
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4 * 1024 * 1024;

const ENVELOPE_HEADER_LEN: usize = 5;

/// Raw response body, chunk by chunk.
pub type BodyChunks = BoxStream<'static, Result<Vec<u8>, ViamError>>;

/// HTTP transport speaking the Connect protocol with the JSON codec.
#[derive(Debug, Clone)]
pub struct ConnectChannel {
    base_url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
    max_message_len: usize,
}

impl ConnectChannel {
    /// Create a channel targeting `base_url` (e.g. `"http://localhost:8080"`).
    /// No connection is made until the first call.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: None,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }

    /// Apply a deadline to every call (builder-style).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reject streamed envelopes larger than `max` bytes (builder-style).
    pub fn with_max_message_len(mut self, max: usize) -> Self {
        self.max_message_len = max;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, method: &MethodPath) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), method.path())
    }

    fn post(&self, method: &MethodPath, content_type: &'static str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(self.url(method))
            .header(CONTENT_TYPE, content_type)
            .header("Connect-Protocol-Version", CONNECT_PROTOCOL_VERSION);
        if let Some(timeout) = self.timeout {
            builder = builder
                .timeout(timeout)
                .header("Connect-Timeout-Ms", timeout.as_millis().to_string());
        }
        builder
    }
}

#[async_trait]
impl Channel for ConnectChannel {
    async fn unary(&self, method: &MethodPath, request: Value) -> Result<Value, ViamError> {
        let response = self
            .post(method, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(remote_error(status, &body));
        }
        if body.is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn server_stream(
        &self,
        method: &MethodPath,
        request: Value,
    ) -> Result<ResponseStream, ViamError> {
        let payload = serde_json::to_vec(&request)?;
        let response = self
            .post(method, "application/connect+json")
            .body(encode_envelope(0, &payload))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(transport_error)?;
            return Err(remote_error(status, &body));
        }

        debug!(target: "viam_rpc", method = %method, "connect stream opened");
        Ok(decode_stream(
            body_chunks(response),
            EnvelopeDecoder::with_max_message_len(self.max_message_len),
        ))
    }
}

fn body_chunks(response: reqwest::Response) -> BodyChunks {
    Box::pin(stream::unfold(Some(response), |response| async move {
        let mut response = response?;
        match response.chunk().await {
            Ok(Some(bytes)) => Some((Ok(bytes.to_vec()), Some(response))),
            Ok(None) => None,
            Err(e) => Some((Err(transport_error(e)), None)),
        }
    }))
}

/// Turn a server-streaming response body into a stream of messages.
///
/// The stream ends cleanly only at an end-of-stream envelope without an
/// error. Every failure is yielded once and then the stream ends.
pub fn decode_stream(chunks: BodyChunks, decoder: EnvelopeDecoder) -> ResponseStream {
    let state = StreamState {
        chunks,
        decoder,
        finished: false,
    };
    Box::pin(stream::unfold(state, next_message))
}

struct StreamState {
    chunks: BodyChunks,
    decoder: EnvelopeDecoder,
    finished: bool,
}

impl StreamState {
    fn fail(mut self, error: ViamError) -> Option<(Result<Value, ViamError>, StreamState)> {
        self.finished = true;
        Some((Err(error), self))
    }
}

async fn next_message(
    mut state: StreamState,
) -> Option<(Result<Value, ViamError>, StreamState)> {
    if state.finished {
        return None;
    }
    loop {
        match state.decoder.next_envelope() {
            Ok(Some(envelope)) => {
                return match envelope.into_message() {
                    Ok(Some(message)) => Some((Ok(message), state)),
                    // End-of-stream: anything after it is ignored.
                    Ok(None) => None,
                    Err(e) => state.fail(e),
                };
            }
            Ok(None) => {}
            Err(e) => return state.fail(e),
        }
        match state.chunks.next().await {
            Some(Ok(bytes)) => state.decoder.push(&bytes),
            Some(Err(e)) => return state.fail(e),
            None => {
                let reason = if state.decoder.is_empty() {
                    "stream ended without end-of-stream message"
                } else {
                    "stream ended in the middle of a message"
                };
                return state.fail(ViamError::Transport(reason.to_string()));
            }
        }
    }
}

/// Wrap `payload` in a Connect envelope.
pub fn encode_envelope(flags: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + payload.len());
    out.push(flags);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// One decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub flags: u8,
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Interpret the envelope as a stream item.
    ///
    /// * data envelope → `Ok(Some(message))`
    /// * end-of-stream without error → `Ok(None)`
    /// * end-of-stream with error → `Err(Remote)`
    pub fn into_message(self) -> Result<Option<Value>, ViamError> {
        if self.flags & COMPRESSED_FLAG != 0 {
            return Err(ViamError::Transport(
                "received a compressed envelope but no compression was negotiated".to_string(),
            ));
        }
        if self.flags & END_STREAM_FLAG == 0 {
            return Ok(Some(serde_json::from_slice(&self.payload)?));
        }
        let end: EndStream = if self.payload.is_empty() {
            EndStream::default()
        } else {
            serde_json::from_slice(&self.payload)?
        };
        match end.error {
            Some(error) => Err(error.into()),
            None => Ok(None),
        }
    }
}

/// Incremental envelope decoder. Push bytes as they arrive, pull complete
/// envelopes as they become available.
#[derive(Debug)]
pub struct EnvelopeDecoder {
    buffer: Vec<u8>,
    max_message_len: usize,
}

impl Default for EnvelopeDecoder {
    fn default() -> Self {
        Self::with_max_message_len(DEFAULT_MAX_MESSAGE_LEN)
    }
}

impl EnvelopeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_message_len(max_message_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_message_len,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pop the next complete envelope, if the buffer holds one.
    ///
    /// Fails as soon as a header declares a payload above the limit, before
    /// the payload is buffered.
    pub fn next_envelope(&mut self) -> Result<Option<Envelope>, ViamError> {
        if self.buffer.len() < ENVELOPE_HEADER_LEN {
            return Ok(None);
        }
        let len = u32::from_be_bytes([
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
            self.buffer[4],
        ]) as usize;
        if len > self.max_message_len {
            return Err(ViamError::Transport(format!(
                "message of {len} bytes exceeds the {} byte limit",
                self.max_message_len
            )));
        }
        if self.buffer.len() < ENVELOPE_HEADER_LEN + len {
            return Ok(None);
        }
        let flags = self.buffer[0];
        let payload = self.buffer[ENVELOPE_HEADER_LEN..ENVELOPE_HEADER_LEN + len].to_vec();
        self.buffer.drain(..ENVELOPE_HEADER_LEN + len);
        Ok(Some(Envelope { flags, payload }))
    }

    /// True when no partial envelope is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndStream {
    error: Option<ConnectError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectError {
    code: String,
    message: String,
}

impl From<ConnectError> for ViamError {
    fn from(e: ConnectError) -> Self {
        ViamError::Remote {
            code: if e.code.is_empty() { "unknown".to_string() } else { e.code },
            message: e.message,
        }
    }
}

fn transport_error(e: reqwest::Error) -> ViamError {
    ViamError::Transport(e.to_string())
}

/// Build the error for a non-2xx unary answer.
fn remote_error(status: StatusCode, body: &[u8]) -> ViamError {
    match serde_json::from_slice::<ConnectError>(body) {
        Ok(error) if !error.code.is_empty() => error.into(),
        _ => ViamError::Remote {
            code: code_for_status(status).to_string(),
            message: format!("HTTP {status}: {}", String::from_utf8_lossy(body)),
        },
    }
}

/// Connect's mapping from HTTP status to error code, for bodies that carry
/// no code of their own.
fn code_for_status(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "internal",
        401 => "unauthenticated",
        403 => "permission_denied",
        404 => "unimplemented",
        429 | 502 | 503 | 504 => "unavailable",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_roundtrip_through_decoder() {
        let payload = br#"{"logs":[]}"#;
        let mut decoder = EnvelopeDecoder::new();
        decoder.push(&encode_envelope(0, payload));

        let envelope = decoder.next_envelope().unwrap().expect("complete envelope");
        assert_eq!(envelope.flags, 0);
        assert_eq!(envelope.payload, payload);
        assert!(decoder.is_empty());
    }

    #[test]
    fn decoder_waits_for_split_frames() {
        let frame = encode_envelope(0, br#"{"chunk":"AQID"}"#);
        let mut decoder = EnvelopeDecoder::new();

        decoder.push(&frame[..3]);
        assert_eq!(decoder.next_envelope(), Ok(None));
        decoder.push(&frame[3..9]);
        assert_eq!(decoder.next_envelope(), Ok(None));
        decoder.push(&frame[9..]);

        let message = decoder.next_envelope().unwrap().unwrap().into_message().unwrap();
        assert_eq!(message, Some(json!({ "chunk": "AQID" })));
    }

    #[test]
    fn decoder_yields_back_to_back_frames_in_order() {
        let mut bytes = encode_envelope(0, b"1");
        bytes.extend(encode_envelope(0, b"2"));
        bytes.extend(encode_envelope(END_STREAM_FLAG, b"{}"));

        let mut decoder = EnvelopeDecoder::new();
        decoder.push(&bytes);
        let mut next = || decoder.next_envelope().unwrap().unwrap().into_message().unwrap();
        let first = next();
        let second = next();
        let end = next();
        assert_eq!(first, Some(json!(1)));
        assert_eq!(second, Some(json!(2)));
        assert_eq!(end, None);
    }

    #[test]
    fn oversized_envelope_is_rejected_from_its_header() {
        let mut decoder = EnvelopeDecoder::with_max_message_len(8);
        decoder.push(&encode_envelope(0, b"12345678"));
        assert!(decoder.next_envelope().unwrap().is_some());

        // Only the header has arrived; the declared length alone fails.
        decoder.push(&encode_envelope(0, br#"{"chunk":"AQIDBAU="}"#)[..ENVELOPE_HEADER_LEN]);
        assert!(matches!(decoder.next_envelope(), Err(ViamError::Transport(_))));
    }

    fn body(frames: Vec<Vec<u8>>) -> BodyChunks {
        Box::pin(stream::iter(frames.into_iter().map(Ok)))
    }

    async fn drain(stream: ResponseStream) -> Vec<Result<Value, ViamError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn stream_ends_cleanly_at_end_of_stream() {
        let mut frames = vec![
            encode_envelope(0, br#"{"chunk":"AQID"}"#),
            encode_envelope(0, br#"{"chunk":"BAU="}"#),
        ];
        // End envelope split across two reads.
        let end = encode_envelope(END_STREAM_FLAG, b"{}");
        frames.push(end[..2].to_vec());
        frames.push(end[2..].to_vec());

        let items = drain(decode_stream(body(frames), EnvelopeDecoder::new())).await;
        assert_eq!(
            items,
            vec![Ok(json!({ "chunk": "AQID" })), Ok(json!({ "chunk": "BAU=" }))]
        );
    }

    #[tokio::test]
    async fn body_closing_without_end_of_stream_is_an_error() {
        let frames = vec![
            encode_envelope(0, br#"{"chunk":"AQID"}"#),
            encode_envelope(0, br#"{"chunk":"BAU="}"#),
        ];

        let items = drain(decode_stream(body(frames), EnvelopeDecoder::new())).await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], Ok(json!({ "chunk": "BAU=" })));
        assert_eq!(
            items[2],
            Err(ViamError::Transport(
                "stream ended without end-of-stream message".into()
            ))
        );
    }

    #[tokio::test]
    async fn truncated_envelope_is_an_error() {
        let frame = encode_envelope(0, br#"{"chunk":"AQID"}"#);
        let items = drain(decode_stream(body(vec![frame[..7].to_vec()]), EnvelopeDecoder::new())).await;
        assert_eq!(
            items,
            vec![Err(ViamError::Transport(
                "stream ended in the middle of a message".into()
            ))]
        );
    }

    #[tokio::test]
    async fn oversized_envelope_ends_the_stream() {
        let frames = vec![
            encode_envelope(0, b"1"),
            encode_envelope(0, br#"{"chunk":"AQIDBAU="}"#),
            encode_envelope(END_STREAM_FLAG, b"{}"),
        ];

        let items = drain(decode_stream(body(frames), EnvelopeDecoder::with_max_message_len(4))).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(json!(1)));
        assert!(matches!(items[1], Err(ViamError::Transport(_))));
    }

    #[test]
    fn end_stream_error_becomes_remote_error() {
        let envelope = Envelope {
            flags: END_STREAM_FLAG,
            payload: br#"{"error":{"code":"not_found","message":"no such part"}}"#.to_vec(),
        };
        assert_eq!(
            envelope.into_message(),
            Err(ViamError::Remote {
                code: "not_found".into(),
                message: "no such part".into(),
            })
        );
    }

    #[test]
    fn compressed_envelopes_are_rejected() {
        let envelope = Envelope {
            flags: COMPRESSED_FLAG,
            payload: vec![0x1f, 0x8b],
        };
        assert!(matches!(envelope.into_message(), Err(ViamError::Transport(_))));
    }

    #[test]
    fn remote_error_prefers_body_code() {
        let err = remote_error(
            StatusCode::NOT_FOUND,
            br#"{"code":"not_found","message":"resource motor-9 not found"}"#,
        );
        assert_eq!(
            err,
            ViamError::Remote {
                code: "not_found".into(),
                message: "resource motor-9 not found".into(),
            }
        );
    }

    #[test]
    fn remote_error_falls_back_to_status() {
        let err = remote_error(StatusCode::SERVICE_UNAVAILABLE, b"upstream down");
        match err {
            ViamError::Remote { code, message } => {
                assert_eq!(code, "unavailable");
                assert!(message.contains("upstream down"));
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn url_joins_base_and_route() {
        let channel = ConnectChannel::new("http://robot.local:8080/");
        let path = MethodPath::new("viam.robot.v1.RobotService", "ResourceNames");
        assert_eq!(
            channel.url(&path),
            "http://robot.local:8080/viam.robot.v1.RobotService/ResourceNames"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is closed in CI containers.
        let channel =
            ConnectChannel::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500));
        let path = MethodPath::new("viam.robot.v1.RobotService", "ResourceNames");
        let result = channel.unary(&path, json!({})).await;
        assert!(matches!(result, Err(ViamError::Transport(_))));
    }
}
