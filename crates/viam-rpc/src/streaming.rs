//! Ordered consumers for server streams.
//!
//! Three shapes cover every streaming call in the SDK:
//!
//! * [`for_each_item`] – project each chunk into items and hand each one to
//!   a callback as soon as it arrives (live log following).
//! * [`collect_into`] – the same, appending to a caller-owned `Vec` (log
//!   tailing, tick events, tabular exports).
//! * [`concat_bytes`] – decode one base64 field per chunk and concatenate the
//!   pieces (point-cloud maps, internal state, invoice PDFs).
//!
//! All preserve delivery order and stop at the first failure. All accept
//! an optional [`CancelToken`]; without one they run until the remote side
//! ends the stream.

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use viam_types::{ViamError, wire};

use crate::channel::ResponseStream;

/// Owner side of a cancellation signal. Cancelling is idempotent.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A token to pass to a streaming call.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask every consumer holding a token to stop.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of a [`CancelHandle`].
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the handle cancels. Never resolves if the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

enum Next {
    Chunk(Result<Value, ViamError>),
    End,
    Cancelled,
}

async fn next_chunk(stream: &mut ResponseStream, cancel: &mut Option<CancelToken>) -> Next {
    let item = match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Next::Cancelled,
                item = stream.next() => item,
            }
        }
        None => stream.next().await,
    };
    match item {
        Some(chunk) => Next::Chunk(chunk),
        None => Next::End,
    }
}

/// Pass the items projected from every chunk to `on_item`, in order.
///
/// Returns how many items were delivered. Cancellation is not an error: the
/// count so far is returned.
///
/// # Errors
///
/// The first stream failure or projection failure. Items delivered before
/// the failure stay delivered.
pub async fn for_each_item<T, I, F, G>(
    mut stream: ResponseStream,
    mut project: F,
    mut on_item: G,
    mut cancel: Option<CancelToken>,
) -> Result<usize, ViamError>
where
    F: FnMut(Value) -> Result<I, ViamError>,
    I: IntoIterator<Item = T>,
    G: FnMut(T),
{
    let mut delivered = 0;
    loop {
        match next_chunk(&mut stream, &mut cancel).await {
            Next::Chunk(chunk) => {
                for item in project(chunk?)? {
                    on_item(item);
                    delivered += 1;
                }
            }
            Next::End => return Ok(delivered),
            Next::Cancelled => {
                debug!(target: "viam_rpc", delivered, "stream consumer cancelled");
                return Ok(delivered);
            }
        }
    }
}

/// Append the items projected from every chunk to `sink`, in order.
///
/// Returns how many items were appended. On cancellation the items already
/// appended stay in `sink` and the count so far is returned.
///
/// # Errors
///
/// The first stream failure or projection failure. Items appended before
/// the failure are kept.
pub async fn collect_into<T, I, F>(
    stream: ResponseStream,
    sink: &mut Vec<T>,
    project: F,
    cancel: Option<CancelToken>,
) -> Result<usize, ViamError>
where
    F: FnMut(Value) -> Result<I, ViamError>,
    I: IntoIterator<Item = T>,
{
    for_each_item(stream, project, |item| sink.push(item), cancel).await
}

/// Concatenate the base64 `field` of every chunk into one buffer.
///
/// # Errors
///
/// The first stream failure, a malformed chunk, or
/// [`ViamError::Cancelled`] when the token fires before the stream ends.
pub async fn concat_bytes(
    mut stream: ResponseStream,
    field: &str,
    mut cancel: Option<CancelToken>,
) -> Result<Vec<u8>, ViamError> {
    let mut buffer = Vec::new();
    loop {
        match next_chunk(&mut stream, &mut cancel).await {
            Next::Chunk(chunk) => buffer.extend(wire::bytes_field(&chunk?, field)?),
            Next::End => return Ok(buffer),
            Next::Cancelled => return Err(ViamError::Cancelled),
        }
    }
}
