//! `viam-rpc` – the generic resource adapter.
//!
//! Every typed client in the SDK is a thin layer over one
//! [`ResourceClient`]: it builds a JSON request, hands it to the client, and
//! reshapes the decoded response. This crate owns everything those layers
//! share.
//!
//! # Modules
//!
//! - [`channel`] – the [`Channel`] transport seam (unary + server streaming)
//!   and [`MethodPath`].
//! - [`client`] – [`ServiceDescriptor`] method tables, [`ClientOptions`] with
//!   the request-logging hook, and the generic [`ResourceClient`].
//! - [`command`] – the shared `DoCommand` escape hatch.
//! - [`streaming`] – ordered stream consumers and the [`CancelHandle`] used
//!   to stop them early.
//! - [`connect`] – [`ConnectChannel`], a Connect-protocol JSON transport over
//!   HTTP.
//! - [`mock`] – [`MockChannel`], a recording channel for tests.
//! - [`resource_adapter!`] – declares a typed adapter over [`ResourceClient`].

pub mod channel;
pub mod client;
pub mod command;
pub mod connect;
mod macros;
pub mod mock;
pub mod streaming;

pub use channel::{Channel, MethodPath, ResponseStream};
pub use client::{ClientOptions, RequestLogger, ResourceClient, ServiceDescriptor};
pub use command::{DO_COMMAND, do_command};
pub use connect::{ConnectChannel, EnvelopeDecoder, decode_stream};
pub use mock::{MockChannel, RecordedCall};
pub use streaming::{CancelHandle, CancelToken, collect_into, concat_bytes, for_each_item};

pub use viam_types::{Struct, ViamError};
