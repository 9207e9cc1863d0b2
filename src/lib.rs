//! httptool - outbound HTTP requests through one shared pooled client
//!
//! Every request goes through the same pipeline: options are resolved, the
//! request is built and dispatched under a deadline, the duration is measured
//! and exactly one log event is emitted. Only `200 OK` counts as success.
//!
//! ## Features
//!
//! - **Shared pooled client**, built lazily and replaceable at any time
//! - **Functional options** for cancellation scope, timeout, body, headers, logger
//! - **Slow-request logging** at warn level above a configurable threshold
//! - **Uniform results**: non-200 replies are errors carrying the code and body
//!
//! ## Quick Start
//!
//! ```no_run
//! use httptool::{with_slow_threshold, CancellationToken};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scope = CancellationToken::new();
//!     let reply = httptool::get(
//!         scope,
//!         "https://httpbin.org/json",
//!         [with_slow_threshold(Duration::from_millis(200))],
//!     )
//!     .await?;
//!
//!     println!("Status: {}", reply.status());
//!     println!("Body: {}", reply.text());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod options;
pub mod request;
pub mod response;

// Re-export main types for convenience
pub use client::{http_client, set_http_client, Client, ClientBuilder, ClientProvider};
pub use config::PoolConfig;
pub use error::{Error, ErrorKind, Result};
pub use logger::{default_logger, Field, LogLevel, Logger, TracingLogger};
pub use options::{
    with_body, with_context, with_header, with_headers, with_logger, with_slow_threshold,
    with_timeout, RequestOption, RequestOptions,
};
pub use request::{get, post, post_json, request, Requester};
pub use response::Reply;

// Re-export common HTTP types
pub use http::{HeaderMap, Method, StatusCode};

// Cancellation scopes
pub use tokio_util::sync::CancellationToken;

pub use bytes::Bytes;
