//! Error types for the HTTP client.
//!
//! # Design
//! Usage mistakes (wrong session state, empty URL) and transport failures get
//! separate variants because callers handle them differently: the former are
//! fixed in code, the latter are runtime conditions worth retrying or
//! reporting. HTTP 4xx/5xx statuses are *not* errors: requests that reach
//! the server return `Ok` with the status code, whatever it is.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors returned by [`HttpClient`](crate::HttpClient) operations.
#[derive(Debug)]
pub enum HttpClientError {
    /// `init_session` was called while a session is already active.
    SessionAlreadyInitialized,

    /// A request or cleanup was attempted without an active session.
    SessionNotInitialized,

    /// The request URL is empty.
    EmptyUrl,

    /// A header line could not be handed to the transfer engine.
    InvalidHeader(String),

    /// A local file could not be opened, written, or read.
    LocalFile { path: PathBuf, source: io::Error },

    /// A multipart form could not be serialized for the engine.
    Form(curl::FormError),

    /// The transfer itself failed: connect, resolve, TLS, timeout, or a
    /// cancelling callback. `code` and `reason` come from the engine;
    /// `status` is the last known HTTP status (`0` when none was received).
    Transfer {
        url: String,
        code: u32,
        reason: String,
        status: i32,
    },
}

impl fmt::Display for HttpClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpClientError::SessionAlreadyInitialized => {
                write!(f, "session is already initialized; call cleanup_session() first")
            }
            HttpClientError::SessionNotInitialized => {
                write!(f, "session is not initialized; call init_session() first")
            }
            HttpClientError::EmptyUrl => write!(f, "request URL is empty"),
            HttpClientError::InvalidHeader(header) => {
                write!(f, "header line {header:?} was rejected by the transfer engine")
            }
            HttpClientError::LocalFile { path, source } => {
                write!(f, "local file {}: {source}", path.display())
            }
            HttpClientError::Form(source) => {
                write!(f, "multipart form could not be built: {source}")
            }
            HttpClientError::Transfer {
                url,
                code,
                reason,
                status,
            } => {
                write!(
                    f,
                    "transfer to '{url}' failed: {reason} (engine code {code}, last HTTP status {status})"
                )
            }
        }
    }
}

impl std::error::Error for HttpClientError {}
