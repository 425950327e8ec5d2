//! Synchronous HTTP client built on the libcurl transfer engine.
//!
//! # Overview
//! [`HttpClient`] wraps one engine session behind an explicit lifecycle:
//! `init_session` allocates the handle, request methods borrow it for one
//! blocking transfer each, `cleanup_session` releases it. On top of that
//! sit a simple transfer surface (`get_text`, `download_file`,
//! `upload_form`, `upload_file`) and a REST verb surface
//! (`head`/`get`/`post`/`put`/`del`) that captures status, headers, and
//! body into an [`HttpResponse`].
//!
//! # Design
//! - The wire protocol is fully delegated to the engine: redirects, proxy
//!   tunneling, TLS, and timeouts are engine options, not client code.
//! - Each request resets the engine handle and re-applies the client's
//!   options, so no option or callback survives from one request into the
//!   next.
//! - Response data streams through tagged sinks (memory buffer, local
//!   file, discard) instead of growing unconditionally in memory.
//! - Transport failures are `Err`; HTTP 4xx/5xx are `Ok` with the status
//!   code, because a response from the server is an answer, not a failure
//!   of the client.
//! - One client serves one thread (`Send` but not `Sync`); concurrent
//!   transfers take one client per thread, sharing only the process-wide
//!   engine environment.

pub mod client;
pub mod error;
pub mod form;
pub mod types;

mod env;
mod handler;
mod rest;

pub use client::{HttpClient, USER_AGENT};
pub use env::{certificate_file, live_clients, set_certificate_file};
pub use error::HttpClientError;
pub use form::{FormPart, PostForm};
pub use types::{HeadersMap, HttpResponse, LogCallback, ProgressCallback, SessionSettings};
