//! Shared data types of the client surface.
//!
//! # Design
//! Everything here is plain owned data. The engine handle and the streaming
//! state live elsewhere; these types are what callers pass in and get back,
//! so they stay cheap to clone and to assert on in tests.

use std::borrow::Cow;
use std::collections::HashMap;

/// Request or response headers keyed by header name.
///
/// Order-irrelevant and duplicate-insensitive: inserting the same key twice
/// keeps the last value. Response status lines and other colon-less header
/// lines are recorded under the full line with the value `"present"`.
pub type HeadersMap = HashMap<String, String>;

/// Logger invoked with every diagnostic message the client emits.
///
/// Supplied once at construction and gated by
/// [`SessionSettings::enable_log`].
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Progress observer called repeatedly during a transfer with
/// `(dl_total, dl_now, ul_total, ul_now)` byte counts.
///
/// Returning `false` cancels the transfer, which then fails with a
/// transport error.
pub type ProgressCallback = Box<dyn FnMut(f64, f64, f64, f64) -> bool + Send>;

/// Outcome of a REST request.
///
/// `code` is the numeric HTTP status of the last response, `0` while no
/// request has been executed yet. Transport failures never produce a
/// response value; they surface as
/// [`HttpClientError::Transfer`](crate::HttpClientError::Transfer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub code: i32,
    pub headers: HeadersMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Per-session toggles applied at [`init_session`](crate::HttpClient::init_session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Emit diagnostics through the logger callback.
    pub enable_log: bool,
    /// Verify the peer certificate on HTTPS transfers.
    pub verify_peer: bool,
    /// Verify that the certificate matches the host on HTTPS transfers.
    pub verify_host: bool,
}

impl SessionSettings {
    /// Every toggle on. This is also the default.
    pub const fn all() -> Self {
        Self {
            enable_log: true,
            verify_peer: true,
            verify_host: true,
        }
    }

    /// Every toggle off.
    pub const fn none() -> Self {
        Self {
            enable_log: false,
            verify_peer: false,
            verify_host: false,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::all()
    }
}
