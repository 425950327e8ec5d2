//! Process-wide transfer engine environment.
//!
//! # Design
//! libcurl's global initialization is not thread safe, so it must happen
//! exactly once, before any concurrent handle exists. Every `HttpClient`
//! holds an [`EngineEnv`] guard; the first acquisition runs the global init
//! and a counter tracks how many clients are alive. The counter is
//! observable through [`live_clients`] so tests can assert that both sides
//! of the lifecycle stay balanced.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

static LIVE_CLIENTS: Mutex<usize> = Mutex::new(0);
static CERTIFICATE_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// RAII guard tying one client instance to the global engine environment.
///
/// The 0 -> 1 transition initializes the engine process-wide; dropping the
/// guard only retires the bookkeeping, since the engine stays initialized
/// for the life of the process.
pub(crate) struct EngineEnv;

impl EngineEnv {
    pub(crate) fn acquire() -> Self {
        let mut live = LIVE_CLIENTS.lock().unwrap_or_else(|e| e.into_inner());
        if *live == 0 {
            // aborts the process if libcurl cannot come up; there is no
            // meaningful recovery from a half-initialized engine
            curl::init();
        }
        *live += 1;
        EngineEnv
    }
}

impl Drop for EngineEnv {
    fn drop(&mut self) {
        let mut live = LIVE_CLIENTS.lock().unwrap_or_else(|e| e.into_inner());
        *live = live.saturating_sub(1);
    }
}

/// Number of `HttpClient` instances currently alive in this process.
pub fn live_clients() -> usize {
    *LIVE_CLIENTS.lock().unwrap_or_else(|e| e.into_inner())
}

/// Set the CA bundle used to verify peers on HTTPS transfers.
///
/// Process-wide; set it before spawning clients on other threads. An empty
/// path clears the bundle.
pub fn set_certificate_file(path: impl AsRef<Path>) {
    let path = path.as_ref();
    let mut slot = CERTIFICATE_FILE.lock().unwrap_or_else(|e| e.into_inner());
    *slot = if path.as_os_str().is_empty() {
        None
    } else {
        Some(path.to_path_buf())
    };
}

/// The CA bundle path currently in effect, if any.
pub fn certificate_file() -> Option<PathBuf> {
    CERTIFICATE_FILE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}
