//! Session-oriented HTTP client over the libcurl engine.
//!
//! # Design
//! `HttpClient` owns at most one engine handle, allocated by
//! [`HttpClient::init_session`] and released by
//! [`HttpClient::cleanup_session`]. Every request method resets the handle
//! and re-applies the client's current options immediately before the
//! transfer, so nothing configured for one request can survive into the
//! next. Response bytes and header lines flow through the crate-private
//! [`TransferHandler`] rather than through return values, which keeps
//! memory proportional to what the caller asked to keep.
//!
//! The client is `Send` but deliberately not `Sync`: one instance serves
//! one thread at a time, and callers wanting parallel transfers create one
//! client per thread.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use curl::easy::{Easy2, List};

use crate::env::{self, EngineEnv};
use crate::error::HttpClientError;
use crate::form::PostForm;
use crate::handler::{BodySink, BodySource, TransferHandler};
use crate::types::{HeadersMap, LogCallback, ProgressCallback, SessionSettings};

/// User agent advertised on every request.
pub const USER_AGENT: &str = concat!("curlew/", env!("CARGO_PKG_VERSION"));

const LOG_ERROR_EMPTY_URL: &str = "[HttpClient][Error] URL is empty.";
const LOG_ERROR_ALREADY_INIT: &str =
    "[HttpClient][Error] Session is already initialized. Call cleanup_session() to end it first.";
const LOG_ERROR_NOT_INIT: &str =
    "[HttpClient][Error] Session is not initialized. Call init_session() first.";
const LOG_WARNING_NOT_CLEANED: &str = "[HttpClient][Warning] Client dropped with an active session. \
     The session was cleaned up anyway.";

/// Synchronous HTTP client bound to a single engine session.
///
/// A freshly constructed client is inactive: requests fail with
/// [`HttpClientError::SessionNotInitialized`] until
/// [`init_session`](Self::init_session) runs. Options set on the client
/// (proxy, timeout, TLS material, progress callback) persist across
/// requests and are re-applied to the engine before each transfer.
pub struct HttpClient {
    handle: Option<Easy2<TransferHandler>>,
    pending_headers: Option<List>,
    url: String,
    proxy: String,
    timeout: Option<Duration>,
    https: bool,
    no_signal: bool,
    settings: SessionSettings,
    ssl_cert_file: Option<PathBuf>,
    ssl_key_file: Option<PathBuf>,
    ssl_key_password: Option<String>,
    progress: Option<ProgressCallback>,
    logger: LogCallback,
    _env: EngineEnv,
}

/// Snapshot of the per-request engine options, borrowed from the client so
/// the engine handle can be borrowed mutably at the same time.
struct EngineOptions<'a> {
    url: &'a str,
    proxy: &'a str,
    timeout: Option<Duration>,
    no_signal: bool,
    https: bool,
    verify_peer: bool,
    verify_host: bool,
    ssl_cert: Option<&'a Path>,
    ssl_key: Option<&'a Path>,
    key_password: Option<&'a str>,
}

impl HttpClient {
    /// Create an inactive client. `logger` receives every diagnostic the
    /// client emits while [`SessionSettings::enable_log`] is on.
    pub fn new<F>(logger: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            handle: None,
            pending_headers: None,
            url: String::new(),
            proxy: String::new(),
            timeout: None,
            https: false,
            no_signal: false,
            settings: SessionSettings::default(),
            ssl_cert_file: None,
            ssl_key_file: None,
            ssl_key_password: None,
            progress: None,
            logger: Box::new(logger),
            _env: EngineEnv::acquire(),
        }
    }

    /// Allocate the engine session and store the session-wide `https`
    /// default and `settings`.
    ///
    /// Fails with [`HttpClientError::SessionAlreadyInitialized`] if a
    /// session is active; the active session is left untouched.
    pub fn init_session(
        &mut self,
        https: bool,
        settings: SessionSettings,
    ) -> Result<(), HttpClientError> {
        if self.handle.is_some() {
            self.log(LOG_ERROR_ALREADY_INIT);
            return Err(HttpClientError::SessionAlreadyInitialized);
        }
        self.https = https;
        self.settings = settings;
        self.handle = Some(Easy2::new(TransferHandler::new()));
        Ok(())
    }

    /// Release the engine session and any header lines queued for the next
    /// request.
    ///
    /// Fails with [`HttpClientError::SessionNotInitialized`] if no session
    /// is active; calling it twice is safe, the second call only reports.
    pub fn cleanup_session(&mut self) -> Result<(), HttpClientError> {
        if self.handle.is_none() {
            self.log(LOG_ERROR_NOT_INIT);
            return Err(HttpClientError::SessionNotInitialized);
        }
        self.handle = None;
        self.pending_headers = None;
        Ok(())
    }

    /// Whether a session is currently active.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Target URL of the last request, after scheme completion.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Route requests through `proxy`. Ignored when empty; a proxy without
    /// a scheme is completed to `http://<proxy>`.
    pub fn set_proxy(&mut self, proxy: &str) {
        if proxy.is_empty() {
            return;
        }
        if starts_with_ignore_ascii_case(proxy, "http") {
            self.proxy = proxy.to_string();
        } else {
            self.proxy = format!("http://{proxy}");
        }
    }

    pub fn proxy(&self) -> &str {
        &self.proxy
    }

    /// Abort transfers that run longer than `timeout`. A zero duration
    /// disables the limit.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = if timeout.is_zero() { None } else { Some(timeout) };
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Default scheme applied to URLs that carry none. Requests with an
    /// explicit `http://` or `https://` scheme overwrite this flag.
    pub fn set_https(&mut self, https: bool) {
        self.https = https;
    }

    pub fn is_https(&self) -> bool {
        self.https
    }

    /// Suppress engine use of signals even when no timeout is set. Needed
    /// when other threads of the process rely on signal delivery.
    pub fn set_no_signal(&mut self, no_signal: bool) {
        self.no_signal = no_signal;
    }

    pub fn no_signal(&self) -> bool {
        self.no_signal
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Client certificate presented on HTTPS transfers. An empty path
    /// clears it.
    pub fn set_ssl_cert_file(&mut self, path: impl AsRef<Path>) {
        self.ssl_cert_file = non_empty_path(path.as_ref());
    }

    pub fn ssl_cert_file(&self) -> Option<&Path> {
        self.ssl_cert_file.as_deref()
    }

    /// Private key matching the client certificate. An empty path clears
    /// it.
    pub fn set_ssl_key_file(&mut self, path: impl AsRef<Path>) {
        self.ssl_key_file = non_empty_path(path.as_ref());
    }

    pub fn ssl_key_file(&self) -> Option<&Path> {
        self.ssl_key_file.as_deref()
    }

    /// Passphrase for the private key. An empty string clears it.
    pub fn set_ssl_key_password(&mut self, password: &str) {
        self.ssl_key_password = if password.is_empty() {
            None
        } else {
            Some(password.to_string())
        };
    }

    pub fn ssl_key_password(&self) -> Option<&str> {
        self.ssl_key_password.as_deref()
    }

    /// Observe transfer progress. The callback runs on the calling thread
    /// during transfers; returning `false` cancels the transfer in flight.
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: FnMut(f64, f64, f64, f64) -> bool + Send + 'static,
    {
        self.progress = Some(Box::new(callback));
    }

    /// Queue one raw header line for the next request only. The line is
    /// handed to the engine as-is, so `"Name: value"` adds a header and
    /// `"Name:"` suppresses one the engine would add on its own.
    pub fn add_header(&mut self, header: &str) -> Result<(), HttpClientError> {
        let list = self.pending_headers.get_or_insert_with(List::new);
        list.append(header)
            .map_err(|_| HttpClientError::InvalidHeader(header.to_string()))
    }

    /// Fetch `url` and return the response body as text together with the
    /// HTTP status.
    ///
    /// Any status counts as success as long as the transfer completed;
    /// the body is decoded lossily as UTF-8.
    pub fn get_text(&mut self, url: &str) -> Result<(String, i32), HttpClientError> {
        self.begin_request(url, BodySink::Buffer(Vec::new()), false, BodySource::Empty)?;
        let status = self.perform_request("perform request to", |easy| easy.get(true))?;
        let body = self.take_body();
        Ok((String::from_utf8_lossy(&body).into_owned(), status))
    }

    /// Download `url` into `local_file`, returning the HTTP status.
    ///
    /// The local file only survives a transfer that completed with status
    /// 200: on any other status, or on a transport failure, it is removed
    /// so an error page can never masquerade as the artifact. The file
    /// handle is closed before any removal and before returning.
    pub fn download_file(
        &mut self,
        local_file: impl AsRef<Path>,
        url: &str,
    ) -> Result<i32, HttpClientError> {
        let path = local_file.as_ref();
        if url.is_empty() {
            self.log(LOG_ERROR_EMPTY_URL);
            return Err(HttpClientError::EmptyUrl);
        }
        if self.handle.is_none() {
            self.log(LOG_ERROR_NOT_INIT);
            return Err(HttpClientError::SessionNotInitialized);
        }
        self.check_url(url);
        let file = match File::create(path) {
            Ok(file) => file,
            Err(source) => {
                self.log(&format!(
                    "[HttpClient][Error] Unable to open local file {}",
                    path.display()
                ));
                return Err(HttpClientError::LocalFile {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if let Some(easy) = self.handle.as_mut() {
            easy.reset();
            easy.get_mut().prepare(
                BodySink::File(io::BufWriter::new(file)),
                false,
                BodySource::Empty,
            );
        }

        let performed = self.perform_request("download file from", |easy| easy.get(true));
        let closed = self.close_file_sink();

        let status = match &performed {
            Ok(status) => *status,
            Err(HttpClientError::Transfer { status, .. }) => *status,
            Err(_) => 0,
        };
        if status != 200 || closed.is_err() {
            // a non-200 body is an error page, not the artifact
            let _ = fs::remove_file(path);
        }
        let status = performed?;
        if let Err(source) = closed {
            return Err(HttpClientError::LocalFile {
                path: path.to_path_buf(),
                source,
            });
        }
        Ok(status)
    }

    /// POST `form` to `url` as `multipart/form-data`, returning the HTTP
    /// status. The response body is discarded.
    ///
    /// An empty form sends a plain POST without a multipart body.
    pub fn upload_form(&mut self, url: &str, form: &PostForm) -> Result<i32, HttpClientError> {
        self.begin_request(url, BodySink::Discard, false, BodySource::Empty)?;
        let form = form.to_curl_form().map_err(HttpClientError::Form)?;
        // suppress the Expect: 100-continue handshake
        self.add_header("Expect:")?;
        self.perform_request("upload form to", move |easy| {
            easy.post(true)?;
            if let Some(form) = form {
                easy.httppost(form)?;
            }
            Ok(())
        })
    }

    /// PUT the contents of `local_file` to `url`, returning the HTTP
    /// status. The response body is discarded and the source file is
    /// closed before the method returns.
    pub fn upload_file(
        &mut self,
        local_file: impl AsRef<Path>,
        url: &str,
    ) -> Result<i32, HttpClientError> {
        let path = local_file.as_ref();
        if url.is_empty() {
            self.log(LOG_ERROR_EMPTY_URL);
            return Err(HttpClientError::EmptyUrl);
        }
        if self.handle.is_none() {
            self.log(LOG_ERROR_NOT_INIT);
            return Err(HttpClientError::SessionNotInitialized);
        }
        self.check_url(url);
        let file = match File::open(path) {
            Ok(file) => file,
            Err(source) => {
                self.log(&format!(
                    "[HttpClient][Error] Unable to open local file {}",
                    path.display()
                ));
                return Err(HttpClientError::LocalFile {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let size = file
            .metadata()
            .map(|metadata| metadata.len())
            .map_err(|source| HttpClientError::LocalFile {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(easy) = self.handle.as_mut() {
            easy.reset();
            easy.get_mut().prepare(
                BodySink::Discard,
                false,
                BodySource::File(io::BufReader::new(file)),
            );
        }
        self.perform_request("upload file to", move |easy| {
            easy.upload(true)?;
            easy.in_filesize(size)
        })
    }

    /// Shared request preflight: validate state, complete the URL scheme,
    /// reset the engine handle, and arm the streaming handler.
    pub(crate) fn begin_request(
        &mut self,
        url: &str,
        sink: BodySink,
        capture_headers: bool,
        source: BodySource,
    ) -> Result<(), HttpClientError> {
        if url.is_empty() {
            self.log(LOG_ERROR_EMPTY_URL);
            return Err(HttpClientError::EmptyUrl);
        }
        if self.handle.is_none() {
            self.log(LOG_ERROR_NOT_INIT);
            return Err(HttpClientError::SessionNotInitialized);
        }
        self.check_url(url);
        if let Some(easy) = self.handle.as_mut() {
            easy.reset();
            easy.get_mut().prepare(sink, capture_headers, source);
        }
        Ok(())
    }

    /// Apply the client's current options to the engine in a fixed order,
    /// run the verb-specific `configure` hook, and perform the transfer.
    ///
    /// Returns the HTTP status on success. On failure the queued header
    /// list has still been consumed and the progress callback restored, so
    /// the client is ready for the next request. The request body source
    /// is released on both outcomes, closing any file handle behind it.
    pub(crate) fn perform_request<F>(
        &mut self,
        action: &str,
        configure: F,
    ) -> Result<i32, HttpClientError>
    where
        F: FnOnce(&mut Easy2<TransferHandler>) -> Result<(), curl::Error>,
    {
        if self.handle.is_none() {
            self.log(LOG_ERROR_NOT_INIT);
            return Err(HttpClientError::SessionNotInitialized);
        }
        let headers = self.pending_headers.take();
        let progress = self.progress.take();
        let options = EngineOptions {
            url: &self.url,
            proxy: &self.proxy,
            timeout: self.timeout,
            no_signal: self.no_signal,
            https: self.https,
            verify_peer: self.settings.verify_peer,
            verify_host: self.settings.verify_host,
            ssl_cert: self.ssl_cert_file.as_deref(),
            ssl_key: self.ssl_key_file.as_deref(),
            key_password: self.ssl_key_password.as_deref(),
        };
        let mut performed = Ok(());
        let mut status = 0;
        if let Some(easy) = self.handle.as_mut() {
            easy.get_mut().set_progress(progress);
            performed = run_transfer(easy, &options, headers, configure);
            status = easy.response_code().map(|code| code as i32).unwrap_or(0);
            self.progress = easy.get_mut().take_progress();
            easy.get_mut().release_source();
        }
        match performed {
            Ok(()) => Ok(status),
            Err(error) => {
                let code = error.code() as u32;
                let reason = error.description().to_string();
                self.log(&format!(
                    "[HttpClient][Error] Unable to {action} '{}' (Error = {code} | {reason}) (HTTP status = {status})",
                    self.url
                ));
                Err(HttpClientError::Transfer {
                    url: self.url.clone(),
                    code,
                    reason,
                    status,
                })
            }
        }
    }

    /// Move the body and captured headers of the last transfer out of the
    /// handler.
    pub(crate) fn take_captured(&mut self) -> (Vec<u8>, HeadersMap) {
        self.handle
            .as_mut()
            .map(|easy| easy.get_mut().take_captured())
            .unwrap_or_default()
    }

    fn take_body(&mut self) -> Vec<u8> {
        self.handle
            .as_mut()
            .map(|easy| easy.get_mut().take_body())
            .unwrap_or_default()
    }

    fn close_file_sink(&mut self) -> io::Result<()> {
        match self.handle.as_mut() {
            Some(easy) => easy.get_mut().close_sink(),
            None => Ok(()),
        }
    }

    /// Complete the scheme of `url` and store it as the request target.
    ///
    /// An explicit `http://` or `https://` scheme is kept verbatim and
    /// updates the client's HTTPS flag; a schemeless URL is prefixed
    /// according to the flag's current value.
    fn check_url(&mut self, url: &str) {
        if starts_with_ignore_ascii_case(url, "http://") {
            self.https = false;
            self.url = url.to_string();
        } else if starts_with_ignore_ascii_case(url, "https://") {
            self.https = true;
            self.url = url.to_string();
        } else {
            let scheme = if self.https { "https://" } else { "http://" };
            self.url = format!("{scheme}{url}");
        }
    }

    fn log(&self, message: &str) {
        if self.settings.enable_log {
            (self.logger)(message);
        }
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.log(LOG_WARNING_NOT_CLEANED);
            let _ = self.cleanup_session();
        }
    }
}

/// Configure the engine handle for one transfer and run it.
///
/// Free function so the handle can be borrowed mutably while the option
/// snapshot borrows the rest of the client.
fn run_transfer<F>(
    easy: &mut Easy2<TransferHandler>,
    options: &EngineOptions<'_>,
    headers: Option<List>,
    configure: F,
) -> Result<(), curl::Error>
where
    F: FnOnce(&mut Easy2<TransferHandler>) -> Result<(), curl::Error>,
{
    easy.url(options.url)?;
    if let Some(list) = headers {
        easy.http_headers(list)?;
    }
    easy.useragent(USER_AGENT)?;
    easy.autoreferer(true)?;
    easy.follow_location(true)?;
    if let Some(timeout) = options.timeout {
        easy.timeout(timeout)?;
        // avoid a SIGALRM firing on timeout
        easy.signal(false)?;
    }
    if !options.proxy.is_empty() {
        easy.proxy(options.proxy)?;
        easy.http_proxy_tunnel(true)?;
    }
    if options.no_signal {
        easy.signal(false)?;
    }
    if easy.get_ref().wants_progress() {
        easy.progress(true)?;
    }
    if options.https {
        easy.ssl_verify_peer(options.verify_peer)?;
        easy.ssl_verify_host(options.verify_host)?;
        if let Some(certificate) = env::certificate_file() {
            easy.cainfo(certificate)?;
        }
        if let Some(cert) = options.ssl_cert {
            easy.ssl_cert(cert)?;
        }
        if let Some(key) = options.ssl_key {
            easy.ssl_key(key)?;
        }
        if let Some(password) = options.key_password {
            easy.key_password(password)?;
        }
    }
    configure(easy)?;
    easy.perform()
}

fn starts_with_ignore_ascii_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn non_empty_path(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path.to_path_buf())
    }
}
