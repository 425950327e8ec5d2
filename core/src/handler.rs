//! Streaming adapters between the transfer engine and caller-visible data.
//!
//! # Design
//! The engine pushes response bytes and header lines into the handler and
//! pulls request bytes out of it, in engine-sized chunks. The handler never
//! buffers beyond what its sink or source already holds: a `Buffer` sink
//! accumulates, a `File` sink streams to disk, `Discard` drops the bytes on
//! the floor. Returning a short count from a delivery aborts the transfer,
//! which is how write failures are reported back to the engine.
//!
//! Each request re-arms the handler through [`TransferHandler::prepare`],
//! so no sink, source, or captured header from a previous transfer can leak
//! into the next one. File-backed sinks and sources are closed when their
//! request completes, so no descriptor stays open between requests.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};

use curl::easy::{Handler, ReadError, SeekResult, WriteError};

use crate::types::{HeadersMap, ProgressCallback};

/// Destination for response body bytes.
pub(crate) enum BodySink {
    /// Count the bytes, keep nothing. Used when only status and headers
    /// matter.
    Discard,
    /// Accumulate the body in memory.
    Buffer(Vec<u8>),
    /// Stream the body to an open local file.
    File(BufWriter<File>),
}

/// Source of request body bytes.
pub(crate) enum BodySource {
    /// No request body.
    Empty,
    /// An owned in-memory body, drained from the cursor position.
    Memory(Cursor<Vec<u8>>),
    /// A local file streamed from disk.
    File(BufReader<File>),
}

/// Per-transfer callback state installed in the engine handle.
pub(crate) struct TransferHandler {
    sink: BodySink,
    captured_headers: Option<HeadersMap>,
    source: BodySource,
    progress: Option<ProgressCallback>,
}

impl TransferHandler {
    pub(crate) fn new() -> Self {
        Self {
            sink: BodySink::Discard,
            captured_headers: None,
            source: BodySource::Empty,
            progress: None,
        }
    }

    /// Arm the handler for the next transfer, replacing whatever the
    /// previous one left behind.
    pub(crate) fn prepare(&mut self, sink: BodySink, capture_headers: bool, source: BodySource) {
        self.sink = sink;
        self.captured_headers = capture_headers.then(HeadersMap::new);
        self.source = source;
    }

    pub(crate) fn set_progress(&mut self, callback: Option<ProgressCallback>) {
        self.progress = callback;
    }

    pub(crate) fn take_progress(&mut self) -> Option<ProgressCallback> {
        self.progress.take()
    }

    pub(crate) fn wants_progress(&self) -> bool {
        self.progress.is_some()
    }

    /// Move the accumulated body out, leaving a `Discard` sink behind.
    pub(crate) fn take_body(&mut self) -> Vec<u8> {
        match std::mem::replace(&mut self.sink, BodySink::Discard) {
            BodySink::Buffer(bytes) => bytes,
            _ => Vec::new(),
        }
    }

    /// Move the accumulated body and captured headers out.
    pub(crate) fn take_captured(&mut self) -> (Vec<u8>, HeadersMap) {
        let body = self.take_body();
        let headers = self.captured_headers.take().unwrap_or_default();
        (body, headers)
    }

    /// Flush and close a file sink. The descriptor is released even when
    /// the flush fails; other sinks stay armed for harvesting.
    pub(crate) fn close_sink(&mut self) -> io::Result<()> {
        match std::mem::replace(&mut self.sink, BodySink::Discard) {
            BodySink::File(mut writer) => writer.flush(),
            other => {
                self.sink = other;
                Ok(())
            }
        }
    }

    /// Release the request body source, closing a file-backed one.
    pub(crate) fn release_source(&mut self) {
        self.source = BodySource::Empty;
    }
}

impl Handler for TransferHandler {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        match &mut self.sink {
            BodySink::Discard => Ok(data.len()),
            BodySink::Buffer(buffer) => {
                buffer.extend_from_slice(data);
                Ok(data.len())
            }
            BodySink::File(writer) => {
                if data.is_empty() {
                    return Ok(0);
                }
                match writer.write_all(data) {
                    Ok(()) => Ok(data.len()),
                    // a short count makes the engine abort the transfer
                    Err(_) => Ok(0),
                }
            }
        }
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize, ReadError> {
        match &mut self.source {
            BodySource::Empty => Ok(0),
            BodySource::Memory(cursor) => cursor.read(data).map_err(|_| ReadError::Abort),
            BodySource::File(reader) => reader.read(data).map_err(|_| ReadError::Abort),
        }
    }

    fn seek(&mut self, whence: SeekFrom) -> SeekResult {
        let sought = match &mut self.source {
            BodySource::Empty => return SeekResult::CantSeek,
            BodySource::Memory(cursor) => cursor.seek(whence),
            BodySource::File(reader) => reader.seek(whence),
        };
        match sought {
            Ok(_) => SeekResult::Ok,
            Err(_) => SeekResult::Fail,
        }
    }

    fn header(&mut self, data: &[u8]) -> bool {
        if let Some(headers) = &mut self.captured_headers {
            parse_header_line(headers, data);
        }
        true
    }

    fn progress(&mut self, dltotal: f64, dlnow: f64, ultotal: f64, ulnow: f64) -> bool {
        match &mut self.progress {
            Some(callback) => callback(dltotal, dlnow, ultotal, ulnow),
            None => true,
        }
    }
}

/// Record one raw header line into the map.
///
/// Lines split at the first `:` with key and value trimmed; the last write
/// wins for repeated keys. Colon-less non-blank lines (the status line, for
/// one) are recorded under the trimmed line with the value `"present"`.
/// Blank lines are accepted and ignored.
fn parse_header_line(headers: &mut HeadersMap, data: &[u8]) {
    let line = String::from_utf8_lossy(data);
    match line.split_once(':') {
        Some((key, value)) => {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
        None => {
            let line = line.trim();
            if !line.is_empty() {
                headers.insert(line.to_string(), "present".to_string());
            }
        }
    }
}
