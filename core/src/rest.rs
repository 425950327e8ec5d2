//! REST verb surface: HEAD, GET, POST, PUT, DELETE.
//!
//! # Design
//! Every verb follows the same three-step shape: arm the session for a
//! captured response (body buffer plus header map) and translate the
//! caller's headers, apply the verb-specific engine directives, then turn
//! the outcome into an [`HttpResponse`]. A request that reached the server
//! is `Ok` whatever the HTTP status; only transport failures are `Err`, and
//! they carry no response value at all.

use std::io::Cursor;

use crate::client::HttpClient;
use crate::error::HttpClientError;
use crate::handler::{BodySink, BodySource};
use crate::types::{HeadersMap, HttpResponse};

impl HttpClient {
    /// Issue a HEAD request: status and headers only, no response body.
    pub fn head(
        &mut self,
        url: &str,
        headers: &HeadersMap,
    ) -> Result<HttpResponse, HttpClientError> {
        self.prepare_rest(url, headers, BodySource::Empty)?;
        let performed = self.perform_request("perform HEAD request to", |easy| {
            easy.custom_request("HEAD")?;
            easy.nobody(true)
        });
        self.finish_rest(performed)
    }

    /// Issue a GET request, capturing status, headers, and body.
    pub fn get(
        &mut self,
        url: &str,
        headers: &HeadersMap,
    ) -> Result<HttpResponse, HttpClientError> {
        self.prepare_rest(url, headers, BodySource::Empty)?;
        let performed = self.perform_request("perform GET request to", |easy| easy.get(true));
        self.finish_rest(performed)
    }

    /// Issue a DELETE request.
    pub fn del(
        &mut self,
        url: &str,
        headers: &HeadersMap,
    ) -> Result<HttpResponse, HttpClientError> {
        self.prepare_rest(url, headers, BodySource::Empty)?;
        let performed =
            self.perform_request("perform DELETE request to", |easy| easy.custom_request("DELETE"));
        self.finish_rest(performed)
    }

    /// POST `data` to `url`. The body is copied into the engine before the
    /// transfer starts.
    pub fn post(
        &mut self,
        url: &str,
        headers: &HeadersMap,
        data: &str,
    ) -> Result<HttpResponse, HttpClientError> {
        self.prepare_rest(url, headers, BodySource::Empty)?;
        let performed = self.perform_request("perform POST request to", |easy| {
            easy.post(true)?;
            easy.post_fields_copy(data.as_bytes())
        });
        self.finish_rest(performed)
    }

    /// PUT a text body to `url`.
    pub fn put(
        &mut self,
        url: &str,
        headers: &HeadersMap,
        data: &str,
    ) -> Result<HttpResponse, HttpClientError> {
        self.put_bytes(url, headers, data.as_bytes())
    }

    /// PUT a binary body to `url`. The bytes are owned by the session for
    /// the duration of the transfer and streamed out in engine-sized
    /// blocks, with rewind support if the engine needs to retry.
    pub fn put_bytes(
        &mut self,
        url: &str,
        headers: &HeadersMap,
        data: &[u8],
    ) -> Result<HttpResponse, HttpClientError> {
        let size = data.len() as u64;
        self.prepare_rest(url, headers, BodySource::Memory(Cursor::new(data.to_vec())))?;
        let performed = self.perform_request("perform PUT request to", move |easy| {
            easy.upload(true)?;
            easy.in_filesize(size)
        });
        self.finish_rest(performed)
    }

    fn prepare_rest(
        &mut self,
        url: &str,
        headers: &HeadersMap,
        source: BodySource,
    ) -> Result<(), HttpClientError> {
        self.begin_request(url, BodySink::Buffer(Vec::new()), true, source)?;
        for (key, value) in headers {
            self.add_header(&format!("{key}: {value}"))?;
        }
        Ok(())
    }

    fn finish_rest(
        &mut self,
        performed: Result<i32, HttpClientError>,
    ) -> Result<HttpResponse, HttpClientError> {
        let code = performed?;
        let (body, headers) = self.take_captured();
        Ok(HttpResponse {
            code,
            headers,
            body,
        })
    }
}
