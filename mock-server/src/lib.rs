//! Mock HTTP backend for exercising the client over real sockets.
//!
//! # Design
//! Stateless on purpose: every route computes its response from the request
//! alone, so integration tests can run in parallel against one router
//! definition without ordering constraints. The routes cover the client's
//! observable behaviors: body capture, binary fidelity, status
//! propagation, header echo, slow responses for timeout tests, and a
//! multipart endpoint that validates form uploads.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Multipart, Path},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// A request as the server observed it, reflected back as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub body: String,
    pub len: usize,
}

pub fn app() -> Router {
    Router::new()
        .route("/text", get(text))
        .route("/json", get(json))
        .route("/bytes", get(bytes))
        .route("/slow", get(slow))
        .route("/status/{code}", any(status))
        .route("/echo", post(echo).put(echo).delete(echo))
        .route("/headers", get(headers))
        .route("/upload", post(upload))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn text() -> &'static str {
    "hello from the mock server"
}

async fn json() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "service": "mock-server", "ok": true }))
}

/// Every octet value once, for binary download fidelity checks.
async fn bytes() -> Vec<u8> {
    (0u8..=255).collect()
}

/// Responds after a delay long enough to trip client timeouts.
async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "finally"
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn echo(method: Method, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        body: String::from_utf8_lossy(&body).into_owned(),
        len: body.len(),
    })
}

async fn headers(header_map: HeaderMap) -> Json<HashMap<String, String>> {
    let mut seen = HashMap::new();
    for (name, value) in &header_map {
        seen.insert(
            name.as_str().to_string(),
            value.to_str().unwrap_or_default().to_string(),
        );
    }
    Json(seen)
}

/// Accepts a multipart form holding at least one file field and one plain
/// field; rejects anything less with 422.
async fn upload(mut multipart: Multipart) -> StatusCode {
    let mut files = 0;
    let mut values = 0;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let is_file = field.file_name().is_some();
                if field.bytes().await.is_err() {
                    return StatusCode::BAD_REQUEST;
                }
                if is_file {
                    files += 1;
                } else {
                    values += 1;
                }
            }
            Ok(None) => break,
            Err(_) => return StatusCode::BAD_REQUEST,
        }
    }
    if files > 0 && values > 0 {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "POST".to_string(),
            body: "ping".to_string(),
            len: 4,
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["body"], "ping");
        assert_eq!(json["len"], 4);
    }

    #[test]
    fn echo_roundtrips_through_json() {
        let echo = Echo {
            method: "PUT".to_string(),
            body: "payload".to_string(),
            len: 7,
        };
        let json = serde_json::to_string(&echo).unwrap();
        let back: Echo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, echo.method);
        assert_eq!(back.body, echo.body);
        assert_eq!(back.len, echo.len);
    }
}
