use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn body_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.to_string())
        .unwrap()
}

// --- fixed documents ---

#[tokio::test]
async fn text_returns_the_greeting() {
    let resp = app().oneshot(get_request("/text")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"hello from the mock server");
}

#[tokio::test]
async fn json_returns_the_service_document() {
    let resp = app().oneshot(get_request("/json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/json"
    );
    let value: serde_json::Value = body_json(resp).await;
    assert_eq!(value["service"], "mock-server");
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn bytes_returns_every_octet_once() {
    let resp = app().oneshot(get_request("/bytes")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let body = body_bytes(resp).await;
    assert_eq!(body.len(), 256);
    assert_eq!(body[0], 0);
    assert_eq!(body[255], 255);
}

// --- status propagation ---

#[tokio::test]
async fn status_route_propagates_the_code() {
    let resp = app().oneshot(get_request("/status/404")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());
}

#[tokio::test]
async fn status_route_accepts_any_method() {
    let resp = app()
        .oneshot(body_request("DELETE", "/status/401", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_method_and_body() {
    let resp = app()
        .oneshot(body_request("POST", "/echo", "ping"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "ping");
    assert_eq!(echo.len, 4);
}

#[tokio::test]
async fn echo_handles_put_and_delete() {
    let resp = app()
        .oneshot(body_request("PUT", "/echo", "updated"))
        .await
        .unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.len, 7);

    let resp = app()
        .oneshot(body_request("DELETE", "/echo", ""))
        .await
        .unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "DELETE");
    assert_eq!(echo.len, 0);
}

#[tokio::test]
async fn echo_rejects_get() {
    let resp = app().oneshot(get_request("/echo")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- header reflection ---

#[tokio::test]
async fn headers_are_reflected_lowercased() {
    let request = Request::builder()
        .uri("/headers")
        .header("X-Custom-One", "alpha")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let seen: std::collections::HashMap<String, String> = body_json(resp).await;
    assert_eq!(seen.get("x-custom-one").map(String::as_str), Some("alpha"));
}

// --- multipart upload ---

fn multipart_request(boundary: &str, body: String) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn upload_accepts_a_file_plus_a_field() {
    let boundary = "testboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"submitted\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         file payload\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"description\"\r\n\r\n\
         a text field\r\n\
         --{boundary}--\r\n"
    );
    let resp = app()
        .oneshot(multipart_request(boundary, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_a_file_is_rejected() {
    let boundary = "testboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"description\"\r\n\r\n\
         a text field\r\n\
         --{boundary}--\r\n"
    );
    let resp = app()
        .oneshot(multipart_request(boundary, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_without_a_plain_field_is_rejected() {
    let boundary = "testboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"submitted\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         file payload\r\n\
         --{boundary}--\r\n"
    );
    let resp = app()
        .oneshot(multipart_request(boundary, body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
