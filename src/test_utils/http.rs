use axum::{
    body::{Body, Bytes},
    http::StatusCode,
    response::Response,
};
use serde_json::Value;

#[track_caller]
pub(crate) fn assert_status(response: &Response<Body>, want: StatusCode) {
    assert_eq!(
        response.status(),
        want,
        "want status {want}, got {}",
        response.status()
    );
}

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    response
        .headers()
        .get(header_name)
        .unwrap_or_else(|| panic!("Headers missing {header_name}"))
        .to_str()
        .expect("Could not convert to str")
        .to_owned()
}

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}

pub(crate) async fn read_body(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body")
}

pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}
