use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Reuses the caller's `x-request-id` or assigns a fresh UUID, and echoes it
/// back on the response.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&REQUEST_ID)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(fresh_request_id);

    req.headers_mut()
        .insert(REQUEST_ID.clone(), request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID.clone(), request_id);
    response
}

fn fresh_request_id() -> HeaderValue {
    // A hyphenated UUID is always a valid header value
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}
