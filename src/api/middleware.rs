//! 请求ID / 追踪ID 与访问日志中间件

use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Level;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 为每个请求分配 request id 与 trace id（客户端传入的 trace id 优先）
pub async fn set_request_id(mut req: Request, next: Next) -> Response {
    let req_id = Uuid::new_v4().to_string();
    let trace_id = header_value(&req, TRACE_ID_HEADER).unwrap_or_else(|| req_id.clone());

    let req_id_value =
        HeaderValue::from_str(&req_id).unwrap_or(HeaderValue::from_static("gen-failed"));
    let trace_id_value =
        HeaderValue::from_str(&trace_id).unwrap_or(HeaderValue::from_static("gen-failed"));

    req.headers_mut()
        .insert(REQUEST_ID_HEADER, req_id_value.clone());
    req.headers_mut()
        .insert(TRACE_ID_HEADER, trace_id_value.clone());

    let mut resp = next.run(req).await;
    resp.headers_mut().insert(REQUEST_ID_HEADER, req_id_value);
    resp.headers_mut().insert(TRACE_ID_HEADER, trace_id_value);
    resp
}

pub async fn trace_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let req_id = header_value(&req, REQUEST_ID_HEADER).unwrap_or_else(|| "-".to_string());
    let resp = next.run(req).await;
    let status = resp.status();
    let elapsed = start.elapsed().as_millis();
    tracing::event!(Level::INFO, request_id=%req_id, method=%method, path=%path, status=%status.as_u16(), elapsed_ms=%elapsed, "http_request");
    resp
}
