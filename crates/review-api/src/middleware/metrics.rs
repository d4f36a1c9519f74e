//! HTTP 요청 metrics middleware.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 메트릭 `path` 라벨.
///
/// 라우터가 매칭한 템플릿(`/api/pokemon/{id}`)을 우선 사용하고,
/// 매칭되지 않은 요청(401/403/404)은 정규화한 실제 경로를 씁니다.
fn path_label(request: &Request) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(request.uri().path()),
    }
}

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// - `http_requests_total`: 총 요청 수 (method, path 라벨)
/// - `http_responses_total`: 총 응답 수 (method, path, status 라벨)
/// - `http_request_duration_seconds`: 요청 처리 시간 히스토그램
///
/// 인증 레이어 바깥에 두어 거부된 요청도 집계합니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = path_label(&request);

    record_http_request(&method, &path);
    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}
