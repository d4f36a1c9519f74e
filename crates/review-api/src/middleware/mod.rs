//! API 서버용 HTTP middleware.
//!
//! 인증/인가 미들웨어는 [`crate::auth`]에 있습니다.

mod metrics;

pub use metrics::metrics_layer;
