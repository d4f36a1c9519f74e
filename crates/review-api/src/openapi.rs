//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    ComponentHealth, ComponentStatus, CredentialsRequest, HealthResponse, LoginResponse,
    MeResponse, RegisterResponse,
};

/// `bearer_auth` 보안 스킴 등록.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                Http::builder()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Review API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Review API",
        description = r#"
# Review API 인증

HS512 서명 토큰 기반 인증 API입니다.

## 인증

`POST /api/auth/login`으로 받은 토큰을 `Authorization: Bearer <token>` 헤더에 넣으세요.
토큰이 없거나 유효하지 않으면 보호된 경로는 401, 역할이 부족하면 403을 반환합니다.
"#
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 회원가입, 로그인, 호출자 정보")
    ),
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Auth =====
            CredentialsRequest,
            RegisterResponse,
            LoginResponse,
            MeResponse,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::me::me,
    ),
    modifiers(&BearerSecurity)
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
