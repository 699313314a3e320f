use axum::Json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::register,
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::providers,
        crate::routes::auth::current_session,
        crate::routes::auth::logout,
        crate::routes::auth::oauth_login,
        crate::routes::auth::oauth_callback
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::auth::RegisterRequest,
            crate::routes::auth::RegisterResponse,
            crate::routes::auth::AccountResponse,
            crate::routes::auth::SignupResponse,
            crate::routes::auth::SignupSession,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::SessionResponse,
            crate::routes::auth::CurrentSessionResponse,
            crate::routes::auth::ProviderResponse,
            crate::routes::auth::OAuthLoginResponse,
            crate::routes::auth::OAuthCallbackRequest
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Registration, sign-in and session management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        let mut http = Http::new(HttpAuthScheme::Bearer);
        http.bearer_format = Some("JWT".to_string());

        components
            .security_schemes
            .insert("bearerAuth".to_string(), SecurityScheme::Http(http));
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
