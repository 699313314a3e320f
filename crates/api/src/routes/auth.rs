use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use launchpad_accounts::{
    BootstrapOutcome, ProviderCatalog, ProviderDescriptor, ProviderType, PublicAccount,
    RegistrationRequest,
};
use launchpad_auth::{AuthSession, OAuthProvider};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::{util::require_bearer, ApiError, AppState};

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl From<RegisterRequest> for RegistrationRequest {
    fn from(value: RegisterRequest) -> Self {
        RegistrationRequest::new(value.name, value.email, value.password)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<PublicAccount> for AccountResponse {
    fn from(value: PublicAccount) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub account: AccountResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignupSession {
    Established {
        token: String,
        expires_at: String,
        redirect_to: String,
    },
    SignInRequired {
        redirect_to: String,
        message: String,
    },
}

impl From<BootstrapOutcome<AuthSession>> for SignupSession {
    fn from(outcome: BootstrapOutcome<AuthSession>) -> Self {
        match outcome {
            BootstrapOutcome::Established {
                session,
                redirect_to,
            } => Self::Established {
                token: session.token,
                expires_at: session.expires_at.to_rfc3339(),
                redirect_to,
            },
            BootstrapOutcome::SignInRequired {
                redirect_to,
                message,
            } => Self::SignInRequired {
                redirect_to,
                message,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub account: AccountResponse,
    pub session: SignupSession,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub account: AccountResponse,
    pub expires_at: String,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            account: session.account.into(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentSessionResponse {
    pub account: AccountResponse,
    pub expires_at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderResponse {
    pub id: String,
    pub name: String,
    /// `credentials` or `oauth`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<ProviderDescriptor> for ProviderResponse {
    fn from(value: ProviderDescriptor) -> Self {
        let kind = match value.kind {
            ProviderType::Credentials => "credentials",
            ProviderType::OAuth => "oauth",
            ProviderType::Unsupported => "unsupported",
        };
        Self {
            id: value.id,
            name: value.name,
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OAuthLoginResponse {
    pub authorize_url: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OAuthLoginQuery {
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OAuthCallbackRequest {
    pub code: String,
    pub state: String,
    pub redirect_uri: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid registration data", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse),
        (status = 500, description = "Registration failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(payload) = payload?;
    let account = state.registration().register(payload.into()).await?;

    Ok(Json(RegisterResponse {
        account: account.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created; session established or manual sign-in required", body = SignupResponse),
        (status = 400, description = "Invalid registration data", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse),
        (status = 500, description = "Registration failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>, ApiError> {
    let Json(payload) = payload?;
    let outcome = state.signup().submit(payload.into()).await?;

    if !outcome.session.is_established() {
        warn!(account = %outcome.account.id, "signup finished without a session");
    }

    Ok(Json(SignupResponse {
        account: outcome.account.into(),
        session: outcome.session.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(payload) = payload?;
    let session = state
        .authenticator()
        .login_with_password(&payload.email, &payload.password)
        .await?;

    Ok(Json(session.into()))
}

#[utoipa::path(
    get,
    path = "/api/auth/providers",
    tag = "Auth",
    responses(
        (status = 200, description = "Configured sign-in methods keyed by provider id", body = BTreeMap<String, ProviderResponse>)
    )
)]
pub async fn providers(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, ProviderResponse>>, ApiError> {
    let providers = state
        .authenticator()
        .providers()
        .await
        .map_err(|error| ApiError::internal_server_error(error.to_string()))?;

    Ok(Json(
        providers
            .into_iter()
            .map(|(id, descriptor)| (id, descriptor.into()))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Account behind the bearer token", body = CurrentSessionResponse),
        (status = 401, description = "Missing, invalid or expired session", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CurrentSessionResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let session = state.authenticate(&token).await?;

    Ok(Json(CurrentSessionResponse {
        account: session.account.into(),
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing, invalid or expired session", body = crate::error::ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    state.authenticator().revoke_session(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/oauth/{provider}/login",
    tag = "Auth",
    params(
        ("provider" = String, Path, description = "OAuth provider id, e.g. github"),
        OAuthLoginQuery
    ),
    responses(
        (status = 200, description = "OAuth authorization URL", body = OAuthLoginResponse),
        (status = 404, description = "Unknown provider", body = crate::error::ErrorResponse),
        (status = 503, description = "Provider not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn oauth_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthLoginQuery>,
) -> Result<Json<OAuthLoginResponse>, ApiError> {
    let provider: OAuthProvider = provider.parse()?;

    state.authenticator().ensure_oauth_enabled(provider)?;

    let oauth_state = state
        .oauth_state()
        .issue(provider, &params.redirect_uri)
        .await;
    let authorize_url = state.authenticator().oauth_authorization_url(
        provider,
        &oauth_state,
        &params.redirect_uri,
    )?;

    Ok(Json(OAuthLoginResponse { authorize_url }))
}

#[utoipa::path(
    post,
    path = "/api/auth/oauth/{provider}/callback",
    tag = "Auth",
    params(("provider" = String, Path, description = "OAuth provider id, e.g. github")),
    request_body = OAuthCallbackRequest,
    responses(
        (status = 200, description = "OAuth sign-in succeeded", body = SessionResponse),
        (status = 400, description = "Invalid or expired OAuth state", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication failed", body = crate::error::ErrorResponse),
        (status = 502, description = "Provider exchange failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Provider not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    payload: Result<Json<OAuthCallbackRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let provider: OAuthProvider = provider.parse()?;
    let Json(payload) = payload?;

    if !state
        .oauth_state()
        .consume(&payload.state, provider, &payload.redirect_uri)
        .await
    {
        return Err(ApiError::bad_request("invalid or expired OAuth state"));
    }

    let session = state
        .authenticator()
        .login_with_oauth_code(provider, &payload.code, &payload.redirect_uri)
        .await?;

    Ok(Json(session.into()))
}
