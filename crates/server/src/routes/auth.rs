use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

use models::user::Role;
use service::auth::domain::{Identity, LoginInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{verify_token, AuthConfig, AuthService};

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

/// Route-building and reporting knobs resolved once at startup.
#[derive(Clone)]
pub struct RoutingSettings {
    pub timezone: chrono_tz::Tz,
    pub origin: Option<String>,
    pub waypoint_limit: usize,
    pub waypoint_limit_mobile: usize,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub routing: RoutingSettings,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), (StatusCode, String)> {
    let repo = Arc::new(SeaOrmAuthRepository { db: state.db.clone() });
    let svc = AuthService::new(
        repo,
        AuthConfig { jwt_secret: Some(state.auth.jwt_secret.clone()), token_hours: 12 },
    );
    let session = svc.login(input).await.map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;
    let identity = session.identity;
    if let Some(token) = session.token {
        let mut cookie = Cookie::new("auth_token", token.clone());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(false);
        cookie.set_same_site(axum_extra::extract::cookie::SameSite::Lax);
        let jar = jar.add(cookie);
        let out = LoginOutput {
            user_id: identity.id,
            username: identity.username,
            role: identity.role,
            token,
        };
        return Ok((jar, Json(out)));
    }
    Err((StatusCode::INTERNAL_SERVER_ERROR, "token generation failed".into()))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::from("auth_token"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current identity"), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

/// Global middleware: everything except the whitelist needs a valid
/// session token, from `Authorization: Bearer` or the `auth_token`
/// cookie. The account is re-read on every request so role changes and
/// deletions take effect immediately; the resolved identity travels as a
/// request extension and is handed to core operations explicitly.
pub async fn require_identity(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if path == "/health"
        || path == "/auth/login"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || method == axum::http::Method::OPTIONS
    {
        return Ok(next.run(req).await);
    }

    let token = {
        let authz = req
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        if let Some(h) = authz {
            let prefix = "Bearer ";
            if !h.starts_with(prefix) {
                tracing::warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err((StatusCode::UNAUTHORIZED, "not authenticated".into()));
            }
            h[prefix.len()..].to_string()
        } else {
            let cookie_header = req
                .headers()
                .get(axum::http::header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");

            let mut token_val: Option<String> = None;
            for part in cookie_header.split(';') {
                let kv = part.trim();
                if let Some(rest) = kv.strip_prefix("auth_token=") {
                    token_val = Some(rest.to_string());
                    break;
                }
            }

            match token_val {
                Some(t) if !t.is_empty() => t,
                _ => {
                    return Err((StatusCode::UNAUTHORIZED, "not authenticated".into()));
                }
            }
        }
    };

    let claims = match verify_token(&token, &state.auth.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            return Err((StatusCode::UNAUTHORIZED, "not authenticated".into()));
        }
    };
    let uid = Uuid::parse_str(&claims.uid)
        .map_err(|_| (StatusCode::UNAUTHORIZED, "not authenticated".into()))?;
    let user = service::user_service::get_user(&state.db, uid)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "session user no longer exists".to_string()))?;

    let identity = Identity { id: user.id, username: user.username, role: user.role };
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
