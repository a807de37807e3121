use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use crate::errors::ApiError;
use crate::state::{AppState, CookieSettings};

/// Username of the authenticated caller.
///
/// Read from the session cookie, falling back to `Authorization: Bearer`.
/// Missing or invalid credentials reject with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub String);

#[async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&state.cookie.name)
            .map(|c| c.value().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .map(str::to_string)
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(ApiError::unauthorized)?;

        match state.auth.resolve_caller(&token) {
            Ok(username) => Ok(CallerIdentity(username)),
            Err(e) => {
                warn!(path = %parts.uri.path(), err = %e, "session token rejected");
                Err(ApiError::unauthorized())
            }
        }
    }
}

pub fn session_cookie(settings: &CookieSettings, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(settings.name.clone(), token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(settings.secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn cleared_cookie(settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::from(settings.name.clone());
    cookie.set_path("/");
    cookie
}
