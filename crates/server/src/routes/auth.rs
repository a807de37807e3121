use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use models::user::USERNAME_MIN_LEN;
use service::auth::domain::Credentials;
use service::auth::service::PASSWORD_MIN_LEN;

use crate::auth::{cleared_cookie, session_cookie};
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mode: AuthMode,
}

/// Sign up or log in, depending on `mode`. Sets the session cookie and
/// returns the caller's public view.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<AuthRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let username = models::user::normalize_username(&input.username);
    if username.is_empty() || input.password.is_empty() {
        return Err(ApiError::bad_request("fieldsRequired", "Username and password are required."));
    }

    let creds = Credentials { username, password: input.password };
    let session = match input.mode {
        AuthMode::Signup => {
            if creds.username.chars().count() < USERNAME_MIN_LEN {
                return Err(ApiError::bad_request(
                    "usernameMinLength",
                    format!("Username must be at least {USERNAME_MIN_LEN} characters."),
                ));
            }
            if creds.password.chars().count() < PASSWORD_MIN_LEN {
                return Err(ApiError::bad_request(
                    "passwordMinLength",
                    format!("Password must be at least {PASSWORD_MIN_LEN} characters."),
                ));
            }
            state.auth.register(creds).await?
        }
        AuthMode::Login => state.auth.login(creds).await?,
    };

    let user = state.ledger.get_public_user(&session.user.username).await.map_err(ApiError::account)?;
    let jar = jar.add(session_cookie(&state.cookie, session.token));
    Ok((jar, Json(json!({ "user": user }))))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(cleared_cookie(&state.cookie));
    (jar, Json(json!({ "ok": true })))
}
