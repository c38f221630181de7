use axum::{
    extract::{DefaultBodyLimit, FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, SignupRequest, StatusResponse, UpdateProfileRequest},
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::{is_unique_violation, ApiError},
    media::store_image,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/update-profile", put(update_profile))
        .route("/auth/check", get(check_auth))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB, base64 avatars
}

const MIN_PASSWORD_LEN: usize = 6;

/// Collects every violation so the client sees the full list at once.
fn validate_signup(payload: &SignupRequest) -> Vec<String> {
    let mut violations = Vec::new();
    if payload.full_name.is_empty() {
        violations.push("Name is required".to_string());
    }
    if payload.email.is_empty() {
        violations.push("Email is required".to_string());
    }
    if payload.password.is_empty() {
        violations.push("Password is required".to_string());
    } else if payload.password.chars().count() < MIN_PASSWORD_LEN {
        violations.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    violations
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<PublicUser>), ApiError> {
    let violations = validate_signup(&payload);
    if !violations.is_empty() {
        warn!(count = violations.len(), "signup rejected by validation");
        return Err(ApiError::Validation(violations));
    }

    // Advisory pre-check; the unique index on email is the real guard.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "signup for existing email");
        return Err(ApiError::Conflict("email already exists".into()));
    }

    let hash = hash_password(&payload.password)?;

    // The session token is minted before the insert; if the insert fails
    // the jar is dropped and no cookie reaches the client.
    let user_id = Uuid::new_v4();
    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user_id)?;
    let jar = jar.add(keys.session_cookie(token));

    let user = match User::create(
        &state.db,
        user_id,
        &payload.full_name,
        &payload.email,
        &hash,
    )
    .await
    {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "signup lost the unique race");
            return Err(ApiError::Conflict("email already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(PublicUser {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            profile_pic: user.profile_pic,
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<PublicUser>), ApiError> {
    // Unknown email and wrong password answer identically.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login for unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let jar = jar.add(keys.session_cookie(token));

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar,
        Json(PublicUser {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            profile_pic: user.profile_pic,
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<StatusResponse>) {
    let keys = JwtKeys::from_ref(&state);
    info!("user logged out");
    (
        jar.add(keys.clear_cookie()),
        Json(StatusResponse {
            message: "logged out successfully".into(),
        }),
    )
}

#[instrument(skip(state, user, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let data = match payload.profile_pic.as_deref().filter(|s| !s.is_empty()) {
        Some(data) => data,
        None => {
            warn!(user_id = %user.id, "profile update without a picture");
            return Err(ApiError::Validation(vec!["Profile pic is required".into()]));
        }
    };

    let url = store_image(state.media.as_ref(), "avatars", user.id, data).await?;
    let user = User::update_profile_pic(&state.db, user.id, &url).await?;

    info!(user_id = %user.id, profile_pic = %user.profile_pic, "profile picture updated");
    Ok(Json(user))
}

#[instrument(skip(user))]
pub async fn check_auth(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
