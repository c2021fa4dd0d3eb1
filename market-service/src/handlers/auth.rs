use crate::dtos::auth::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UserSummary};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::services::metrics;
use crate::startup::AppState;
use crate::utils::{hash_password, verify_password, Password, ValidatedJson};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

fn issue(state: &AppState, user: &User, message: &str) -> Result<AuthResponse, AppError> {
    let token = state
        .jwt
        .generate_token(user)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to issue token: {}", e)))?;
    Ok(AuthResponse {
        message: message.to_string(),
        user: UserSummary::from(user),
        token,
    })
}

#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("Name is required"));
    }

    if state.store.find_user_by_email(&req.email).await?.is_some() {
        return Err(AppError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&Password::new(req.password))?;
    let user = User::new(
        req.name,
        &req.email,
        password_hash,
        req.role.unwrap_or_default(),
    );

    // A concurrent registration can still win the unique index
    state.store.insert_user(&user).await.map_err(|e| match e {
        AppError::Conflict(_) => AppError::bad_request("User already exists"),
        other => other,
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    let body = issue(&state, &user, "User registered successfully")?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user) = state.store.find_user_by_email(&req.email).await? else {
        metrics::record_login("unknown_user");
        return Err(AppError::bad_request("Invalid credentials"));
    };

    if let Some(role) = req.role {
        if role != user.role {
            metrics::record_login("wrong_role");
            return Err(AppError::bad_request("Invalid role for this account"));
        }
    }

    if verify_password(&Password::new(req.password), &user.password_hash).is_err() {
        metrics::record_login("bad_password");
        return Err(AppError::bad_request("Invalid credentials"));
    }

    metrics::record_login("success");
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(issue(&state, &user, "Login successful")?))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.0.sub))]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user(&user.0.sub)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(ProfileResponse::from(user)))
}
