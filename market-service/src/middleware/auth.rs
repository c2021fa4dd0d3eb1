use crate::models::Role;
use crate::services::Claims;
use crate::startup::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized(anyhow::anyhow!(message.to_string()))
}

/// Require a valid bearer token and expose its claims to handlers.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized("Authentication required"))?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        unauthorized("Invalid token")
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Let the request through only when the authenticated role is in `allowed`.
/// Must run after `authenticate`.
pub async fn authorize(allowed: &[Role], req: Request, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| unauthorized("Authentication required"))?;

    if !allowed.contains(&claims.role) {
        tracing::warn!(user_id = %claims.sub, role = %claims.role, "Insufficient permissions");
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Insufficient permissions"
        )));
    }

    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    authorize(&[Role::Admin], req, next).await
}

/// Claims of the authenticated caller.
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| unauthorized("Authentication required"))?;

        Ok(AuthUser(claims.clone()))
    }
}
