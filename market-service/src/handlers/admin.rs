use crate::dtos::admin::{AdminStatsResponse, MarketStats};
use crate::dtos::MessageResponse;
use crate::middleware::AuthUser;
use crate::models::{FruitStatus, OrderStatus, Role};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

#[tracing::instrument(skip(state, user), fields(user_id = %user.0.sub))]
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let mut stats = MarketStats::default();

    for role in Role::ALL {
        let count = state.store.count_users_by_role(role).await?;
        stats.users.insert(role.to_string(), count);
    }
    for status in FruitStatus::ALL {
        let count = state.store.count_fruits_by_status(status).await?;
        stats.fruits.insert(status.to_string(), count);
    }
    for status in OrderStatus::ALL {
        let count = state.store.count_orders_by_status(status).await?;
        stats.orders.insert(status.to_string(), count);
    }

    stats.revenue = state
        .store
        .list_orders()
        .await?
        .iter()
        .filter(|order| order.status.counts_as_revenue())
        .map(|order| order.total)
        .sum();

    Ok(Json(AdminStatsResponse {
        message: "Admin stats accessed successfully".to_string(),
        stats,
    }))
}

pub async fn selected_stats(user: AuthUser) -> impl IntoResponse {
    tracing::debug!(user_id = %user.0.sub, "Selected admin stats accessed");
    Json(MessageResponse::new(
        "selected admin stats accessed successfully",
    ))
}
