use crate::dtos::fruit::{fruit_list, FruitResponse, UpdateFruitRequest};
use crate::dtos::MessageResponse;
use crate::models::{Fruit, FruitStatus, Grade};
use crate::services::storage::{image_key, key_from_url, public_url};
use crate::services::{metrics, FruitFilter, FruitOrder, GradingError};
use crate::startup::AppState;
use crate::utils::{parse_client_date, FruitForm, ImageUpload, JsonBody};
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use service_core::error::AppError;
use service_core::observability::extract_request_id;

const ALL_FIELDS_REQUIRED: &str = "All fields are required";
const POSITIVE_VALUES: &str = "Price and quantity must be positive values";

fn required_image(form: &mut FruitForm) -> Result<ImageUpload, AppError> {
    let image = form
        .image
        .take()
        .ok_or_else(|| AppError::bad_request("No image uploaded"))?;
    image.ensure_image()?;
    Ok(image)
}

/// Store the image and return its public URL.
async fn store_image(state: &AppState, image: &ImageUpload) -> Result<String, AppError> {
    let key = image_key(&image.extension());
    state
        .storage
        .upload(&key, image.data.clone())
        .await
        .map_err(|e| {
            tracing::error!("Failed to store image {}: {}", key, e);
            e
        })?;
    Ok(public_url(&key))
}

async fn load_fruit(state: &AppState, id: &str) -> Result<Fruit, AppError> {
    state
        .store
        .get_fruit(id)
        .await?
        .ok_or_else(|| AppError::not_found("Fruit not found"))
}

async fn list(
    state: &AppState,
    filter: FruitFilter,
    order: FruitOrder,
) -> Result<Json<Vec<FruitResponse>>, AppError> {
    let fruits = state.store.list_fruits(&filter, order).await?;
    Ok(Json(fruit_list(fruits)))
}

#[tracing::instrument(skip(state, headers, multipart))]
pub async fn upload_fruit(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FruitForm::from_multipart(multipart).await?;
    let image = required_image(&mut form)?;

    // Name and collector are optional here; only manual entry insists on them
    let name = form.text("name").unwrap_or_default();
    let collector_id = form.text("collectorId").unwrap_or_default();

    let image_url = store_image(&state, &image).await?;
    let request_id = extract_request_id(&headers);

    let report = match state.grader.grade(&image, request_id.as_deref()).await {
        Ok(report) => report,
        Err(GradingError::NotAFruit(message)) => {
            tracing::info!(image_url = %image_url, reason = %message, "Grading service rejected a non-fruit image");
            metrics::record_grading_failure("not_a_fruit");
            return Err(AppError::Rejected(
                message,
                json!({ "isNonFruit": true, "imageUrl": image_url }),
            ));
        }
        Err(e @ GradingError::Unavailable(_)) => {
            tracing::error!(error = %e, "Grading service unavailable");
            metrics::record_grading_failure("unavailable");
            let body = json!({ "error": "Failed to process fruit", "message": e.to_string() });
            return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
        }
        Err(e @ GradingError::InvalidResponse(_)) => {
            tracing::error!(error = %e, "Grading service sent an unusable answer");
            metrics::record_grading_failure("invalid_response");
            return Err(AppError::BadGateway(e.to_string()));
        }
    };

    let fruit = Fruit::graded(
        name,
        form.text("variety"),
        collector_id,
        image_url,
        report.grade,
        report.scores,
    );
    state.store.insert_fruit(&fruit).await?;

    metrics::record_fruit_graded(fruit.grade.as_str(), fruit.status.as_str());
    tracing::info!(
        fruit_id = %fruit.id,
        grade = %fruit.grade,
        status = %fruit.status,
        "Fruit graded"
    );

    Ok((StatusCode::CREATED, Json(FruitResponse::from(fruit))).into_response())
}

#[tracing::instrument(skip(state, multipart))]
pub async fn add_manual_fruit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = FruitForm::from_multipart(multipart).await?;
    let image = required_image(&mut form)?;

    let (Some(name), Some(grade), Some(price), Some(quantity), Some(collector_id)) = (
        form.text("name"),
        form.text("grade"),
        form.text("price"),
        form.text("quantity"),
        form.text("collectorId"),
    ) else {
        return Err(AppError::bad_request(ALL_FIELDS_REQUIRED));
    };

    let grade = grade
        .parse::<Grade>()
        .ok()
        .filter(Grade::is_marketable)
        .ok_or_else(|| {
            AppError::bad_request("Only grades A, B, and C are allowed for manual addition")
        })?;

    let price = price.parse::<f64>().ok().filter(|p| p.is_finite() && *p > 0.0);
    let quantity = quantity.parse::<i64>().ok().filter(|q| *q > 0);
    let (Some(price), Some(quantity)) = (price, quantity) else {
        return Err(AppError::bad_request(POSITIVE_VALUES));
    };

    let expiry_date = match form.text("expiryDate") {
        Some(raw) => {
            let expiry = parse_client_date(&raw)
                .ok_or_else(|| AppError::bad_request("Invalid expiry date"))?;
            if expiry <= Utc::now() {
                return Err(AppError::bad_request("Expiry date must be in the future"));
            }
            Some(expiry)
        }
        None => None,
    };

    let image_url = store_image(&state, &image).await?;
    let fruit = Fruit::manual(
        name,
        collector_id,
        image_url,
        grade,
        price,
        quantity,
        expiry_date,
    );
    state.store.insert_fruit(&fruit).await?;

    tracing::info!(fruit_id = %fruit.id, grade = %fruit.grade, quantity, "Fruit added manually");

    Ok((StatusCode::CREATED, Json(FruitResponse::from(fruit))))
}

pub async fn list_fruits(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list(&state, FruitFilter::default(), FruitOrder::NewestFirst).await
}

pub async fn fruits_by_grade(
    State(state): State<AppState>,
    Path(grade): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let grade: Grade = grade.parse().map_err(AppError::bad_request)?;
    list(&state, FruitFilter::grade(grade), FruitOrder::NewestFirst).await
}

pub async fn fruits_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let status: FruitStatus = status.parse().map_err(AppError::bad_request)?;
    list(&state, FruitFilter::status(status), FruitOrder::NewestFirst).await
}

pub async fn quality_fruits(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let filter = FruitFilter {
        grades: Some(Grade::MARKETABLE.to_vec()),
        ..Default::default()
    };
    list(&state, filter, FruitOrder::NewestFirst).await
}

pub async fn available_fruits(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let filter = FruitFilter {
        grades: Some(Grade::MARKETABLE.to_vec()),
        status: Some(FruitStatus::Available),
        in_stock: true,
    };
    list(&state, filter, FruitOrder::GradeAsc).await
}

pub async fn get_fruit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let fruit = load_fruit(&state, &id).await?;
    Ok(Json(FruitResponse::from(fruit)))
}

#[tracing::instrument(skip(state, req))]
pub async fn update_fruit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateFruitRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.price.is_some_and(|p| p < 0.0) || req.quantity.is_some_and(|q| q < 0) {
        return Err(AppError::bad_request(POSITIVE_VALUES));
    }

    let mut fruit = load_fruit(&state, &id).await?;

    if let Some(price) = req.price {
        fruit.price = price;
    }
    if let Some(quantity) = req.quantity {
        fruit.quantity = quantity;
    }
    if let Some(status) = req.status {
        fruit.status = status;
    }
    match req.expiry_date {
        Some(Some(raw)) => {
            fruit.expiry_date = Some(
                parse_client_date(&raw)
                    .ok_or_else(|| AppError::bad_request("Invalid expiry date"))?,
            );
        }
        Some(None) => fruit.expiry_date = None,
        None => {}
    }

    if !state.store.replace_fruit(&fruit).await? {
        return Err(AppError::not_found("Fruit not found"));
    }

    tracing::info!(fruit_id = %fruit.id, price = fruit.price, quantity = fruit.quantity, "Fruit updated");

    Ok(Json(FruitResponse::from(fruit)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_fruit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let fruit = load_fruit(&state, &id).await?;

    if let Some(key) = fruit.image_url.as_deref().and_then(key_from_url) {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(fruit_id = %fruit.id, error = %e, "Failed to delete fruit image");
        }
    }

    if !state.store.delete_fruit(&fruit.id).await? {
        return Err(AppError::not_found("Fruit not found"));
    }

    tracing::info!(fruit_id = %fruit.id, "Fruit deleted");

    Ok(Json(MessageResponse::new("Fruit deleted successfully")))
}
