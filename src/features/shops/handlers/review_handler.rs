use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::shops::dtos::CreateReviewDto;
use crate::features::shops::models::ReviewWithAuthor;
use crate::features::shops::services::ShopService;
use crate::shared::types::ApiResponse;

/// Review a shop. Each user may review a shop once.
#[utoipa::path(
    post,
    path = "/api/shops/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Shop ID")
    ),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<ReviewWithAuthor>),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Shop not found"),
        (status = 409, description = "Shop already reviewed by this user")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn create_review(
    user: AuthenticatedUser,
    State(service): State<Arc<ShopService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewWithAuthor>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let review = service
        .create_review(user.user_id, id, dto.rating, dto.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(review),
            Some("Review created successfully".to_string()),
            None,
        )),
    ))
}
