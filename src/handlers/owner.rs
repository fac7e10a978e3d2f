use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::{AppJson, parse_id, trimmed};
use crate::models::{NewOwner, Owner, OwnerChanges, OwnerStatus};
use crate::repositories::owner::OWNER_IDENTIFICATION_CONSTRAINT;
use crate::repositories::venue::VENUE_OWNER_CONSTRAINT;
use crate::services::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOwnerRequest {
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 100))]
    pub first_name: String,
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 100))]
    pub last_name: String,
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 50))]
    pub identification: String,
    #[garde(email)]
    pub email: Option<String>,
    #[garde(length(chars, min = 1, max = 30))]
    pub phone: Option<String>,
    #[garde(skip)]
    pub status: Option<OwnerStatus>,
}

impl CreateOwnerRequest {
    /// トリム・小文字化してから検証
    fn into_new_owner(self) -> Result<NewOwner, AppError> {
        let request = Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            identification: self.identification.trim().to_string(),
            email: trimmed(self.email).map(|email| email.to_lowercase()),
            phone: trimmed(self.phone),
            status: self.status,
        };
        request.validate()?;

        Ok(NewOwner {
            first_name: request.first_name,
            last_name: request.last_name,
            identification: request.identification,
            email: request.email,
            phone: request.phone,
            status: request.status.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOwnerRequest {
    #[garde(length(chars, min = 1, max = 100))]
    pub first_name: Option<String>,
    #[garde(length(chars, min = 1, max = 100))]
    pub last_name: Option<String>,
    #[garde(length(chars, min = 1, max = 50))]
    pub identification: Option<String>,
    #[garde(email)]
    pub email: Option<String>,
    #[garde(length(chars, min = 1, max = 30))]
    pub phone: Option<String>,
    #[garde(skip)]
    pub status: Option<OwnerStatus>,
}

impl UpdateOwnerRequest {
    fn into_changes(self) -> Result<OwnerChanges, AppError> {
        let request = Self {
            first_name: self.first_name.map(|v| v.trim().to_string()),
            last_name: self.last_name.map(|v| v.trim().to_string()),
            identification: self.identification.map(|v| v.trim().to_string()),
            email: trimmed(self.email).map(|email| email.to_lowercase()),
            phone: trimmed(self.phone),
            status: self.status,
        };
        request.validate()?;

        let changes = OwnerChanges {
            first_name: request.first_name,
            last_name: request.last_name,
            identification: request.identification,
            email: request.email,
            phone: request.phone,
            status: request.status,
        };
        if changes.is_empty() {
            return Err(AppError::Validation("更新する項目がありません".to_string()));
        }
        Ok(changes)
    }
}

#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub identification: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: OwnerStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Owner> for OwnerResponse {
    fn from(owner: Owner) -> Self {
        Self {
            display_name: owner.display_name(),
            id: owner.id,
            first_name: owner.first_name,
            last_name: owner.last_name,
            identification: owner.identification,
            email: owner.email,
            phone: owner.phone,
            status: owner.status,
            created_at: owner.created_at,
            updated_at: owner.updated_at,
        }
    }
}

/// identification の重複を Conflict に変換
fn map_identification_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.constraint() == Some(OWNER_IDENTIFICATION_CONSTRAINT)
    {
        return AppError::Conflict("この本人確認番号は既に登録されています".to_string());
    }
    AppError::Database(e)
}

/// GET /api/owners
pub async fn list_owners(
    State(state): State<AppState>,
) -> Result<Json<Vec<OwnerResponse>>, AppError> {
    let owners = state.owner_repo.list().await?;
    Ok(Json(owners.into_iter().map(OwnerResponse::from).collect()))
}

/// POST /api/owners
pub async fn create_owner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(request): AppJson<CreateOwnerRequest>,
) -> Result<(StatusCode, Json<OwnerResponse>), AppError> {
    let new_owner = request.into_new_owner()?;

    let owner = state
        .owner_repo
        .create(&new_owner)
        .await
        .map_err(map_identification_conflict)?;

    tracing::info!(owner_id = %owner.id, by = %claims.session.sub, "オーナー登録");

    Ok((StatusCode::CREATED, Json(owner.into())))
}

/// GET /api/owners/{id}
pub async fn get_owner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OwnerResponse>, AppError> {
    let id = parse_id(&id)?;
    let owner = state
        .owner_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("オーナー"))?;
    Ok(Json(owner.into()))
}

/// PATCH /api/owners/{id}
pub async fn update_owner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateOwnerRequest>,
) -> Result<Json<OwnerResponse>, AppError> {
    let id = parse_id(&id)?;
    let changes = request.into_changes()?;

    let owner = state
        .owner_repo
        .update(id, &changes)
        .await
        .map_err(map_identification_conflict)?
        .ok_or(AppError::NotFound("オーナー"))?;

    tracing::info!(owner_id = %owner.id, by = %claims.session.sub, "オーナー更新");

    Ok(Json(owner.into()))
}

/// DELETE /api/owners/{id}
///
/// 会場が紐付いているオーナーは削除できない（Conflict）
pub async fn delete_owner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<OwnerResponse>, AppError> {
    let id = parse_id(&id)?;

    let owner = state
        .owner_repo
        .delete(id)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some(VENUE_OWNER_CONSTRAINT)
            {
                return AppError::Conflict(
                    "会場が登録されているオーナーは削除できません".to_string(),
                );
            }
            AppError::Database(e)
        })?
        .ok_or(AppError::NotFound("オーナー"))?;

    tracing::info!(owner_id = %owner.id, by = %claims.session.sub, "オーナー削除");

    Ok(Json(owner.into()))
}
