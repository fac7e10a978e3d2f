use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::{AppJson, parse_id, trimmed};
use crate::models::venue::{build_slug, normalize_string_list};
use crate::models::{Address, NewVenue, Venue, VenueFilter, VenueStatus};
use crate::repositories::venue::VENUE_OWNER_CONSTRAINT;
use crate::services::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVenueRequest {
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 140))]
    pub name: String,
    /// 未指定なら name から生成
    #[garde(skip)]
    pub slug: Option<String>,
    /// 大文字小文字を区別しない
    #[garde(skip)]
    pub status: Option<String>,
    #[garde(range(min = 0))]
    pub stances: Option<i32>,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub owner_id: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub cover_image_url: String,
    #[serde(default)]
    #[garde(skip)]
    pub image_urls: Vec<String>,
    #[garde(length(chars, max = 5000))]
    pub description: Option<String>,
    #[garde(skip)]
    pub address: Option<Address>,
    #[serde(default)]
    #[garde(skip)]
    pub tags: Vec<String>,
}

impl CreateVenueRequest {
    fn into_new_venue(self) -> Result<NewVenue, AppError> {
        let request = Self {
            name: self.name.trim().to_string(),
            owner_id: self.owner_id.trim().to_string(),
            cover_image_url: self.cover_image_url.trim().to_string(),
            description: trimmed(self.description),
            ..self
        };
        request.validate()?;

        let slug = build_slug(request.slug.as_deref().unwrap_or(&request.name));
        if slug.is_empty() {
            return Err(AppError::Validation(
                "slug を生成できません（英数字を含めてください）".to_string(),
            ));
        }

        let owner_id = Uuid::parse_str(&request.owner_id)
            .map_err(|_| AppError::Validation("owner_id が不正です".to_string()))?;

        let status = match request.status.as_deref() {
            Some(value) => VenueStatus::parse(value).map_err(AppError::Validation)?,
            None => None,
        };

        Ok(NewVenue {
            name: request.name,
            slug,
            status: status.unwrap_or_default(),
            stances: request.stances.unwrap_or(0),
            owner_id,
            cover_image_url: request.cover_image_url,
            image_urls: normalize_string_list(request.image_urls, "image_urls")
                .map_err(AppError::Validation)?,
            description: request.description,
            address: request.address.and_then(Address::normalized),
            tags: normalize_string_list(request.tags, "tags").map_err(AppError::Validation)?,
        })
    }
}

/// 一覧の検索条件（すべて任意）
#[derive(Debug, Default, Deserialize)]
pub struct VenueListQuery {
    pub status: Option<String>,
    pub owner_id: Option<String>,
    pub search: Option<String>,
}

impl VenueListQuery {
    fn into_filter(self) -> Result<VenueFilter, AppError> {
        let status = match self.status.as_deref() {
            Some(value) => VenueStatus::parse(value).map_err(AppError::Validation)?,
            None => None,
        };
        let owner_id = trimmed(self.owner_id)
            .map(|id| {
                Uuid::parse_str(&id)
                    .map_err(|_| AppError::Validation("owner_id が不正です".to_string()))
            })
            .transpose()?;

        Ok(VenueFilter {
            status,
            owner_id,
            search: trimmed(self.search),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct VenueResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: VenueStatus,
    pub stances: i32,
    pub owner_id: Uuid,
    pub cover_image_url: String,
    pub image_urls: Vec<String>,
    /// カバー画像 + ギャラリー
    pub images: Vec<String>,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Venue> for VenueResponse {
    fn from(venue: Venue) -> Self {
        Self {
            images: venue.images(),
            id: venue.id,
            name: venue.name,
            slug: venue.slug,
            status: venue.status,
            stances: venue.stances,
            owner_id: venue.owner_id,
            cover_image_url: venue.cover_image_url,
            image_urls: venue.image_urls,
            description: venue.description,
            address: venue.address.map(|address| address.0),
            tags: venue.tags,
            created_at: venue.created_at,
            updated_at: venue.updated_at,
        }
    }
}

/// GET /api/venues?status=&owner_id=&search=
pub async fn list_venues(
    State(state): State<AppState>,
    Query(query): Query<VenueListQuery>,
) -> Result<Json<Vec<VenueResponse>>, AppError> {
    let filter = query.into_filter()?;
    let venues = state.venue_repo.list(&filter).await?;
    Ok(Json(venues.into_iter().map(VenueResponse::from).collect()))
}

/// POST /api/venues
///
/// 存在しない owner_id は ValidationError
pub async fn create_venue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(request): AppJson<CreateVenueRequest>,
) -> Result<(StatusCode, Json<VenueResponse>), AppError> {
    let new_venue = request.into_new_venue()?;

    let venue = state
        .venue_repo
        .create(&new_venue)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some(VENUE_OWNER_CONSTRAINT)
            {
                return AppError::Validation("指定されたオーナーは存在しません".to_string());
            }
            AppError::Database(e)
        })?;

    tracing::info!(venue_id = %venue.id, slug = %venue.slug, by = %claims.session.sub, "会場登録");

    Ok((StatusCode::CREATED, Json(venue.into())))
}

/// GET /api/venues/{id}
pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VenueResponse>, AppError> {
    let id = parse_id(&id)?;
    let venue = state
        .venue_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("会場"))?;
    Ok(Json(venue.into()))
}

/// DELETE /api/venues/{id}
pub async fn delete_venue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<VenueResponse>, AppError> {
    let id = parse_id(&id)?;
    let venue = state
        .venue_repo
        .delete(id)
        .await?
        .ok_or(AppError::NotFound("会場"))?;

    tracing::info!(venue_id = %venue.id, by = %claims.session.sub, "会場削除");

    Ok(Json(venue.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json as SqlJson;

    fn create_request() -> CreateVenueRequest {
        serde_json::from_value(serde_json::json!({
            "name": "  Casa del Mar ",
            "status": "Maintenance",
            "owner_id": Uuid::new_v4().to_string(),
            "cover_image_url": "https://img.example.com/cover.jpg",
            "image_urls": [" https://img.example.com/1.jpg ", "https://img.example.com/1.jpg"],
            "address": { "city": " Lima ", "line1": "  " },
            "tags": ["beach", " pool ", "beach"]
        }))
        .expect("deserialize")
    }

    #[test]
    fn test_create_request_is_normalized() {
        let venue = create_request().into_new_venue().expect("valid");
        assert_eq!(venue.name, "Casa del Mar");
        assert_eq!(venue.slug, "casa-del-mar");
        assert_eq!(venue.status, VenueStatus::Maintenance);
        assert_eq!(venue.stances, 0);
        assert_eq!(venue.image_urls, vec!["https://img.example.com/1.jpg"]);
        assert_eq!(venue.tags, vec!["beach", "pool"]);
        let address = venue.address.expect("address");
        assert_eq!(address.city.as_deref(), Some("Lima"));
        assert_eq!(address.line1, None);
    }

    #[test]
    fn test_explicit_slug_wins_and_empty_address_is_dropped() {
        let mut request = create_request();
        request.slug = Some("Ocean View 2".to_string());
        request.address = Some(Address::default());
        let venue = request.into_new_venue().expect("valid");
        assert_eq!(venue.slug, "ocean-view-2");
        assert!(venue.address.is_none());
    }

    #[test]
    fn test_create_request_rejections() {
        let mut request = create_request();
        request.stances = Some(-1);
        assert!(matches!(request.into_new_venue(), Err(AppError::Validation(_))));

        let mut request = create_request();
        request.status = Some("closed".to_string());
        assert!(matches!(request.into_new_venue(), Err(AppError::Validation(_))));

        let mut request = create_request();
        request.owner_id = "not-a-uuid".to_string();
        assert!(matches!(request.into_new_venue(), Err(AppError::Validation(_))));

        let mut request = create_request();
        request.tags = vec!["ok".to_string(), " ".to_string()];
        assert!(matches!(request.into_new_venue(), Err(AppError::Validation(_))));

        let mut request = create_request();
        request.name = "x".repeat(141);
        assert!(request.into_new_venue().is_err());

        let mut request = create_request();
        request.cover_image_url = "  ".to_string();
        assert!(request.into_new_venue().is_err());
    }

    #[test]
    fn test_list_query_into_filter() {
        let owner_id = Uuid::new_v4();
        let query = VenueListQuery {
            status: Some("AVAILABLE".to_string()),
            owner_id: Some(owner_id.to_string()),
            search: Some("  beach ".to_string()),
        };
        let filter = query.into_filter().expect("valid");
        assert_eq!(filter.status, Some(VenueStatus::Available));
        assert_eq!(filter.owner_id, Some(owner_id));
        assert_eq!(filter.search.as_deref(), Some("beach"));

        let filter = VenueListQuery::default().into_filter().expect("valid");
        assert!(filter.status.is_none() && filter.owner_id.is_none() && filter.search.is_none());

        let query = VenueListQuery {
            owner_id: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());
    }

    #[test]
    fn test_response_includes_images() {
        let now = OffsetDateTime::now_utc();
        let venue = Venue {
            id: Uuid::new_v4(),
            name: "Casa".to_string(),
            slug: "casa".to_string(),
            status: VenueStatus::Available,
            stances: 3,
            owner_id: Uuid::new_v4(),
            cover_image_url: "cover.jpg".to_string(),
            image_urls: vec!["a.jpg".to_string(), "cover.jpg".to_string()],
            description: None,
            address: Some(SqlJson(Address {
                city: Some("Lima".to_string()),
                ..Default::default()
            })),
            tags: vec![],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(VenueResponse::from(venue)).expect("serialize");
        assert_eq!(json["images"], serde_json::json!(["cover.jpg", "a.jpg"]));
        assert_eq!(json["address"], serde_json::json!({ "city": "Lima" }));
        assert_eq!(json["status"], "available");
    }
}
