use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::ConnectionManager;
use crate::models::{NewVenue, Venue, VenueFilter};

/// owner_id の外部キー制約名
pub const VENUE_OWNER_CONSTRAINT: &str = "venues_owner_id_fkey";

#[derive(Clone)]
pub struct VenueRepository {
    db: ConnectionManager,
}

impl VenueRepository {
    pub fn new(db: ConnectionManager) -> Self {
        Self { db }
    }

    /// 条件に合う会場を新しい順に取得
    ///
    /// `search` は name / description / tags の全文検索
    pub async fn list(&self, filter: &VenueFilter) -> Result<Vec<Venue>, sqlx::Error> {
        let pool = self.db.acquire().await?;

        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, name, slug, status, stances, owner_id, cover_image_url, image_urls,
                   description, address, tags, created_at, updated_at
            FROM venues
            WHERE TRUE
            "#,
        );
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(owner_id) = filter.owner_id {
            query.push(" AND owner_id = ").push_bind(owner_id);
        }
        if let Some(search) = &filter.search {
            query
                .push(
                    " AND to_tsvector('simple', name || ' ' || coalesce(description, '') || ' ' \
                     || array_to_string(tags, ' ')) @@ plainto_tsquery('simple', ",
                )
                .push_bind(search.clone())
                .push(")");
        }
        query.push(" ORDER BY created_at DESC");

        query.build_query_as::<Venue>().fetch_all(&pool).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Venue>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Venue>(
            r#"
            SELECT id, name, slug, status, stances, owner_id, cover_image_url, image_urls,
                   description, address, tags, created_at, updated_at
            FROM venues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
    }

    /// # Errors
    /// - 存在しない owner_id: 外部キー制約違反 (constraint = "venues_owner_id_fkey")
    pub async fn create(&self, venue: &NewVenue) -> Result<Venue, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Venue>(
            r#"
            INSERT INTO venues (id, name, slug, status, stances, owner_id, cover_image_url,
                                image_urls, description, address, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, name, slug, status, stances, owner_id, cover_image_url, image_urls,
                      description, address, tags, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&venue.name)
        .bind(&venue.slug)
        .bind(venue.status)
        .bind(venue.stances)
        .bind(venue.owner_id)
        .bind(&venue.cover_image_url)
        .bind(&venue.image_urls)
        .bind(&venue.description)
        .bind(venue.address.clone().map(Json))
        .bind(&venue.tags)
        .fetch_one(&pool)
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<Option<Venue>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Venue>(
            r#"
            DELETE FROM venues
            WHERE id = $1
            RETURNING id, name, slug, status, stances, owner_id, cover_image_url, image_urls,
                      description, address, tags, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
    }
}
