use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "venue_status", rename_all = "lowercase")]
pub enum VenueStatus {
    #[default]
    Available,
    Unavailable,
    Maintenance,
}

impl VenueStatus {
    pub const ALL: [VenueStatus; 3] = [Self::Available, Self::Unavailable, Self::Maintenance];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Maintenance => "maintenance",
        }
    }

    /// 大文字小文字を区別せずにパース
    ///
    /// 空文字は None（未指定扱い）
    pub fn parse(value: &str) -> Result<Option<Self>, String> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let normalized = value.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .map(Some)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("status は次のいずれかを指定してください: {}", allowed.join(", "))
            })
    }
}

/// 住所（空欄の項目は保存しない）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Address {
    /// 各項目をトリムし、空欄を除去。全項目が空なら None
    pub fn normalized(self) -> Option<Self> {
        let address = Self {
            line1: non_blank(self.line1),
            city: non_blank(self.city),
            state: non_blank(self.state),
            country: non_blank(self.country),
            postal_code: non_blank(self.postal_code),
        };
        (address != Self::default()).then_some(address)
    }
}

/// 会場
#[derive(Debug, Clone, FromRow)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: VenueStatus,
    pub stances: i32,
    pub owner_id: Uuid,
    pub cover_image_url: String,
    pub image_urls: Vec<String>,
    pub description: Option<String>,
    pub address: Option<Json<Address>>,
    pub tags: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Venue {
    /// カバー画像 + ギャラリー画像（重複除去、順序維持）
    pub fn images(&self) -> Vec<String> {
        let all = std::iter::once(self.cover_image_url.clone()).chain(self.image_urls.iter().cloned());
        dedup_preserving_order(all.filter(|url| !url.is_empty()))
    }
}

/// 登録用（正規化済み）
#[derive(Debug, Clone)]
pub struct NewVenue {
    pub name: String,
    pub slug: String,
    pub status: VenueStatus,
    pub stances: i32,
    pub owner_id: Uuid,
    pub cover_image_url: String,
    pub image_urls: Vec<String>,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub tags: Vec<String>,
}

/// 一覧検索条件
#[derive(Debug, Clone, Default)]
pub struct VenueFilter {
    pub status: Option<VenueStatus>,
    pub owner_id: Option<Uuid>,
    pub search: Option<String>,
}

/// スラッグ生成: 小文字化し、英数字以外の連続を "-" に置換、前後の "-" を除去
pub fn build_slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// 文字列配列の正規化: トリム、空要素はエラー、重複除去（順序維持）
pub fn normalize_string_list(values: Vec<String>, field: &str) -> Result<Vec<String>, String> {
    let trimmed = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let value = value.trim().to_string();
            if value.is_empty() {
                Err(format!("{field}[{index}] は空にできません"))
            } else {
                Ok(value)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dedup_preserving_order(trimmed))
}

fn dedup_preserving_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
