use sea_orm::entity::prelude::*;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Number of description characters kept by [`Model::short_description`].
pub const SHORT_DESCRIPTION_CHARS: usize = 100;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
pub enum AlbumFormat {
    #[sea_orm(string_value = "dd")]
    #[serde(rename = "digital", alias = "dd")]
    Digital,
    #[sea_orm(string_value = "cd")]
    #[serde(rename = "cd")]
    Cd,
    #[sea_orm(string_value = "vi")]
    #[serde(rename = "vinyl", alias = "vi")]
    Vinyl,
}

impl AlbumFormat {
    pub fn label(&self) -> &'static str {
        match self {
            AlbumFormat::Digital => "Digital Download",
            AlbumFormat::Cd => "CD",
            AlbumFormat::Vinyl => "Vinyl",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "albums")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    /// Free-text artist name, not a foreign key.
    pub artist: String,
    pub description: String,
    /// Price in cents (0..=99_999).
    pub price_cents: i32,
    pub format: AlbumFormat,
    pub release_date: Date,
    pub cover_url: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// First 100 characters of the description, with `...` appended when
    /// truncated.
    pub fn short_description(&self) -> String {
        let mut chars = self.description.chars();
        let head: String = chars.by_ref().take(SHORT_DESCRIPTION_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    pub fn release_year(&self) -> i32 {
        self.release_date.year()
    }

    /// Price rendered with two decimals, e.g. `25.99`.
    pub fn price_display(&self) -> String {
        format!("{}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.title, self.artist)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tracklist_item::Entity")]
    TracklistItem,
}

impl Related<super::tracklist_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TracklistItem.def()
    }
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        super::tracklist_item::Relation::Song.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::tracklist_item::Relation::Album.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn make_album() -> Model {
        Model {
            id: Uuid::new_v4(),
            title: "Abbey Road".into(),
            artist: "The Beatles".into(),
            description: String::new(),
            price_cents: 2599,
            format: AlbumFormat::Vinyl,
            release_date: NaiveDate::from_ymd_opt(1969, 9, 26).unwrap(),
            cover_url: None,
            slug: "abbey-road-the-beatles".into(),
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_short_description_empty() {
        assert_eq!(make_album().short_description(), "");
    }

    #[test]
    fn test_short_description_exactly_limit_not_truncated() {
        let mut album = make_album();
        album.description = "a".repeat(100);
        assert_eq!(album.short_description().len(), 100);
        assert!(!album.short_description().ends_with("..."));
    }

    #[test]
    fn test_short_description_truncated() {
        let mut album = make_album();
        album.description = "A".repeat(150);
        let short = album.short_description();
        assert_eq!(short.len(), 103);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_short_description_counts_chars_not_bytes() {
        let mut album = make_album();
        album.description = "é".repeat(101);
        assert_eq!(album.short_description().chars().count(), 103);
    }

    #[test]
    fn test_release_year() {
        assert_eq!(make_album().release_year(), 1969);
    }

    #[test]
    fn test_price_display() {
        let mut album = make_album();
        assert_eq!(album.price_display(), "25.99");
        album.price_cents = 5;
        assert_eq!(album.price_display(), "0.05");
        album.price_cents = 99_999;
        assert_eq!(album.price_display(), "999.99");
    }

    #[test]
    fn test_display() {
        assert_eq!(make_album().to_string(), "Abbey Road by The Beatles");
    }

    #[test]
    fn test_format_serde_names_and_aliases() {
        assert_eq!(
            serde_json::to_string(&AlbumFormat::Digital).unwrap(),
            r#""digital""#
        );
        assert_eq!(
            serde_json::from_str::<AlbumFormat>(r#""vi""#).unwrap(),
            AlbumFormat::Vinyl
        );
        assert_eq!(
            serde_json::from_str::<AlbumFormat>(r#""cd""#).unwrap(),
            AlbumFormat::Cd
        );
        assert!(serde_json::from_str::<AlbumFormat>(r#""tape""#).is_err());
    }
}
