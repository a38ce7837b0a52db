use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog role. Stored as a short string so the schema stays portable
/// between PostgreSQL and SQLite.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "artist")]
    Artist,
    #[sea_orm(string_value = "editor")]
    Editor,
    #[sea_orm(string_value = "viewer")]
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Artist => "artist",
            UserRole::Editor => "editor",
            UserRole::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "artist" => Ok(UserRole::Artist),
            "editor" => Ok(UserRole::Editor),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Public artist name. Albums whose artist string matches this
    /// (case-insensitively) are owned by the user.
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_as_str() {
        assert_eq!(UserRole::Artist.as_str(), "artist");
        assert_eq!(UserRole::Editor.as_str(), "editor");
        assert_eq!(UserRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(format!("{}", UserRole::Editor), "editor");
    }

    #[test]
    fn test_user_role_from_str_is_lenient_on_case() {
        assert_eq!("Editor".parse::<UserRole>(), Ok(UserRole::Editor));
        assert_eq!(" artist ".parse::<UserRole>(), Ok(UserRole::Artist));
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_user_role_serialization() {
        let json = serde_json::to_string(&UserRole::Viewer).unwrap();
        assert_eq!(json, r#""viewer""#);

        let role: UserRole = serde_json::from_str(r#""artist""#).unwrap();
        assert_eq!(role, UserRole::Artist);
    }
}
