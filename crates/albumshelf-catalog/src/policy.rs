//! Who may do what to an album.
//!
//! Ownership is derived: an artist owns every album whose free-text artist
//! string equals their display name, compared case-insensitively. Nothing
//! here touches the database.

use albumshelf_db::entities::{album, user, user::UserRole};
use uuid::Uuid;

use crate::error::{CatalogError, Result};

/// The caller of a catalog operation. `role == None` means anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub role: Option<UserRole>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            display_name: String::new(),
            role: None,
        }
    }

    pub fn new(user_id: Uuid, display_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: Some(user_id),
            display_name: display_name.into(),
            role: Some(role),
        }
    }

    /// Deactivated users act as anonymous.
    pub fn from_user(user: &user::Model) -> Self {
        if !user.is_active {
            return Self::anonymous();
        }
        Self::new(user.id, user.display_name.clone(), user.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    /// True when the actor is an artist whose display name matches `album_artist`.
    pub fn owns(&self, album_artist: &str) -> bool {
        self.role == Some(UserRole::Artist) && same_artist(&self.display_name, album_artist)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumAction {
    List,
    View,
    Create,
    Edit,
    Delete,
}

/// Which albums a listing may include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    /// Only albums whose artist matches this name, case-insensitively.
    Artist(String),
}

pub fn same_artist(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Pure decision. `album_artist` is the target album's artist string,
/// required for `Edit`.
pub fn permits(actor: &Actor, action: AlbumAction, album_artist: Option<&str>) -> bool {
    match action {
        AlbumAction::List | AlbumAction::View => true,
        AlbumAction::Create => matches!(actor.role, Some(UserRole::Editor | UserRole::Artist)),
        AlbumAction::Edit => match actor.role {
            Some(UserRole::Editor) => album_artist.is_some(),
            Some(UserRole::Artist) => album_artist.is_some_and(|artist| actor.owns(artist)),
            _ => false,
        },
        AlbumAction::Delete => actor.role == Some(UserRole::Editor),
    }
}

/// [`permits`] as a `Result`, with a message suited for the caller.
pub fn authorize(actor: &Actor, action: AlbumAction, album: Option<&album::Model>) -> Result<()> {
    if permits(actor, action, album.map(|a| a.artist.as_str())) {
        return Ok(());
    }

    let reason = match action {
        AlbumAction::Create => "only editors and artists can create albums",
        AlbumAction::Edit if actor.role == Some(UserRole::Artist) => {
            "artists can only edit their own albums"
        }
        AlbumAction::Edit => "only editors and the album's artist can edit albums",
        AlbumAction::Delete => "only editors can delete albums",
        AlbumAction::List | AlbumAction::View => "access denied",
    };
    tracing::debug!(?action, role = ?actor.role, "album action denied");
    Err(CatalogError::PermissionDenied(reason.to_string()))
}

pub fn list_scope(actor: &Actor) -> ListScope {
    match actor.role {
        Some(UserRole::Artist) => ListScope::Artist(actor.display_name.clone()),
        _ => ListScope::All,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albumshelf_db::entities::album::AlbumFormat;
    use chrono::{NaiveDate, Utc};

    fn actor(role: UserRole, name: &str) -> Actor {
        Actor::new(Uuid::new_v4(), name, role)
    }

    fn album_by(artist: &str) -> album::Model {
        album::Model {
            id: Uuid::new_v4(),
            title: "Abbey Road".into(),
            artist: artist.into(),
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
    fn test_everyone_can_list_and_view() {
        let actors = [
            Actor::anonymous(),
            actor(UserRole::Viewer, "v"),
            actor(UserRole::Artist, "a"),
            actor(UserRole::Editor, "e"),
        ];
        let album = album_by("Someone Else");
        for a in &actors {
            assert!(authorize(a, AlbumAction::List, None).is_ok());
            assert!(authorize(a, AlbumAction::View, Some(&album)).is_ok());
        }
    }

    #[test]
    fn test_create_only_editor_and_artist() {
        assert!(permits(&actor(UserRole::Editor, "e"), AlbumAction::Create, None));
        assert!(permits(&actor(UserRole::Artist, "New Band"), AlbumAction::Create, None));
        assert!(!permits(&actor(UserRole::Viewer, "v"), AlbumAction::Create, None));
        assert!(!permits(&Actor::anonymous(), AlbumAction::Create, None));
    }

    #[test]
    fn test_artist_edits_own_album_case_insensitively_but_cannot_delete() {
        let beatles = actor(UserRole::Artist, "The Beatles");
        let album = album_by("the beatles");
        assert!(authorize(&beatles, AlbumAction::Edit, Some(&album)).is_ok());
        let err = authorize(&beatles, AlbumAction::Delete, Some(&album)).unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));
    }

    #[test]
    fn test_case_insensitive_on_both_sides() {
        let shouty = actor(UserRole::Artist, "THE BEATLES");
        assert!(permits(&shouty, AlbumAction::Edit, Some("The Beatles")));
        assert!(permits(&shouty, AlbumAction::Edit, Some("the beatles")));
    }

    #[test]
    fn test_artist_cannot_edit_other_artists_album() {
        let floyd = actor(UserRole::Artist, "Pink Floyd");
        let album = album_by("The Beatles");
        let err = authorize(&floyd, AlbumAction::Edit, Some(&album)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "permission denied: artists can only edit their own albums"
        );
    }

    #[test]
    fn test_edit_without_album_is_denied() {
        assert!(!permits(&actor(UserRole::Editor, "e"), AlbumAction::Edit, None));
        assert!(!permits(&actor(UserRole::Artist, "a"), AlbumAction::Edit, None));
    }

    #[test]
    fn test_editor_has_full_mutation_rights() {
        let editor = actor(UserRole::Editor, "Music Editor");
        let album = album_by("Anyone");
        assert!(authorize(&editor, AlbumAction::Edit, Some(&album)).is_ok());
        assert!(authorize(&editor, AlbumAction::Delete, Some(&album)).is_ok());
    }

    #[test]
    fn test_viewer_denied_all_mutations() {
        let viewer = actor(UserRole::Viewer, "The Beatles");
        let album = album_by("The Beatles");
        for action in [AlbumAction::Create, AlbumAction::Edit, AlbumAction::Delete] {
            let err = authorize(&viewer, action, Some(&album)).unwrap_err();
            assert!(matches!(err, CatalogError::PermissionDenied(_)));
        }
    }

    #[test]
    fn test_anonymous_denied_all_mutations() {
        let album = album_by("The Beatles");
        for action in [AlbumAction::Create, AlbumAction::Edit, AlbumAction::Delete] {
            assert!(!permits(&Actor::anonymous(), action, Some(album.artist.as_str())));
        }
    }

    #[test]
    fn test_inactive_user_acts_anonymous() {
        let now = Utc::now().fixed_offset();
        let user = user::Model {
            id: Uuid::new_v4(),
            username: "ed".into(),
            email: "ed@example.com".into(),
            password_hash: String::new(),
            display_name: "Music Editor".into(),
            role: UserRole::Editor,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        let a = Actor::from_user(&user);
        assert!(!a.is_authenticated());
        assert!(!permits(&a, AlbumAction::Create, None));
    }

    #[test]
    fn test_list_scope() {
        assert_eq!(list_scope(&Actor::anonymous()), ListScope::All);
        assert_eq!(list_scope(&actor(UserRole::Editor, "e")), ListScope::All);
        assert_eq!(list_scope(&actor(UserRole::Viewer, "v")), ListScope::All);
        assert_eq!(
            list_scope(&actor(UserRole::Artist, "The Beatles")),
            ListScope::Artist("The Beatles".into())
        );
    }

    #[test]
    fn test_owns_requires_artist_role() {
        assert!(!actor(UserRole::Editor, "The Beatles").owns("The Beatles"));
        assert!(actor(UserRole::Artist, "The Beatles").owns("THE BEATLES"));
    }
}
