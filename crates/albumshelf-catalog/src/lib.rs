//! Catalog rules for albumshelf: who may change which album, how albums,
//! songs and tracklists are validated and persisted, and user accounts.

pub mod accounts;
pub mod error;
pub mod password;
pub mod policy;
pub mod service;
pub mod slug;
pub mod validation;

pub use accounts::{Accounts, NewAccount, Registration};
pub use error::{CatalogError, Result};
pub use policy::{authorize, permits, Actor, AlbumAction, ListScope};
pub use service::{
    AlbumChanges, AlbumDetail, AlbumInput, AlbumSummary, Catalog, NewSong, NewTracklistItem, Page,
    Paginated, SongChanges, TrackEntry, TracklistEntry, TracklistItemChanges,
};
pub use validation::PriceInput;
