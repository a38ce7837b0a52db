pub mod album;
pub mod song;
pub mod tracklist_item;
pub mod user;
