use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shortest accepted running time, in seconds.
pub const MIN_RUNNING_TIME_SECS: i32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "songs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    /// Whole seconds, at least [`MIN_RUNNING_TIME_SECS`].
    pub running_time: i32,
}

impl Model {
    pub fn formatted_time(&self) -> String {
        format_duration(i64::from(self.running_time))
    }
}

/// `m:ss` rendering of a number of seconds. Negative input renders as `0:00`.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
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

impl ActiveModelBehavior for ActiveModel {}
