//! Module for Data Acess Objects

use sqlx::FromRow;

/// Data Access Object for [`crate::model::Member`].
#[derive(FromRow, Debug)]
pub(crate) struct Member {
    pub(crate) id: i64,
    pub(crate) discord_handle: Option<String>,
    pub(crate) title: String,
}
