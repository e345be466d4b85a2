use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    #[serde(default, with = "lenient::id")]
    pub post: Option<u64>,
    /// Path or absolute URL as returned by the backend.
    #[serde(default)]
    pub image: String,
    #[serde(default, with = "lenient::timestamp")]
    pub created_at: Option<OffsetDateTime>,
}
