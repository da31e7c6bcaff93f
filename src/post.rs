use sqlx::FromRow;

use crate::slug;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Post {
    /// Author, referenced by value - there is no foreign key.
    pub username: String,
    /// Stored in slug form; this is also the address segment in
    /// `/:username/:title`.
    pub title: String,
    pub content: String,
    pub date: Timestamp,
}

impl Post {
    /// Best-effort display title recovered from the stored slug.
    pub fn display_title(&self) -> String {
        slug::decode(&self.title)
    }
}
