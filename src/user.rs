use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    /// Login identifier, and the canonical identity token carried by a
    /// session. Not backed by a unique index.
    pub email: String,
    /// bcrypt digest. The plaintext never reaches storage or logs.
    pub pwhash: String,
}
