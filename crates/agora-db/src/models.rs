/// Database row types — these map directly to SQLite rows.
/// Distinct from agora-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string.
    pub password: String,
    pub created_at: String,
}

pub struct SessionRow {
    pub id: i64,
    pub user_id: i64,
    pub created_at: i64,
    pub expires_at: i64,
}
