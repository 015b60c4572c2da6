use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password_hash: String,
}

impl From<UserRecord> for shared::AuthUser {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
        }
    }
}

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Usernames are case-folded to lowercase before the uniqueness
    /// constraint applies, so "Alice" and "alice" are the same account.
    pub async fn create(
        &self,
        name: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let inserted = sqlx::query(
            "INSERT INTO users (name, username, password_hash) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(username.to_lowercase())
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(inserted.last_insert_rowid())
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, name, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username.to_lowercase())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, username, password_hash FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
