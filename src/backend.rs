use std::path::{Path, PathBuf};

use log::{error, info};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use crate::post::Post;
use crate::user::User;

type Result<T> = std::result::Result<T, ()>;

#[derive(Debug)]
pub enum FindError {
    NotFound,
    Internal,
}

pub struct Backend(pub SqlitePool);

fn into_sql(path: &Path) -> PathBuf {
    path.join("publog.sql")
}

pub async fn init(data_dir: &Path) {
    let final_path = format!(
        "sqlite://{}",
        into_sql(data_dir).to_str().expect("non utf-8 data")
    );
    match Sqlite::create_database(&final_path).await {
        Ok(()) => {
            info!("Using {}", &final_path);
        }
        Err(e) => {
            let sqlx::Error::Database(db_err) = e else {
                panic!("error creating database: {e}");
            };

            panic!("sql db error: {db_err:?}");
        }
    }
}

impl Backend {
    pub async fn new(data_dir: &Path) -> Self {
        let db_pathbuf = into_sql(data_dir);
        let db_path = db_pathbuf.to_str().expect("non utf-8 data");
        let pool = match SqlitePool::connect(db_path).await {
            Ok(pool) => pool,
            Err(_err) => {
                init(data_dir).await;
                SqlitePool::connect(db_path).await.expect("db connection")
            }
        };

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migration");

        Self(pool)
    }
}

impl Backend {
    pub async fn find_user(&self, username: &str) -> std::result::Result<User, FindError> {
        sqlx::query_as::<_, User>(
            "
            SELECT username, email, pwhash
            FROM users
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_one(&self.0)
        .await
        .map_err(|e| {
            if matches!(e, sqlx::Error::RowNotFound) {
                FindError::NotFound
            } else {
                error!("couldn't query user {username}: {e:?}");
                FindError::Internal
            }
        })
    }

    pub async fn find_user_by_email(&self, email: &str) -> std::result::Result<User, FindError> {
        sqlx::query_as::<_, User>(
            "
            SELECT username, email, pwhash
            FROM users
            WHERE email = ?
            ",
        )
        .bind(email)
        .fetch_one(&self.0)
        .await
        .map_err(|e| {
            if matches!(e, sqlx::Error::RowNotFound) {
                FindError::NotFound
            } else {
                error!("couldn't query user by email: {e:?}");
                FindError::Internal
            }
        })
    }

    /// Duplicate usernames are rejected by the primary key; callers see that
    /// as the same failure as any other rejected write.
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO users
            (username, email, pwhash)
            VALUES
            (?, ?, ?)
            ",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.pwhash)
        .execute(&self.0)
        .await
        .map(|_| ())
        .map_err(|e| {
            error!("error inserting user {}: {e:?}", user.username);
        })
    }
}

impl Backend {
    pub async fn insert_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO posts
            (username, title, content, date)
            VALUES
            (?, ?, ?, ?)
            ",
        )
        .bind(&post.username)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.date)
        .execute(&self.0)
        .await
        .map(|_| ())
        .map_err(|e| {
            error!("error inserting post for {}: {e:?}", post.username);
        })
    }

    /// Every post, oldest first (rowid keeps insertion order explicit).
    pub async fn all_posts(&self) -> Result<Vec<Post>> {
        sqlx::query_as::<_, Post>(
            "
            SELECT username, title, content, date
            FROM posts
            ORDER BY rowid
            ",
        )
        .fetch_all(&self.0)
        .await
        .map_err(|e| {
            error!("error selecting posts: {e:?}");
        })
    }

    pub async fn posts_for_user(&self, username: &str) -> Result<Vec<Post>> {
        sqlx::query_as::<_, Post>(
            "
            SELECT username, title, content, date
            FROM posts
            WHERE username = ?
            ORDER BY rowid
            ",
        )
        .bind(username)
        .fetch_all(&self.0)
        .await
        .map_err(|e| {
            error!("error selecting posts for {username}: {e:?}");
        })
    }

    /// Exact match on the stored (slugified) title. Nothing stops two posts
    /// from sharing a slug; the first stored wins.
    pub async fn find_post(
        &self,
        username: &str,
        slug: &str,
    ) -> std::result::Result<Post, FindError> {
        sqlx::query_as::<_, Post>(
            "
            SELECT username, title, content, date
            FROM posts
            WHERE username = ? AND title = ?
            ORDER BY rowid
            LIMIT 1
            ",
        )
        .bind(username)
        .bind(slug)
        .fetch_one(&self.0)
        .await
        .map_err(|e| {
            if matches!(e, sqlx::Error::RowNotFound) {
                FindError::NotFound
            } else {
                error!("error selecting post {username}/{slug}: {e:?}");
                FindError::Internal
            }
        })
    }
}

#[cfg(test)]
pub mod test {
    use super::Backend;

    use sqlx::SqlitePool;

    pub async fn create_backend() -> Backend {
        let db = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::migrate!("./migrations").run(&db).await.unwrap();

        Backend(db)
    }
}
