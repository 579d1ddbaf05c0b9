use log::info;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database as SeaDatabase;
use std::{
    fs::{create_dir_all, File},
    path::Path,
};

pub mod entity;
pub mod migration;

// Re-exports of database types
pub use sea_orm::DatabaseConnection;
pub use sea_orm::DbErr;

/// Database error result type
pub type DbResult<T> = Result<T, DbErr>;

/// Connects to `database_url`, creating the parent directory and backing
/// file when it points at a local sqlite file that doesn't exist yet, and
/// runs any pending migrations. Non-sqlite URLs (e.g. the `postgres://`
/// used in production) are passed straight through to `sea-orm`.
pub async fn init(database_url: &str) -> DatabaseConnection {
    ensure_sqlite_file_exists(database_url);

    let connection = SeaDatabase::connect(database_url)
        .await
        .expect("Unable to create database connection");

    info!("Connected to database, running migrations..");
    Migrator::up(&connection, None)
        .await
        .expect("Unable to run database migrations");

    connection
}

/// `sea-orm`'s sqlite driver refuses to open a file that isn't already
/// there, so for `sqlite:<path>` urls we create the parent directory and
/// an empty file up front. Anything else (postgres, an in-memory sqlite,
/// a sqlite url carrying `?mode=rwc`) is left untouched.
fn ensure_sqlite_file_exists(database_url: &str) {
    let Some(path) = sqlite_file_path(database_url) else {
        return;
    };

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_dir_all(parent).expect("Unable to create parent directory for sqlite database");
        }
    }

    if !path.exists() {
        File::create(path).expect("Unable to create sqlite database file");
    }
}

fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let rest = database_url.strip_prefix("sqlite:")?;
    if rest == ":memory:" || rest.contains('?') {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_file_path_extracts_plain_paths() {
        assert_eq!(sqlite_file_path("sqlite:data/app.db"), Some("data/app.db"));
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("sqlite:data/app.db?mode=rwc"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/app"), None);
    }
}
