#![cfg(test)]
use migration::MigratorTrait;
use once_cell::sync::OnceCell;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell as AsyncOnceCell;

static SKIP_NOTICE: OnceCell<()> = OnceCell::new();
static MIGRATED: AsyncOnceCell<bool> = AsyncOnceCell::const_new();

/// Connection for DB-backed tests, or `None` when no database is
/// reachable (the test should then return early). Migrations run once per
/// test process.
pub async fn try_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let migrated = MIGRATED
        .get_or_init(|| async {
            match models::db::connect().await {
                Ok(db) => match migration::Migrator::up(&db, None).await {
                    Ok(()) => true,
                    Err(e) => {
                        eprintln!("skip: migrate up failed: {}", e);
                        false
                    }
                },
                Err(e) => {
                    SKIP_NOTICE.get_or_init(|| {
                        eprintln!("skip: cannot connect to db: {}", e);
                    });
                    false
                }
            }
        })
        .await;
    if !migrated {
        return None;
    }
    models::db::connect().await.ok()
}
