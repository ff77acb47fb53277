//! SQLite Database - 数据库连接和 schema 迁移

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

use crate::application::ports::{plan_migration, StoreError};

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/lyre.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections: 5,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // 启用 WAL 模式，允许并发读写
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    // 遇到锁时等待而不是立即失败
    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    tracing::info!("SQLite pool created with WAL mode and busy_timeout=5000ms");

    Ok(pool)
}

/// 读取 `PRAGMA user_version`（新数据库为 0）
pub async fn read_schema_version(pool: &DbPool) -> Result<u32, sqlx::Error> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version.max(0) as u32)
}

/// 运行 schema 迁移直到 `schema_version`
///
/// 每个版本一个事务，`user_version` 与表结构变更一起提交
pub async fn run_migrations(pool: &DbPool, schema_version: u32) -> Result<(), StoreError> {
    let stored = read_schema_version(pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    for version in plan_migration(stored, schema_version)? {
        apply_migration(pool, version)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration to v{} failed: {}", version, e)))?;

        tracing::info!(from = stored, to = version, "SQLite library schema migrated");
    }

    tracing::info!(schema_version = schema_version, "Database migrations completed");
    Ok(())
}

async fn apply_migration(pool: &DbPool, version: u32) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    match version {
        1 => {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS playlists (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    track_ids TEXT NOT NULL DEFAULT '[]',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS tracks (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    payload BLOB NOT NULL,
                    mime TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&mut *tx)
            .await?;
        }
        2 => {
            // 旧记录获得版本号 1
            sqlx::query("ALTER TABLE playlists ADD COLUMN version INTEGER NOT NULL DEFAULT 1")
                .execute(&mut *tx)
                .await?;
        }
        _ => {}
    }

    sqlx::query(&format!("PRAGMA user_version = {}", version))
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}
