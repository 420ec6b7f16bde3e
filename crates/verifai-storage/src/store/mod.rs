use crate::error::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use std::path::Path;

pub mod audit;
pub mod batch;
pub mod chat;
pub mod settings;
pub mod vector;
pub mod verification;

pub use audit::{ActionCount, AuditLogFilter, AuditStats, DailyCount};
pub use batch::BatchStats;
pub use vector::VectorRecord;
pub use verification::{StatusCounts, VerificationFilter};

/// SQLite rowid: breaks ties between rows stamped in the same instant.
pub(crate) fn insertion_order() -> SimpleExpr {
    Expr::cust("rowid")
}

/// 核验数据库（verifai.db）的统一访问层。
///
/// 所有方法均为 `async fn`，底层使用 SeaORM 连接池。
#[derive(Clone)]
pub struct VerifaiStore {
    pub(crate) db: DatabaseConnection,
}

impl VerifaiStore {
    /// 连接并初始化数据库。
    ///
    /// - `db_url`：完整的数据库连接 URL，例如 `sqlite:///data/verifai.db?mode=rwc`
    /// - `data_dir`：本地数据目录，启动时确保存在
    ///
    /// 自动运行 `sea-orm-migration` 迁移，确保 Schema 最新。
    pub async fn new(db_url: &str, data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db = Database::connect(db_url).await?;

        // WAL 模式仅对 SQLite 有效
        if db_url.starts_with("sqlite://") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;

        tracing::info!(db_url = %db_url, "Initialized verification store (SeaORM)");
        Ok(Self { db })
    }

    /// 返回底层数据库连接引用（供子模块使用）。
    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Round-trips the connection; used by the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }
}
