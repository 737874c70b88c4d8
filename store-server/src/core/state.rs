use std::sync::Arc;

use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::gateway::{MockGateway, PaymentGateway};
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的共享引用
///
/// Cloned per request by axum; everything inside is either `Copy`-cheap
/// or reference-counted.
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | gateway | 支付网关客户端 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// 支付网关客户端 (Arc 共享所有权)
    pub gateway: Arc<dyn PaymentGateway>,
}

impl ServerState {
    /// Initialize all services from configuration
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self {
            config: config.clone(),
            pool: db.pool,
            // Real provider clients live outside this service; the mock
            // stands in for development and tests.
            gateway: Arc::new(MockGateway::new()),
        })
    }

    /// Construct a state around existing services (tests)
    pub fn with_services(
        config: Config,
        pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            config,
            pool,
            gateway,
        }
    }
}
