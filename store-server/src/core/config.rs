/// 服务器配置 - 书店后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/bookstore | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_PATH | <WORK_DIR>/store.db | SQLite 数据库文件 |
/// | ENVIRONMENT | development | 运行环境 |
/// | SHIPPING_FEE | 3000 | 基础运费（韩元） |
/// | FREE_SHIPPING_THRESHOLD | 50000 | 免运费门槛（韩元） |
/// | POINTS_EXPIRY_MONTHS | 12 | 积分有效期（月） |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/bookstore HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志目录（可选，未设置时输出到 stdout）
    pub log_dir: Option<String>,

    // === 订单业务配置 ===
    /// 基础运费
    pub shipping_fee: i64,
    /// 免运费门槛（订单金额达到即免运费）
    pub free_shipping_threshold: i64,
    /// 赚取积分的有效期（月）
    pub points_expiry_months: u32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir =
            std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/bookstore".into());
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| format!("{work_dir}/store.db"));
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            shipping_fee: std::env::var("SHIPPING_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3_000),
            free_shipping_threshold: std::env::var("FREE_SHIPPING_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50_000),
            points_expiry_months: std::env::var("POINTS_EXPIRY_MONTHS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(12),
            work_dir,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
