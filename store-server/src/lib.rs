//! Bookstore Store Server - 书店订单/支付后端
//!
//! # 架构概述
//!
//! 核心是订单支付审批工作流：外部支付网关授权成功后，在单个
//! SQLite 事务内完成优惠券核销、积分扣减/累积、支付落账、订单状态
//! 流转和购物车清理。
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、服务器引导
//! ├── api/           # HTTP 路由和处理器
//! ├── checkout/      # 草稿订单操作 + 支付审批工作流
//! ├── marketing/     # 优惠券与积分台账
//! ├── pricing/       # 购物车计价引擎
//! ├── cart/          # 购物车服务
//! ├── gateway/       # 支付网关协作方（trait + mock）
//! ├── db/            # SQLite 连接池与仓储层
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod cart;
pub mod checkout;
pub mod core;
pub mod db;
pub mod gateway;
pub mod marketing;
pub mod pricing;
pub mod utils;

// Re-export 公共类型
pub use api::extract::CurrentUser;
pub use checkout::{ApprovalOutcome, ApprovalRequest, CheckoutError};
pub use core::{Config, Server, ServerState};
pub use db::DbService;
pub use gateway::{MockGateway, PaymentGateway};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Environment setup shared by main and tools: dotenv + logging
pub fn setup_environment(config: &Config) {
    init_logger_with_file(None, config.log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    ____              __
   / __ )____  ____  / /_______/ /_____  ________
  / __  / __ \/ __ \/ //_/ ___/ __/ __ \/ ___/ _ \
 / /_/ / /_/ / /_/ / ,< (__  ) /_/ /_/ / /  /  __/
/_____/\____/\____/_/|_/____/\__/\____/_/   \___/
    "#
    );
}
