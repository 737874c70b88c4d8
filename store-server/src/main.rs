use store_server::{print_banner, setup_environment, Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env 与配置
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. 初始化日志
    setup_environment(&config);

    // 打印横幅
    print_banner();
    tracing::info!("📚 Bookstore server starting...");

    // 3. 初始化服务器状态（数据库、网关）
    let state = ServerState::initialize(&config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to initialize state: {e}"))?;

    // 4. 启动 HTTP 服务器
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}
