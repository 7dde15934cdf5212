use anyhow::Result;
use quiz_pipeline::utils::logging;
use quiz_pipeline::{App, Config, Stage};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 阶段：parse | generate | all（默认）
    let stage: Stage = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("all")
        .parse()?;

    // 加载配置
    let config = Config::from_env()?;

    // 初始化并运行应用
    App::initialize(config, stage).await?.run(stage).await?;

    Ok(())
}
