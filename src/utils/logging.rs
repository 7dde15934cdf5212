/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 级别由 `RUST_LOG` 控制，默认 `info`。重复调用无副作用。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `stage`: 运行的阶段
/// - `backend`: 模型后端名称，解析阶段为 `None`
/// - `model`: 模型名称
pub fn log_startup(stage: &str, backend: Option<&str>, model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题库生成 ({})", stage);
    match backend {
        Some(backend) => info!("🤖 模型后端: {} ({})", backend, model),
        None => info!("🤖 本阶段不调用模型"),
    }
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `total`: 来源总数
pub fn log_stage_start(stage: &str, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始 {} 阶段，共 {} 个来源", stage, total);
    info!("{}", "=".repeat(60));
}

/// 记录来源开始信息
pub fn log_source_start(index: usize, total: usize, name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📄 [{}/{}] {}", index, total, name);
}

/// 打印最终统计信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `processed`: 处理成功数量
/// - `skipped`: 已存在而跳过的数量
/// - `failed`: 失败数量
/// - `output_dir`: 产物目录
pub fn print_final_stats(
    stage: &str,
    processed: usize,
    skipped: usize,
    failed: usize,
    output_dir: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 {} 阶段完成统计", stage);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", processed, processed + skipped + failed);
    info!("⏭️  跳过: {}", skipped);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n输出目录: {}", output_dir);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
