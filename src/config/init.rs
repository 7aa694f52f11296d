use tracing_subscriber::{EnvFilter, fmt};

/// 初始化日志系统
///
/// `RUST_LOG` 优先于传入的日志等级
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // 日志写到 stderr，stdout 留给命令输出
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}
