use anyhow::{Context, Result};
use fps_probe::cli;
use fps_probe::config::{EnvConfigOverride, ProbeConfig};
use fps_probe::probe::run_probe;
use fps_probe::video::open_source;
use tracing::info;

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;

    // 加载配置：文件 -> 环境变量 -> 命令行
    let (config_path, explicit) = cli::config_path(&matches);
    let from_file = explicit || config_path.exists();
    let mut config = if from_file {
        ProbeConfig::load(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        ProbeConfig::default()
    };
    EnvConfigOverride::apply_overrides(&mut config);
    cli::apply_cli(&matches, &mut config, &cwd)?;
    config.validate()?;

    // 初始化日志 - 环境变量 RUST_LOG 优先，其次是配置中的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("📷 fps-probe {} starting...", env!("CARGO_PKG_VERSION"));
    if from_file {
        info!("✓ Configuration loaded from {}", config_path.display());
    } else {
        info!("✓ Using default configuration");
    }
    info!("  Source: {} (device {})", config.source.kind, config.source.device);
    info!("  Frames: {}, warm-up: {}", config.estimate.frames, config.estimate.warmup);

    // 回放文件的相对路径以配置文件所在目录为基准
    let base_dir = if from_file {
        config_path
            .parent()
            .map(|parent| cwd.join(parent))
            .unwrap_or_else(|| cwd.clone())
    } else {
        cwd.clone()
    };

    let mut source = open_source(&config.source, &base_dir)
        .context("Failed to open frame source")?;
    let report = run_probe(source.as_mut(), &config.capture, &config.estimate)
        .context("Probe run failed")?;

    println!("{}", report);
    Ok(())
}
