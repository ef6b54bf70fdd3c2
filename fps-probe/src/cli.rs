use clap::{value_parser, Arg, ArgMatches, Command};
use common::{FourCC, Result};
use std::path::{Path, PathBuf};

use crate::config::{ClockMode, ProbeConfig, SourceKind, DEFAULT_CONFIG_PATH};

/// 构建命令行定义
pub fn build_cli() -> Command {
    Command::new("fps-probe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Open a capture device, read a fixed number of frames and report the elapsed FPS")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help(format!("Configuration file (default: {})", DEFAULT_CONFIG_PATH))
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("KIND")
                .help("Frame source")
                .value_parser(["camera", "synthetic", "replay"]),
        )
        .arg(
            Arg::new("device")
                .short('d')
                .long("device")
                .value_name("INDEX")
                .help("Device index, opens /dev/video<INDEX>")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("trace")
                .short('t')
                .long("trace")
                .value_name("FILE")
                .help("Timestamp trace to replay (implies --source replay)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("clock")
                .long("clock")
                .value_name("MODE")
                .help("Synthetic camera clock")
                .value_parser(["virtual", "paced"]),
        )
        .arg(
            Arg::new("codec")
                .long("codec")
                .value_name("FOURCC")
                .help("Pixel format, e.g. MJPG or YUYV"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("RATE")
                .help("Target frame rate requested from the device")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames to read")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("warmup")
                .long("warmup")
                .value_name("COUNT")
                .help("Leading samples excluded from the estimate")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .value_name("INDEX")
                .help("Last sample index used by the estimate")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("intervals")
                .long("intervals")
                .value_name("COUNT")
                .help("Nominal interval count (default: end - warmup)")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level when RUST_LOG is unset"),
        )
}

/// 配置文件路径，以及是否由用户显式指定
pub fn config_path(matches: &ArgMatches) -> (PathBuf, bool) {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    }
}

/// 命令行参数覆盖配置（优先级最高）
///
/// `cwd` 用于把命令行给出的相对回放路径转成绝对路径
pub fn apply_cli(matches: &ArgMatches, config: &mut ProbeConfig, cwd: &Path) -> Result<()> {
    if let Some(kind) = matches.get_one::<String>("source") {
        config.source.kind = kind.parse::<SourceKind>()?;
    }
    if let Some(device) = matches.get_one::<u16>("device") {
        config.source.device = *device;
    }
    if let Some(trace) = matches.get_one::<PathBuf>("trace") {
        config.source.trace = Some(cwd.join(trace));
        if matches.get_one::<String>("source").is_none() {
            config.source.kind = SourceKind::Replay;
        }
    }
    if let Some(clock) = matches.get_one::<String>("clock") {
        config.source.clock = clock.parse::<ClockMode>()?;
    }

    if let Some(codec) = matches.get_one::<String>("codec") {
        let codec = codec.parse::<FourCC>()?;
        config.capture.codec = Some(codec);
    }
    if let Some(width) = matches.get_one::<u32>("width") {
        config.capture.width = *width;
    }
    if let Some(height) = matches.get_one::<u32>("height") {
        config.capture.height = *height;
    }
    if let Some(fps) = matches.get_one::<u32>("fps") {
        config.capture.fps = *fps;
    }

    if let Some(frames) = matches.get_one::<usize>("frames") {
        config.estimate.frames = *frames;
    }
    if let Some(warmup) = matches.get_one::<usize>("warmup") {
        config.estimate.warmup = *warmup;
    }
    if let Some(end) = matches.get_one::<usize>("end") {
        config.estimate.end = Some(*end);
    }
    if let Some(intervals) = matches.get_one::<u32>("intervals") {
        config.estimate.intervals = Some(*intervals);
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    Ok(())
}
