use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::capture::utils::decode_png_data_url;
use crate::capture::{CaptureError, Region, RegionCapture, XcapDisplays};
use crate::config::{Config, init};
use crate::store::{History, PinBoard, PinId};

#[derive(Parser)]
#[command(name = "region-capture")]
#[command(about = "多显示器区域截图工具", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 配置文件路径(默认使用系统配置目录)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 日志等级 (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 列出所有显示器及其位置和缩放比
    ListDisplays,

    /// 截取全局坐标下的矩形区域
    Capture {
        #[arg(short, long, allow_negative_numbers = true)]
        x: i32,

        #[arg(short, long, allow_negative_numbers = true)]
        y: i32,

        #[arg(short = 'W', long)]
        width: u32,

        #[arg(short = 'H', long)]
        height: u32,

        /// 同时把 PNG 写到该文件
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 截图后立即置顶
        #[arg(short, long)]
        pin: bool,
    },

    /// 列出截图历史(最新的在前)
    History,

    /// 置顶一条历史截图(id 可以只写前缀)
    Pin { id: String },

    /// 取消置顶
    Unpin { id: PinId },

    /// 列出所有置顶
    Pins,
}

/// CLI 入口函数
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init::init(&log_level);

    match cli.command {
        Commands::ListDisplays => list_displays(&config).await,
        Commands::Capture {
            x,
            y,
            width,
            height,
            output,
            pin,
        } => capture(&config, Region::new(x, y, width, height), output, pin).await,
        Commands::History => show_history(&config),
        Commands::Pin { id } => pin_history_entry(&config, &id),
        Commands::Unpin { id } => unpin(&config, &id),
        Commands::Pins => list_pins(&config),
    }
}

/// 列出所有可识别的显示器
async fn list_displays(config: &Config) -> Result<()> {
    let capture = RegionCapture::new(Arc::new(XcapDisplays::new()), config.capture.clone());
    let displays = capture.displays().await?;

    if displays.is_empty() {
        println!("未检测到任何显示器");
    } else {
        println!("检测到 {} 个显示器:\n", displays.len());
        for (idx, display) in displays.iter().enumerate() {
            println!("  [{}] {}", idx + 1, display);
        }
    }

    Ok(())
}

async fn capture(
    config: &Config,
    selection: Region,
    output: Option<PathBuf>,
    pin: bool,
) -> Result<()> {
    let capture = RegionCapture::new(Arc::new(XcapDisplays::new()), config.capture.clone());

    let image = match capture.capture(selection).await {
        Ok(image) => image,
        Err(CaptureError::PermissionDenied(reason)) => {
            return Err(anyhow!(
                "没有屏幕录制权限，请在系统设置中授权后重试 ({})",
                reason
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let mut history = History::load(config.storage.history_file(), config.history.capacity)?;
    history.add(image.clone());
    history.save(config.storage.history_file())?;

    println!("{}", image.id);
    println!("  -> {}x{} from {}", image.width, image.height, image.region);

    if let Some(path) = output {
        let png = decode_png_data_url(&image.data_url)
            .ok_or_else(|| anyhow!("Captured image is not a PNG data URL"))?;
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  -> 已保存到: {}", path.display());
    }

    if pin {
        let mut board = PinBoard::load(config.storage.pins_file(), config.storage.pins_dir())?;
        let pin_id =
            board.pin_and_save(&image.data_url, Some(image.id), config.storage.pins_file())?;
        println!("  -> 已置顶: {}", pin_id);
    }

    Ok(())
}

fn show_history(config: &Config) -> Result<()> {
    let history = History::load(config.storage.history_file(), config.history.capacity)?;
    if history.is_empty() {
        println!("暂无截图历史");
        return Ok(());
    }

    for entry in history.get_all() {
        println!(
            "{}  {}  {}x{}  {}  hash={}",
            entry.id,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.width,
            entry.height,
            entry.region,
            entry.hash.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn pin_history_entry(config: &Config, id: &str) -> Result<()> {
    let history = History::load(config.storage.history_file(), config.history.capacity)?;
    let entry = history
        .find_by_prefix(id)
        .ok_or_else(|| anyhow!("No unique history entry matches {}", id))?;

    let mut board = PinBoard::load(config.storage.pins_file(), config.storage.pins_dir())?;
    let pin_id = board.pin_and_save(&entry.data_url, Some(entry.id), config.storage.pins_file())?;

    info!("Pinned history entry {}", entry.id);
    println!("{}", pin_id);
    Ok(())
}

fn unpin(config: &Config, id: &PinId) -> Result<()> {
    let mut board = PinBoard::load(config.storage.pins_file(), config.storage.pins_dir())?;
    let pin = board.unpin(id)?;
    board.save(config.storage.pins_file())?;
    println!("已取消置顶: {}", pin.id);
    Ok(())
}

fn list_pins(config: &Config) -> Result<()> {
    let board = PinBoard::load(config.storage.pins_file(), config.storage.pins_dir())?;
    if board.list().is_empty() {
        println!("暂无置顶");
        return Ok(());
    }

    for pin in board.list() {
        println!(
            "{}  {}x{}  {}",
            pin.id,
            pin.width,
            pin.height,
            pin.path.display()
        );
    }
    Ok(())
}
