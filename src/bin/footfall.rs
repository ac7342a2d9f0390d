//! 客流计数 (Footfall)
//!
//! 从 JSON Lines 读取逐帧检测框 → 质心跟踪 → 越线计数 → 遥测上报,
//! 可选地定期读取快照图像上报环境亮度
//!
//! 用法:
//!   detector | footfall --entry-token <T1> --luma-token <T2> --snapshot /tmp/frame.jpg

use std::io::{self, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use footfall_rs::detection::DetectionError;
use footfall_rs::luma::LumaSource;
use footfall_rs::{
    Args, BoxSource, CounterConfig, EntrySystem, JsonLinesSource, Senders, SnapshotSource,
};

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("🚀 客流计数系统启动");

    // ========== 配置 ==========
    let mut config = CounterConfig::load(&args.config)
        .with_context(|| format!("加载配置 {} 失败", args.config.display()))?;
    config.apply_args(&args);
    config.validate().context("配置校验失败")?;
    config.print_summary();

    // ========== 遥测会话 ==========
    let senders = Senders::connect(&config).context("遥测会话建立失败")?;

    // ========== 输入源 ==========
    let mut boxes: Box<dyn BoxSource> = if args.detections == "-" {
        info!("📥 检测框输入: 标准输入");
        Box::new(JsonLinesSource::new(BufReader::new(io::stdin().lock())))
    } else {
        info!("📥 检测框输入: {}", args.detections);
        Box::new(
            JsonLinesSource::open(&args.detections)
                .with_context(|| format!("打开检测框输入 {} 失败", args.detections))?,
        )
    };

    let luma_source = args.snapshot.as_ref().map(|path| {
        info!("🖼️  亮度快照: {}", path.display());
        Box::new(SnapshotSource::new(path, config.luma_max_width)) as Box<dyn LumaSource + Send>
    });

    // ========== 主循环 ==========
    let mut system = EntrySystem::start(&config, senders, luma_source)?;

    loop {
        match boxes.next_frame() {
            Ok(Some(frame)) => {
                system.process_frame(&frame);
            }
            Ok(None) => {
                info!("📭 输入结束");
                break;
            }
            Err(e @ DetectionError::Parse { .. }) => warn!("⚠️ 跳过无法解析的帧: {}", e),
            Err(e) => {
                error!("❌ 读取检测框失败: {}", e);
                break;
            }
        }
    }

    let report = system.shutdown();
    info!(
        "📊 最终统计: 进入 {} | 离开 {} | 场内 {} | 亮度采样 {} | 排空丢弃 {}",
        report.totals.entered,
        report.totals.left,
        report.totals.inside,
        report.luma_samples,
        report.dispatch.dropped_on_shutdown
    );

    Ok(())
}
