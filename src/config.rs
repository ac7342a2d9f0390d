//! 计数系统配置 - 通过JSON文件调整参数,命令行参数优先

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::UnmatchedPolicy;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读写配置文件 {path} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置项非法: {0}")]
    Invalid(String),
}

/// 计数系统参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    // === 质心跟踪参数 ===
    pub max_disappeared_frames: u32, // 最大丢失帧数
    pub max_match_distance: f64,     // 最大匹配距离(像素)
    pub unmatched_policy: UnmatchedPolicy, // 未匹配处理策略

    // === 越线计数参数 ===
    pub frame_height: u32,         // 画面高度, 中线 = 高度 / 2
    pub prune_trajectories: bool,  // 随跟踪器移除而清理轨迹

    // === 环境亮度参数 ===
    pub luma_interval_secs: u64, // 采样间隔(秒)
    pub luma_max_width: u32,     // 计算前缩放到的最大宽度

    // === 遥测参数 ===
    pub host: String,          // 监控平台地址
    pub entry_token: String,   // 越线通道设备令牌
    pub luma_token: String,    // 亮度通道设备令牌
    pub send_timeout_ms: u64,  // 单次发送超时
    pub drain_timeout_ms: u64, // 停止时排空队列的时间预算
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            // 质心跟踪
            max_disappeared_frames: 40,
            max_match_distance: 50.0,
            unmatched_policy: UnmatchedPolicy::Exclusive,

            // 越线计数
            frame_height: 480,
            prune_trajectories: true,

            // 环境亮度
            luma_interval_secs: 60,
            luma_max_width: 500,

            // 遥测
            host: "https://demo.thingsboard.io".to_string(),
            entry_token: String::new(),
            luma_token: String::new(),
            send_timeout_ms: 5_000,
            drain_timeout_ms: 3_000,
        }
    }
}

impl CounterConfig {
    /// 从JSON文件加载配置, 文件不存在时写出默认配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let config: Self = serde_json::from_str(&json)?;
                info!("✅ 配置已从 {} 加载", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 命令行参数覆盖文件配置
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(token) = &args.entry_token {
            self.entry_token = token.clone();
        }
        if let Some(token) = &args.luma_token {
            self.luma_token = token.clone();
        }
        if let Some(height) = args.frame_height {
            self.frame_height = height;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_height == 0 {
            return Err(ConfigError::Invalid("frame_height 必须大于 0".into()));
        }
        if !self.max_match_distance.is_finite() || self.max_match_distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_match_distance 非法: {}",
                self.max_match_distance
            )));
        }
        if self.luma_interval_secs == 0 {
            return Err(ConfigError::Invalid("luma_interval_secs 必须大于 0".into()));
        }
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid("send_timeout_ms 必须大于 0".into()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host 不能为空".into()));
        }
        Ok(())
    }

    pub fn luma_interval(&self) -> Duration {
        Duration::from_secs(self.luma_interval_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!("🎛️  当前计数配置:");
        info!(
            "  最大丢失帧: {} | 最大匹配距离: {:.1}px | 未匹配策略: {:?}",
            self.max_disappeared_frames, self.max_match_distance, self.unmatched_policy
        );
        info!(
            "  画面高度: {} (中线 y={}) | 清理轨迹: {}",
            self.frame_height,
            self.frame_height / 2,
            self.prune_trajectories
        );
        info!("  亮度采样间隔: {}s", self.luma_interval_secs);
        info!(
            "  遥测地址: {} | 发送超时: {}ms | 排空预算: {}ms",
            self.host, self.send_timeout_ms, self.drain_timeout_ms
        );
    }
}

/// 客流计数参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "客流计数 - 越线统计与环境亮度遥测", long_about = None)]
pub struct Args {
    /// 配置文件 (JSON, 不存在时自动生成)
    #[arg(short, long, default_value = "footfall.json")]
    pub config: PathBuf,

    /// 检测框输入 (JSON Lines, 每行一帧; "-" 表示标准输入)
    #[arg(short, long, default_value = "-")]
    pub detections: String,

    /// 亮度快照图像 (由外部抓帧程序定期写入)
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// 监控平台地址
    #[arg(long)]
    pub host: Option<String>,

    /// 越线通道设备令牌
    #[arg(long)]
    pub entry_token: Option<String>,

    /// 亮度通道设备令牌
    #[arg(long)]
    pub luma_token: Option<String>,

    /// 画面高度 (像素)
    #[arg(long)]
    pub frame_height: Option<u32>,

    /// 日志级别 (RUST_LOG 优先)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
