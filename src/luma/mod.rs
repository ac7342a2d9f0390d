/// 环境亮度系统 (Ambient Light)
///
/// - Calculator: 由一帧图像计算 8 项亮度指标
/// - Source:     亮度采样来源 (例如外部抓帧程序写出的快照文件)
/// - Producer:   后台线程,按固定间隔采样并推送遥测事件
pub mod calculator;
pub mod producer;
pub mod source;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use calculator::LumaCalculator;
pub use producer::LumaProducer;
pub use source::{LumaSource, SnapshotSource};

/// 一次采样的亮度指标
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LumaValues {
    pub mean_luma: f64,
    pub geom_mean_luma: f64,
    pub mean_lightness: f64,
    pub geom_mean_lightness: f64,
    pub median_lightness: f64,
    pub mean_filtered_lightness: f64,
    pub geom_mean_filtered_lightness: f64,
    pub median_filtered_lightness: f64,
}

/// 亮度采样错误
#[derive(Debug, Error)]
pub enum LumaError {
    #[error("读取快照图像失败: {0}")]
    Image(#[from] image::ImageError),

    #[error("采样失败: {0}")]
    Source(String),
}
