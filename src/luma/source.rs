//! 亮度采样来源

use std::path::PathBuf;

use image::imageops::FilterType;

use super::{LumaCalculator, LumaError, LumaValues};

/// 亮度来源 Trait
pub trait LumaSource {
    /// 采样一次, `Ok(None)` 表示暂无可用画面,本轮跳过
    fn sample(&mut self) -> Result<Option<LumaValues>, LumaError>;
}

impl<S: LumaSource + ?Sized> LumaSource for Box<S> {
    fn sample(&mut self) -> Result<Option<LumaValues>, LumaError> {
        (**self).sample()
    }
}

/// 快照文件来源: 外部抓帧程序定期覆盖写入同一个图像文件
pub struct SnapshotSource {
    path: PathBuf,
    /// 超过该宽度先等比缩小再计算
    max_width: u32,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>, max_width: u32) -> Self {
        Self {
            path: path.into(),
            max_width,
        }
    }
}

impl LumaSource for SnapshotSource {
    fn sample(&mut self) -> Result<Option<LumaValues>, LumaError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut img = image::open(&self.path)?;
        if self.max_width > 0 && img.width() > self.max_width {
            img = img.resize(self.max_width, u32::MAX, FilterType::Triangle);
        }
        Ok(Some(LumaCalculator::calculate(&img.to_rgb8())))
    }
}
