//! 检测框输入源 (Box source)
//! 外部检测器/视觉跟踪器的接入口: 每次调用提供一帧的检测框

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::types::BBox;
use super::DetectionError;

/// 检测框来源 Trait
pub trait BoxSource {
    /// 读取下一帧的检测框, `Ok(None)` 表示输入结束
    fn next_frame(&mut self) -> Result<Option<Vec<BBox>>, DetectionError>;
}

/// JSON Lines 输入: 每行一帧, 内容为 `[[x1, y1, x2, y2], ...]`, 空行表示空帧
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DetectionError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> BoxSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<BBox>>, DetectionError> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let line = self.buf.trim();
        if line.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let raw: Vec<[f32; 4]> =
            serde_json::from_str(line).map_err(|source| DetectionError::Parse {
                line: self.line_no,
                source,
            })?;
        Ok(Some(raw.into_iter().map(BBox::from).collect()))
    }
}
