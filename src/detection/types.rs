/// 计数系统数据结构定义
/// Data structures for the entry counting system
use serde::{Deserialize, Serialize};

use super::DetectionError;

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box)
///
/// 由外部检测器/视觉跟踪器提供,计数核心只读不写
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 校验框的合法性: 坐标有限且 x1 < x2, y1 < y2
    pub fn validate(&self) -> Result<(), DetectionError> {
        let finite = [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(DetectionError::MalformedBox(*self));
        }
        Ok(())
    }

    /// 中心点 (取整方式与截断一致: 向零取整)
    pub fn centroid(&self) -> Position {
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0;
        Position::new(cx as i32, cy as i32)
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// 整数像素坐标点 (检测框中心)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 欧氏距离
    pub fn distance(&self, other: &Position) -> f64 {
        // 坐标可能处于 i32 两端, 先转 f64 再相减
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// 穿越方向
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DOWN")]
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
