/// 检测系统 (Detection System)
///
/// 单线程逐帧执行,不涉及网络I/O
/// - Source:   外部检测框输入
/// - Tracker:  质心跟踪,分配持久身份ID
/// - Crossing: 越线计数,每个身份最多计一次
pub mod centroid;
pub mod crossing;
pub mod source;
pub mod tracker;
pub mod types;

use thiserror::Error;

pub use centroid::{CentroidTracker, UnmatchedPolicy};
pub use crossing::{CrossingCounter, CrossingEvent, CrossingTotals, Trajectory};
pub use source::{BoxSource, JsonLinesSource};
pub use tracker::{ActiveObjects, TrackedIdentity, Tracker};
pub use types::{BBox, Direction, Position};

/// 检测输入错误
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("非法检测框 (x1 < x2, y1 < y2 且坐标有限): {0:?}")]
    MalformedBox(BBox),

    #[error("检测输入第 {line} 行解析失败: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("读取检测输入失败: {0}")]
    Io(#[from] std::io::Error),
}
