//! 多目标跟踪公共组件
//! Common components for multi-object tracking

use std::collections::BTreeMap;

use log::warn;

use super::types::{BBox, Position};

// ========== 公共数据结构 ==========

/// 当前活跃目标快照: 身份ID → 当前位置 (按ID升序)
pub type ActiveObjects = BTreeMap<u64, Position>;

/// 跟踪身份 (活跃集合中的一个目标)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedIdentity {
    /// 唯一身份ID (进程内单调递增,不复用)
    pub id: u64,

    /// 当前位置 (最近一次匹配到的中心点)
    pub position: Position,

    /// 连续丢失帧数
    pub disappeared: u32,
}

// ========== 跟踪器统一接口 ==========

/// 多目标跟踪器 Trait
///
/// 每帧调用一次 `update`,返回的是值快照,调用方无法修改跟踪器内部状态
pub trait Tracker {
    /// 更新跟踪器
    ///
    /// # 参数
    /// - `detections`: 当前帧的检测框
    ///
    /// # 返回
    /// 本次更新后所有活跃目标的位置
    fn update(&mut self, detections: &[BBox]) -> ActiveObjects;

    /// 重置跟踪器 (清除所有跟踪, ID计数不回退)
    fn reset(&mut self);

    /// 获取当前跟踪数量
    fn track_count(&self) -> usize;
}

// ========== 工具函数 ==========

/// 提取合法检测框的中心点,非法框记录告警后跳过
pub fn valid_centroids(detections: &[BBox]) -> Vec<Position> {
    detections
        .iter()
        .filter_map(|bbox| match bbox.validate() {
            Ok(()) => Some(bbox.centroid()),
            Err(e) => {
                warn!("⚠️ 跳过非法检测框: {}", e);
                None
            }
        })
        .collect()
}

/// 成对欧氏距离矩阵: rows × cols
pub fn distance_matrix(rows: &[Position], cols: &[Position]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|r| cols.iter().map(|c| r.distance(c)).collect())
        .collect()
}

/// 行内最小值所在列 (并列时取第一个)
pub fn row_argmin(row: &[f64]) -> Option<(usize, f64)> {
    row.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((idx, d)),
        })
}
