//! 质心跟踪算法实现
//! Centroid tracking: nearest-centroid greedy association
//!
//! 核心思想:
//! 1. 每个检测框只取中心点
//! 2. 旧目标与新中心点两两计算欧氏距离
//! 3. 按行最小距离升序贪心匹配,超出距离阈值不匹配
//! 4. 连续丢失超过阈值的目标被移除, ID 永不复用

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::tracker::{
    distance_matrix, row_argmin, valid_centroids, ActiveObjects, TrackedIdentity, Tracker,
};
use super::types::{BBox, Position};

/// 未匹配目标的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// 二选一: 旧目标数 >= 新中心点数时只老化未匹配旧目标,
    /// 否则只注册未匹配的新中心点
    #[default]
    Exclusive,
    /// 每帧都老化未匹配旧目标并注册未匹配新中心点
    Both,
}

/// 质心追踪器
pub struct CentroidTracker {
    /// 活跃目标 (按ID升序)
    objects: BTreeMap<u64, TrackedIdentity>,

    /// 下一个分配的ID
    next_id: u64,

    /// 最大允许丢失帧数 (超过即移除)
    max_disappeared: u32,

    /// 最大匹配距离 (像素)
    max_distance: f64,

    /// 未匹配处理策略
    policy: UnmatchedPolicy,
}

impl CentroidTracker {
    pub fn new(max_disappeared: u32, max_distance: f64) -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 0,
            max_disappeared,
            max_distance,
            policy: UnmatchedPolicy::Exclusive,
        }
    }

    pub fn with_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 某个目标的连续丢失帧数 (目标不在活跃集合中返回 None)
    pub fn disappeared(&self, id: u64) -> Option<u32> {
        self.objects.get(&id).map(|o| o.disappeared)
    }

    /// 下一个将被分配的ID
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    fn snapshot(&self) -> ActiveObjects {
        self.objects
            .iter()
            .map(|(&id, obj)| (id, obj.position))
            .collect()
    }

    fn register(&mut self, position: Position) {
        let id = self.next_id;
        self.objects.insert(
            id,
            TrackedIdentity {
                id,
                position,
                disappeared: 0,
            },
        );
        self.next_id += 1;
        debug!("🆕 注册目标 #{} @ ({}, {})", id, position.x, position.y);
    }

    /// 丢失计数 +1,超过阈值则移除
    fn mark_disappeared(&mut self, id: u64) {
        let evict = match self.objects.get_mut(&id) {
            Some(obj) => {
                obj.disappeared = obj.disappeared.saturating_add(1);
                obj.disappeared > self.max_disappeared
            }
            None => false,
        };
        if evict {
            self.objects.remove(&id);
            debug!("🗑️ 移除目标 #{} (连续丢失超过 {} 帧)", id, self.max_disappeared);
        }
    }

    fn match_centroids(&mut self, centroids: &[Position]) {
        let ids: Vec<u64> = self.objects.keys().copied().collect();
        let rows: Vec<Position> = self.objects.values().map(|o| o.position).collect();
        let dists = distance_matrix(&rows, centroids);

        // 每行取最近列,再按行最小距离升序 (稳定排序,并列保持ID顺序)
        let mut candidates: Vec<(usize, usize, f64)> = dists
            .iter()
            .enumerate()
            .filter_map(|(row, d)| row_argmin(d).map(|(col, dist)| (row, col, dist)))
            .collect();
        candidates.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut used_rows = vec![false; rows.len()];
        let mut used_cols = vec![false; centroids.len()];

        for (row, col, dist) in candidates {
            if used_cols[col] || dist > self.max_distance {
                continue;
            }
            if let Some(obj) = self.objects.get_mut(&ids[row]) {
                obj.position = centroids[col];
                obj.disappeared = 0;
            }
            used_rows[row] = true;
            used_cols[col] = true;
        }

        let exclusive = self.policy == UnmatchedPolicy::Exclusive;
        let rows_dominate = rows.len() >= centroids.len();

        if rows_dominate || !exclusive {
            for (row, &used) in used_rows.iter().enumerate() {
                if !used {
                    self.mark_disappeared(ids[row]);
                }
            }
        }

        if !rows_dominate || !exclusive {
            for (col, &used) in used_cols.iter().enumerate() {
                if !used {
                    self.register(centroids[col]);
                }
            }
        }
    }
}

impl Tracker for CentroidTracker {
    fn update(&mut self, detections: &[BBox]) -> ActiveObjects {
        let centroids = valid_centroids(detections);

        if centroids.is_empty() {
            let ids: Vec<u64> = self.objects.keys().copied().collect();
            for id in ids {
                self.mark_disappeared(id);
            }
        } else if self.objects.is_empty() {
            for c in centroids {
                self.register(c);
            }
        } else {
            self.match_centroids(&centroids);
        }

        self.snapshot()
    }

    fn reset(&mut self) {
        self.objects.clear();
    }

    fn track_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox_at(x: i32, y: i32) -> BBox {
        let (x, y) = (x as f32, y as f32);
        BBox::new(x - 5.0, y - 5.0, x + 5.0, y + 5.0)
    }

    fn seeded(points: &[(i32, i32)], policy: UnmatchedPolicy) -> CentroidTracker {
        let mut tracker = CentroidTracker::new(40, 50.0).with_policy(policy);
        let boxes: Vec<BBox> = points.iter().map(|&(x, y)| bbox_at(x, y)).collect();
        tracker.update(&boxes);
        tracker
    }

    #[test]
    fn test_first_frame_registers_everything() {
        let mut tracker = CentroidTracker::new(40, 50.0);
        let objects = tracker.update(&[bbox_at(10, 10), bbox_at(400, 400)]);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[&0], Position::new(10, 10));
        assert_eq!(objects[&1], Position::new(400, 400));
        assert_eq!(tracker.next_id(), 2);
    }

    #[test]
    fn test_empty_frames_age_and_evict_at_threshold() {
        let mut tracker = CentroidTracker::new(2, 50.0);
        tracker.update(&[bbox_at(100, 100)]);

        for expected in 1..=2 {
            let objects = tracker.update(&[]);
            assert!(objects.contains_key(&0));
            assert_eq!(tracker.disappeared(0), Some(expected));
        }

        let objects = tracker.update(&[]);
        assert!(objects.is_empty());
        assert_eq!(tracker.disappeared(0), None);
    }

    #[test]
    fn test_match_resets_disappeared() {
        let mut tracker = CentroidTracker::new(5, 50.0);
        tracker.update(&[bbox_at(100, 100)]);
        tracker.update(&[]);
        tracker.update(&[]);
        assert_eq!(tracker.disappeared(0), Some(2));

        let objects = tracker.update(&[bbox_at(110, 105)]);
        assert_eq!(objects[&0], Position::new(110, 105));
        assert_eq!(tracker.disappeared(0), Some(0));
    }

    #[test]
    fn test_identical_sequences_assign_identical_ids() {
        let frames: Vec<Vec<BBox>> = vec![
            vec![bbox_at(10, 10), bbox_at(200, 50)],
            vec![bbox_at(14, 18), bbox_at(195, 60), bbox_at(400, 300)],
            vec![bbox_at(20, 25), bbox_at(405, 290)],
            vec![],
            vec![bbox_at(26, 31), bbox_at(190, 80), bbox_at(410, 280)],
        ];

        let run = || {
            let mut tracker = CentroidTracker::new(40, 50.0);
            frames.iter().map(|f| tracker.update(f)).collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_more_rows_ages_unmatched_and_drops_new_boxes() {
        let mut tracker = seeded(&[(0, 0), (100, 0), (200, 0)], UnmatchedPolicy::Exclusive);

        // 只有 (2,0) 能匹配到 #0; (500,500) 距离过远
        let objects = tracker.update(&[bbox_at(2, 0), bbox_at(500, 500)]);

        assert_eq!(objects.len(), 3);
        assert_eq!(objects[&0], Position::new(2, 0));
        assert_eq!(tracker.disappeared(0), Some(0));
        assert_eq!(tracker.disappeared(1), Some(1));
        assert_eq!(tracker.disappeared(2), Some(1));
        assert_eq!(tracker.next_id(), 3);
    }

    #[test]
    fn test_more_cols_registers_unmatched_without_aging() {
        let mut tracker = seeded(&[(0, 0), (100, 0)], UnmatchedPolicy::Exclusive);

        let objects = tracker.update(&[bbox_at(3, 0), bbox_at(103, 0), bbox_at(300, 300)]);

        assert_eq!(objects.len(), 3);
        assert_eq!(objects[&0], Position::new(3, 0));
        assert_eq!(objects[&1], Position::new(103, 0));
        assert_eq!(objects[&2], Position::new(300, 300));
    }

    #[test]
    fn test_more_cols_leaves_unmatched_rows_unaged() {
        let mut tracker = seeded(&[(0, 0), (100, 0)], UnmatchedPolicy::Exclusive);

        // #1 没有匹配,但新中心点更多,所以本帧不老化
        tracker.update(&[bbox_at(3, 0), bbox_at(300, 300), bbox_at(600, 600)]);

        assert_eq!(tracker.disappeared(1), Some(0));
        assert_eq!(tracker.track_count(), 4);
    }

    #[test]
    fn test_both_policy_ages_and_registers() {
        let mut tracker = seeded(&[(0, 0), (100, 0), (200, 0)], UnmatchedPolicy::Both);

        let objects = tracker.update(&[bbox_at(2, 0), bbox_at(500, 500)]);

        assert_eq!(objects.len(), 4);
        assert_eq!(objects[&3], Position::new(500, 500));
        assert_eq!(tracker.disappeared(1), Some(1));
    }

    #[test]
    fn test_distance_at_threshold_is_accepted() {
        let mut tracker = seeded(&[(0, 0)], UnmatchedPolicy::Exclusive);
        let objects = tracker.update(&[bbox_at(30, 40)]);
        assert_eq!(objects[&0], Position::new(30, 40));

        let objects = tracker.update(&[bbox_at(61, 80)]);
        assert_eq!(objects[&0], Position::new(30, 40));
        assert_eq!(tracker.disappeared(0), Some(1));
    }

    #[test]
    fn test_closest_row_claims_contested_column() {
        let mut tracker = seeded(&[(0, 0), (30, 0)], UnmatchedPolicy::Exclusive);

        // 两个旧目标都最靠近同一个新中心点, #1 更近
        let objects = tracker.update(&[bbox_at(25, 0), bbox_at(400, 400)]);

        assert_eq!(objects[&1], Position::new(25, 0));
        assert_eq!(objects[&0], Position::new(0, 0));
        assert_eq!(tracker.disappeared(0), Some(1));
        assert_eq!(tracker.track_count(), 2);
    }

    #[test]
    fn test_malformed_only_frame_counts_as_empty() {
        let mut tracker = seeded(&[(50, 50)], UnmatchedPolicy::Exclusive);
        let objects = tracker.update(&[BBox::new(10.0, 10.0, 5.0, 20.0)]);
        assert_eq!(objects.len(), 1);
        assert_eq!(tracker.disappeared(0), Some(1));
    }

    #[test]
    fn test_reset_keeps_ids_unique() {
        let mut tracker = seeded(&[(0, 0), (100, 100)], UnmatchedPolicy::Exclusive);
        tracker.reset();
        assert_eq!(tracker.track_count(), 0);

        let objects = tracker.update(&[bbox_at(0, 0)]);
        assert!(objects.contains_key(&2));
    }

    #[test]
    fn test_far_apart_boxes_do_not_overflow() {
        let mut tracker = CentroidTracker::new(40, 50.0);
        tracker.update(&[BBox::new(-3.0e9, -3.0e9, -2.9e9, -2.9e9)]);
        let objects = tracker.update(&[BBox::new(2.9e9, 2.9e9, 3.0e9, 3.0e9)]);

        // 距离远超阈值: 原目标老化, 新框不注册
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[&0], Position::new(i32::MIN, i32::MIN));
        assert_eq!(tracker.disappeared(0), Some(1));
        assert_eq!(tracker.next_id(), 1);
    }

    #[test]
    fn test_disappeared_count_saturates() {
        let mut tracker = CentroidTracker::new(u32::MAX, 50.0);
        tracker.update(&[bbox_at(100, 100)]);
        if let Some(obj) = tracker.objects.get_mut(&0) {
            obj.disappeared = u32::MAX - 1;
        }

        tracker.update(&[]);
        tracker.update(&[]);
        assert_eq!(tracker.disappeared(0), Some(u32::MAX));
        assert_eq!(tracker.track_count(), 1);
    }
}
