//! 越线计数 (Crossing counter)
//! 职责: 订阅每帧的活跃目标快照 → 维护轨迹 → 每个目标最多产生一次越线事件

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Local};
use log::info;

use super::tracker::ActiveObjects;
use super::types::{Direction, Position};

/// 单个目标的轨迹
#[derive(Clone, Debug)]
pub struct Trajectory {
    pub id: u64,

    /// 历史中心点 (只追加)
    history: Vec<Position>,

    /// 是否已计数 (一旦置位永不回退)
    counted: bool,
}

impl Trajectory {
    fn new(id: u64, position: Position) -> Self {
        Self {
            id,
            history: vec![position],
            counted: false,
        }
    }

    pub fn history(&self) -> &[Position] {
        &self.history
    }

    pub fn counted(&self) -> bool {
        self.counted
    }

    fn mean_y(&self) -> f64 {
        let sum: f64 = self.history.iter().map(|p| p.y as f64).sum();
        sum / self.history.len() as f64
    }
}

/// 越线事件
#[derive(Clone, Debug, PartialEq)]
pub struct CrossingEvent {
    pub id: u64,
    pub direction: Direction,
    pub timestamp: DateTime<Local>,
}

/// 累计进出人数: DOWN 记为进入, UP 记为离开
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CrossingTotals {
    pub entered: u64,
    pub left: u64,
    pub inside: i64,
}

/// 越线计数器
pub struct CrossingCounter {
    trajectories: HashMap<u64, Trajectory>,

    /// 水平中线 (像素)
    midline: i32,

    totals: CrossingTotals,
}

impl CrossingCounter {
    /// 由画面高度创建,中线为 `frame_height / 2` (向下取整)
    pub fn new(frame_height: u32) -> Self {
        Self::with_midline((frame_height / 2) as i32)
    }

    pub fn with_midline(midline: i32) -> Self {
        Self {
            trajectories: HashMap::new(),
            midline,
            totals: CrossingTotals::default(),
        }
    }

    pub fn midline(&self) -> i32 {
        self.midline
    }

    pub fn totals(&self) -> CrossingTotals {
        self.totals
    }

    pub fn trajectory(&self, id: u64) -> Option<&Trajectory> {
        self.trajectories.get(&id)
    }

    pub fn trajectory_count(&self) -> usize {
        self.trajectories.len()
    }

    /// 处理一帧的活跃目标,返回本帧产生的越线事件
    pub fn process(&mut self, current: &ActiveObjects) -> Vec<CrossingEvent> {
        let now = Local::now();
        let mut events = Vec::new();

        for (&id, &position) in current {
            let trajectory = match self.trajectories.entry(id) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    slot.insert(Trajectory::new(id, position));
                    continue;
                }
            };

            // 方向 = 当前 y - 历史 y 均值 (追加前)
            let prior_mean_y = trajectory.mean_y();
            trajectory.history.push(position);
            if trajectory.counted {
                continue;
            }

            let movement = position.y as f64 - prior_mean_y;
            let direction = if movement < 0.0 && position.y < self.midline {
                Direction::Up
            } else if movement > 0.0 && position.y > self.midline {
                Direction::Down
            } else {
                continue;
            };

            trajectory.counted = true;
            match direction {
                Direction::Up => self.totals.left += 1,
                Direction::Down => self.totals.entered += 1,
            }
            self.totals.inside = self.totals.entered as i64 - self.totals.left as i64;

            info!(
                "🚶 目标 #{} 越线: {} (进入 {} | 离开 {} | 场内 {})",
                id, direction, self.totals.entered, self.totals.left, self.totals.inside
            );
            events.push(CrossingEvent {
                id,
                direction,
                timestamp: now,
            });
        }

        events
    }

    /// 丢弃已不在活跃集合中的轨迹
    ///
    /// 被移除的ID不会再出现,因此不影响后续事件
    pub fn retain_active(&mut self, current: &ActiveObjects) -> usize {
        let before = self.trajectories.len();
        self.trajectories.retain(|id, _| current.contains_key(id));
        before - self.trajectories.len()
    }
}
