pub mod config; // 计数配置参数
pub mod detection; // 质心跟踪 + 越线计数
pub mod luma; // 环境亮度采样
pub mod shutdown; // 线程停止信号
pub mod systems; // 系统装配
pub mod telemetry; // 遥测队列与分发

pub use crate::config::{Args, CounterConfig};
pub use crate::detection::{
    BBox, BoxSource, CentroidTracker, CrossingCounter, CrossingEvent, Direction, JsonLinesSource,
    Tracker,
};
pub use crate::luma::{LumaCalculator, LumaValues, SnapshotSource};
pub use crate::systems::{EntrySystem, Senders, SystemReport};
pub use crate::telemetry::{TelemetryEvent, TelemetrySender};

use chrono::{DateTime, Local};

/// 遥测时间戳: 本地时间, 微秒精度
pub fn iso_timestamp(t: &DateTime<Local>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_timestamp_format() {
        let t = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(iso_timestamp(&t), "2024-03-09 14:05:07.000000");
    }
}
