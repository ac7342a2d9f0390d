/// 遥测事件定义
/// Telemetry events: one variant per logical channel
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use crate::detection::{CrossingEvent, Direction};
use crate::luma::LumaValues;

fn serialize_timestamp<S: Serializer>(t: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&crate::iso_timestamp(t))
}

/// 越线遥测 (entry 通道)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryTelemetry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub direction: Direction,
}

/// 环境亮度遥测 (luma 通道)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LumaTelemetry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    #[serde(flatten)]
    pub values: LumaValues,
}

/// 遥测通道
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TelemetryKind {
    Entry,
    Luma,
}

impl TelemetryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryKind::Entry => "entry",
            TelemetryKind::Luma => "luma",
        }
    }
}

impl std::fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 遥测事件 (生产者 → 队列 → 分发器)
#[derive(Clone, Debug, PartialEq)]
pub enum TelemetryEvent {
    Crossing(EntryTelemetry),
    Ambient(LumaTelemetry),
}

impl TelemetryEvent {
    pub fn crossing(direction: Direction) -> Self {
        TelemetryEvent::Crossing(EntryTelemetry {
            timestamp: Local::now(),
            direction,
        })
    }

    pub fn ambient(values: LumaValues) -> Self {
        TelemetryEvent::Ambient(LumaTelemetry {
            timestamp: Local::now(),
            values,
        })
    }

    pub fn kind(&self) -> TelemetryKind {
        match self {
            TelemetryEvent::Crossing(_) => TelemetryKind::Entry,
            TelemetryEvent::Ambient(_) => TelemetryKind::Luma,
        }
    }

    /// 序列化为上报用的JSON
    pub fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            TelemetryEvent::Crossing(t) => serde_json::to_value(t),
            TelemetryEvent::Ambient(t) => serde_json::to_value(t),
        }
    }
}

impl From<CrossingEvent> for TelemetryEvent {
    fn from(event: CrossingEvent) -> Self {
        TelemetryEvent::Crossing(EntryTelemetry {
            timestamp: event.timestamp,
            direction: event.direction,
        })
    }
}
