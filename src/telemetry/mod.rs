/// 遥测系统 (Telemetry System)
///
/// 多生产者单消费者架构:
/// - 生产者: 帧处理线程 (越线事件), 亮度采样线程 (环境亮度)
/// - 队列:   无界 crossbeam 通道,生产者永不阻塞
/// - 分发器: 独立线程,按事件类型路由到各自通道的发送器
pub mod dispatcher;
pub mod events;
pub mod queue;
pub mod sender;

use thiserror::Error;

pub use dispatcher::{DispatchStats, Dispatcher};
pub use events::{EntryTelemetry, LumaTelemetry, TelemetryEvent, TelemetryKind};
pub use queue::{event_queue, EventProducer, EventQueue};
pub use sender::{HttpSender, TelemetrySender};

/// 遥测错误
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{channel} 通道会话建立失败: {reason}")]
    SessionEstablish { channel: String, reason: String },

    #[error("{channel} 通道发送失败: {reason}")]
    Send { channel: String, reason: String },

    #[error("遥测线程启动失败: {0}")]
    Spawn(#[from] std::io::Error),
}
