//! 遥测分发器 (Dispatcher)
//! 职责: 阻塞接收队列事件 → 按类型路由到对应发送器 → 同步发送
//!
//! 发送失败只记录告警,不重试也不回队;停止后在限定时间内排空队列再关闭会话

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::select;
use log::{debug, info, warn};

use super::{EventQueue, TelemetryError, TelemetryEvent, TelemetryKind, TelemetrySender};
use crate::shutdown::ShutdownSignal;

/// 分发统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 发送成功数
    pub delivered: u64,
    /// 发送失败数 (已丢弃)
    pub failed: u64,
    /// 停止时排空超时而未发送的事件数
    pub dropped_on_shutdown: u64,
}

pub struct Dispatcher {
    queue: EventQueue,
    entry: Box<dyn TelemetrySender>,
    luma: Box<dyn TelemetrySender>,
    drain_timeout: Duration,
    stats: DispatchStats,
}

impl Dispatcher {
    /// 发送器必须已经建立好会话
    pub fn new(
        queue: EventQueue,
        entry: Box<dyn TelemetrySender>,
        luma: Box<dyn TelemetrySender>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            entry,
            luma,
            drain_timeout,
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// 路由并发送单个事件
    pub fn dispatch(&mut self, event: TelemetryEvent) {
        let kind = event.kind();
        let payload = match event.to_payload() {
            Ok(p) => p,
            Err(e) => {
                self.stats.failed += 1;
                warn!("⚠️ {} 事件序列化失败, 已丢弃: {}", kind, e);
                return;
            }
        };

        let sender = match kind {
            TelemetryKind::Entry => &mut self.entry,
            TelemetryKind::Luma => &mut self.luma,
        };

        match sender.send(&payload) {
            Ok(()) => {
                self.stats.delivered += 1;
                debug!("📤 {} -> {}", sender.channel(), payload);
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!("⚠️ 遥测发送失败, 已丢弃: {}", e);
            }
        }
    }

    /// 分发循环, 直到收到停止信号或所有生产者都已退出
    pub fn run(mut self, signal: ShutdownSignal) -> DispatchStats {
        info!("📡 遥测分发器启动");

        loop {
            select! {
                recv(self.queue.receiver()) -> msg => match msg {
                    Ok(event) => self.dispatch(event),
                    Err(_) => {
                        debug!("所有生产者已退出");
                        break;
                    }
                },
                recv(signal.receiver()) -> _ => break,
            }
        }

        self.drain();
        self.entry.close();
        self.luma.close();

        info!(
            "📡 遥测分发器退出: 成功 {} | 失败 {} | 未发送 {}",
            self.stats.delivered, self.stats.failed, self.stats.dropped_on_shutdown
        );
        self.stats
    }

    /// 在独立线程中运行
    pub fn spawn(
        self,
        signal: ShutdownSignal,
    ) -> Result<JoinHandle<DispatchStats>, TelemetryError> {
        let handle = thread::Builder::new()
            .name("telemetry-dispatcher".to_string())
            .spawn(move || self.run(signal))?;
        Ok(handle)
    }

    /// 停止后排空队列, 超出时间预算的事件丢弃
    fn drain(&mut self) {
        let deadline = Instant::now() + self.drain_timeout;
        while let Some(event) = self.queue.try_pop() {
            if Instant::now() >= deadline {
                let dropped = 1 + self.queue.len() as u64;
                self.stats.dropped_on_shutdown += dropped;
                warn!("⏱️ 排空超时, 丢弃 {} 条未发送遥测", dropped);
                break;
            }
            self.dispatch(event);
        }
    }
}
