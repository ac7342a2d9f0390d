/// 系统架构 (System Architecture)
///
/// 两个后台工作线程 + 一个帧处理上下文:
/// - Frame context:   质心跟踪 + 越线计数 (调用方线程,逐帧同步执行)
/// - Luma producer:   环境亮度采样 (独立线程)
/// - Dispatcher:      遥测分发 (独立线程)
///
/// 三者之间唯一共享的是遥测事件队列
use std::thread::JoinHandle;

use log::{error, info};

use crate::config::CounterConfig;
use crate::detection::{
    BBox, CentroidTracker, CrossingCounter, CrossingEvent, CrossingTotals, Tracker,
};
use crate::luma::{LumaProducer, LumaSource};
use crate::shutdown::Shutdown;
use crate::telemetry::{
    event_queue, DispatchStats, Dispatcher, EventProducer, HttpSender, TelemetryError,
    TelemetryEvent, TelemetryKind, TelemetrySender,
};

/// 两个通道的发送器 (会话已建立)
pub struct Senders {
    pub entry: Box<dyn TelemetrySender>,
    pub luma: Box<dyn TelemetrySender>,
}

impl Senders {
    /// 按配置建立两个 HTTP 会话, 任一失败即返回错误
    pub fn connect(config: &CounterConfig) -> Result<Self, TelemetryError> {
        let entry = HttpSender::connect(
            &config.host,
            &config.entry_token,
            TelemetryKind::Entry,
            config.send_timeout(),
        )?;
        let luma = HttpSender::connect(
            &config.host,
            &config.luma_token,
            TelemetryKind::Luma,
            config.send_timeout(),
        )?;
        Ok(Self {
            entry: Box::new(entry),
            luma: Box::new(luma),
        })
    }
}

/// 停止后的运行报告
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemReport {
    pub frames: u64,
    pub totals: CrossingTotals,
    pub dispatch: DispatchStats,
    pub luma_samples: u64,
}

/// 客流计数系统
pub struct EntrySystem {
    tracker: CentroidTracker,
    counter: CrossingCounter,
    producer: EventProducer,
    prune_trajectories: bool,
    frames: u64,

    luma_shutdown: Shutdown,
    luma_handle: Option<JoinHandle<u64>>,
    dispatch_shutdown: Shutdown,
    dispatch_handle: JoinHandle<DispatchStats>,
}

impl EntrySystem {
    /// 启动后台线程; 不提供亮度来源时不启动采样线程
    pub fn start(
        config: &CounterConfig,
        senders: Senders,
        luma_source: Option<Box<dyn LumaSource + Send>>,
    ) -> Result<Self, TelemetryError> {
        let (producer, queue) = event_queue();

        let dispatch_shutdown = Shutdown::new();
        let dispatch_handle = Dispatcher::new(
            queue,
            senders.entry,
            senders.luma,
            config.drain_timeout(),
        )
        .spawn(dispatch_shutdown.signal())?;

        // 启动失败时 dispatch_shutdown 被 drop, 分发线程随之退出
        let luma_shutdown = Shutdown::new();
        let luma_handle = match luma_source {
            Some(source) => Some(LumaProducer::spawn(
                source,
                producer.clone(),
                config.luma_interval(),
                luma_shutdown.signal(),
            )?),
            None => None,
        };

        let tracker = CentroidTracker::new(
            config.max_disappeared_frames,
            config.max_match_distance,
        )
        .with_policy(config.unmatched_policy);
        let counter = CrossingCounter::new(config.frame_height);

        info!(
            "🚀 客流计数系统启动 (中线 y={}, 亮度采样: {})",
            counter.midline(),
            if luma_handle.is_some() { "开启" } else { "关闭" }
        );

        Ok(Self {
            tracker,
            counter,
            producer,
            prune_trajectories: config.prune_trajectories,
            frames: 0,
            luma_shutdown,
            luma_handle,
            dispatch_shutdown,
            dispatch_handle,
        })
    }

    /// 处理一帧检测框, 越线事件同时推入遥测队列
    pub fn process_frame(&mut self, boxes: &[BBox]) -> Vec<CrossingEvent> {
        let objects = self.tracker.update(boxes);
        let events = self.counter.process(&objects);

        for event in &events {
            self.producer.push(TelemetryEvent::from(event.clone()));
        }
        if self.prune_trajectories {
            self.counter.retain_active(&objects);
        }

        self.frames += 1;
        events
    }

    /// 额外的遥测生产者 (例如其它线程上的事件来源)
    pub fn producer(&self) -> EventProducer {
        self.producer.clone()
    }

    pub fn totals(&self) -> CrossingTotals {
        self.counter.totals()
    }

    pub fn track_count(&self) -> usize {
        self.tracker.track_count()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 停止并等待所有后台线程退出
    ///
    /// 先停亮度采样,保证它产生的事件都已入队,再停分发器并排空队列
    pub fn shutdown(mut self) -> SystemReport {
        self.luma_shutdown.trigger();
        let luma_samples = match self.luma_handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                error!("❌ 亮度采样线程异常退出");
                0
            }),
            None => 0,
        };

        self.dispatch_shutdown.trigger();
        let dispatch = self.dispatch_handle.join().unwrap_or_else(|_| {
            error!("❌ 遥测分发线程异常退出");
            DispatchStats::default()
        });

        let report = SystemReport {
            frames: self.frames,
            totals: self.counter.totals(),
            dispatch,
            luma_samples,
        };
        info!(
            "🛑 系统已停止: {} 帧 | 进入 {} | 离开 {} | 场内 {} | 遥测成功 {} 失败 {}",
            report.frames,
            report.totals.entered,
            report.totals.left,
            report.totals.inside,
            report.dispatch.delivered,
            report.dispatch.failed
        );
        report
    }
}
