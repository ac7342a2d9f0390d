//! 环境亮度采样线程
//! 职责: 每隔固定间隔采样一次 → 推送 Ambient 遥测事件

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, tick};
use log::{debug, info, warn};

use super::LumaSource;
use crate::shutdown::ShutdownSignal;
use crate::telemetry::{EventProducer, TelemetryEvent};

pub struct LumaProducer;

impl LumaProducer {
    /// 启动采样线程,线程结束时返回推送的事件数
    pub fn spawn<S>(
        mut source: S,
        producer: EventProducer,
        interval: Duration,
        signal: ShutdownSignal,
    ) -> std::io::Result<JoinHandle<u64>>
    where
        S: LumaSource + Send + 'static,
    {
        thread::Builder::new()
            .name("luma-producer".to_string())
            .spawn(move || {
                info!("💡 亮度采样线程启动 (间隔 {:?})", interval);
                let ticker = tick(interval);
                let mut pushed = 0u64;

                loop {
                    select! {
                        recv(ticker) -> _ => match source.sample() {
                            Ok(Some(values)) => {
                                if producer.push(TelemetryEvent::ambient(values)) {
                                    pushed += 1;
                                }
                            }
                            Ok(None) => debug!("暂无可用画面,跳过本次亮度采样"),
                            Err(e) => warn!("⚠️ 亮度采样失败: {}", e),
                        },
                        recv(signal.receiver()) -> _ => break,
                    }
                }

                info!("💡 亮度采样线程退出 (共推送 {} 条)", pushed);
                pushed
            })
    }
}
