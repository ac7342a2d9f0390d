//! 遥测事件队列 (多生产者单消费者)
//! 无界队列: 生产者 push 永不阻塞,帧处理线程不会被网络拖慢

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

use super::TelemetryEvent;

/// 创建事件队列,返回 (生产者, 消费端)
pub fn event_queue() -> (EventProducer, EventQueue) {
    let (tx, rx) = unbounded();
    (EventProducer { tx }, EventQueue { rx })
}

/// 生产者句柄,可任意克隆到各个生产线程
#[derive(Clone)]
pub struct EventProducer {
    tx: Sender<TelemetryEvent>,
}

impl EventProducer {
    /// 入队, 消费端已关闭时返回 false (事件丢弃)
    pub fn push(&self, event: TelemetryEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                debug!("遥测队列已关闭, 丢弃 {} 事件", e.into_inner().kind());
                false
            }
        }
    }
}

/// 消费端 (只归分发器所有)
pub struct EventQueue {
    rx: Receiver<TelemetryEvent>,
}

impl EventQueue {
    pub(crate) fn receiver(&self) -> &Receiver<TelemetryEvent> {
        &self.rx
    }

    /// 当前排队的事件数
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// 非阻塞出队
    pub fn try_pop(&self) -> Option<TelemetryEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Direction;
    use crate::luma::LumaValues;
    use std::thread;

    #[test]
    fn test_concurrent_producers_keep_their_own_order() {
        let (producer, queue) = event_queue();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let producer = producer.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let values = LumaValues {
                            mean_luma: (worker * 1000 + i) as f64,
                            ..Default::default()
                        };
                        assert!(producer.push(TelemetryEvent::ambient(values)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(queue.len(), 200);
        let mut last = [-1.0f64; 4];
        while let Some(event) = queue.try_pop() {
            if let TelemetryEvent::Ambient(t) = event {
                let worker = (t.values.mean_luma / 1000.0) as usize;
                assert!(t.values.mean_luma > last[worker]);
                last[worker] = t.values.mean_luma;
            }
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_after_consumer_dropped() {
        let (producer, queue) = event_queue();
        drop(queue);
        assert!(!producer.push(TelemetryEvent::crossing(Direction::Up)));
    }
}
