//! 遥测管线端到端测试: 多生产者 → 队列 → 分发器 → 各通道发送器

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use footfall_rs::detection::{BBox, Direction};
use footfall_rs::luma::LumaValues;
use footfall_rs::shutdown::Shutdown;
use footfall_rs::telemetry::{
    event_queue, Dispatcher, TelemetryError, TelemetryEvent, TelemetrySender,
};
use footfall_rs::{CounterConfig, EntrySystem, Senders};

type Sent = Arc<Mutex<Vec<serde_json::Value>>>;

struct Recorder {
    channel: &'static str,
    sent: Sent,
}

impl TelemetrySender for Recorder {
    fn channel(&self) -> &str {
        self.channel
    }

    fn send(&mut self, payload: &serde_json::Value) -> Result<(), TelemetryError> {
        self.sent.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

fn recorders() -> (Box<Recorder>, Sent, Box<Recorder>, Sent) {
    let entry_sent = Sent::default();
    let luma_sent = Sent::default();
    (
        Box::new(Recorder {
            channel: "entry",
            sent: entry_sent.clone(),
        }),
        entry_sent,
        Box::new(Recorder {
            channel: "luma",
            sent: luma_sent.clone(),
        }),
        luma_sent,
    )
}

fn ambient(mean_luma: f64) -> TelemetryEvent {
    TelemetryEvent::ambient(LumaValues {
        mean_luma,
        ..Default::default()
    })
}

#[test]
fn test_concurrent_producers_deliver_exactly_once_in_order() {
    const PER_PRODUCER: usize = 200;

    let (producer, queue) = event_queue();
    let (entry, entry_sent, luma, luma_sent) = recorders();
    let mut shutdown = Shutdown::new();
    let dispatcher = Dispatcher::new(queue, entry, luma, Duration::from_secs(5))
        .spawn(shutdown.signal())
        .unwrap();

    let crossings = {
        let producer = producer.clone();
        thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                let direction = if i % 2 == 0 { Direction::Up } else { Direction::Down };
                assert!(producer.push(TelemetryEvent::crossing(direction)));
            }
        })
    };
    let samples = {
        let producer = producer.clone();
        thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                assert!(producer.push(ambient(i as f64)));
            }
        })
    };
    crossings.join().unwrap();
    samples.join().unwrap();

    shutdown.trigger();
    let stats = dispatcher.join().unwrap();
    assert_eq!(stats.delivered, 2 * PER_PRODUCER as u64);
    assert_eq!(stats.failed, 0);

    let entry_sent = entry_sent.lock().unwrap();
    assert_eq!(entry_sent.len(), PER_PRODUCER);
    for (i, payload) in entry_sent.iter().enumerate() {
        let expected = if i % 2 == 0 { "UP" } else { "DOWN" };
        assert_eq!(payload["direction"], expected);
    }

    let luma_sent = luma_sent.lock().unwrap();
    assert_eq!(luma_sent.len(), PER_PRODUCER);
    for (i, payload) in luma_sent.iter().enumerate() {
        assert_eq!(payload["mean_luma"], i as f64);
    }
}

#[test]
fn test_push_after_dispatcher_exit_is_dropped() {
    let (producer, queue) = event_queue();
    let (entry, _, luma, _) = recorders();
    let mut shutdown = Shutdown::new();
    shutdown.trigger();
    Dispatcher::new(queue, entry, luma, Duration::from_millis(100)).run(shutdown.signal());

    assert!(!producer.push(TelemetryEvent::crossing(Direction::Up)));
}

#[test]
fn test_crossing_and_ambient_route_to_their_channels() {
    let config = CounterConfig {
        frame_height: 480,
        ..Default::default()
    };
    let (entry, entry_sent, luma, luma_sent) = recorders();
    let senders = Senders { entry, luma };
    let mut system = EntrySystem::start(&config, senders, None).unwrap();

    // 从画面下方向上走过中线 (y=240)
    for cy in [400.0, 360.0, 320.0, 280.0, 230.0, 200.0] {
        let bbox = BBox::new(300.0, cy - 40.0, 340.0, cy + 40.0);
        system.process_frame(&[bbox]);
    }
    system.producer().push(ambient(0.42));

    let report = system.shutdown();
    assert_eq!(report.totals.left, 1);
    assert_eq!(report.totals.entered, 0);
    assert_eq!(report.dispatch.delivered, 2);

    let entry_sent = entry_sent.lock().unwrap();
    assert_eq!(entry_sent.len(), 1);
    assert_eq!(entry_sent[0]["direction"], "UP");
    assert!(entry_sent[0]["timestamp"].is_string());

    let luma_sent = luma_sent.lock().unwrap();
    assert_eq!(luma_sent.len(), 1);
    assert_eq!(luma_sent[0]["mean_luma"], 0.42);
    assert!(luma_sent[0].get("direction").is_none());
}
