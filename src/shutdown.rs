//! 协作式停止信号
//! 所有后台线程持有一个 `ShutdownSignal`, `Shutdown::trigger` 之后各线程在下一轮循环退出

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// 停止信号的持有方 (只有它能触发停止)
pub struct Shutdown {
    tx: Option<Sender<()>>,
    rx: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self { tx: Some(tx), rx }
    }

    /// 派发给后台线程的信号
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.rx.clone(),
        }
    }

    /// 触发停止: 关闭发送端,所有 `ShutdownSignal` 的接收立即返回
    pub fn trigger(&mut self) {
        self.tx.take();
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.is_none()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// 后台线程侧的停止信号
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

impl ShutdownSignal {
    /// 用于 `crossbeam_channel::select!`, 通道断开即表示停止
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}
