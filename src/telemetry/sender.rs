//! 遥测发送器 (每个通道一个持久会话)
//!
//! 上报协议为 ThingsBoard 设备 HTTP API:
//! - 建立会话: `GET  {host}/api/v1/{token}/attributes` 返回 2xx 即认为令牌有效
//! - 上报遥测: `POST {host}/api/v1/{token}/telemetry`, body 为 JSON

use std::time::Duration;

use log::{debug, info};
use ureq::{Agent, AgentBuilder};

use super::{TelemetryError, TelemetryKind};

/// 发送器 Trait
///
/// 分发器同步调用 `send`,实现方负责自己的超时
pub trait TelemetrySender: Send {
    /// 通道名 (用于日志)
    fn channel(&self) -> &str;

    /// 发送一条遥测
    fn send(&mut self, payload: &serde_json::Value) -> Result<(), TelemetryError>;

    /// 关闭会话
    fn close(&mut self) {}
}

/// 基于 HTTP 的发送器,持有一个 keep-alive 的 `ureq::Agent`
pub struct HttpSender {
    agent: Agent,
    telemetry_url: String,
    channel: String,
    closed: bool,
}

impl HttpSender {
    /// 建立会话 (启动阶段调用,失败即为致命错误)
    pub fn connect(
        host: &str,
        token: &str,
        kind: TelemetryKind,
        timeout: Duration,
    ) -> Result<Self, TelemetryError> {
        let channel = kind.as_str().to_string();
        let establish_err = |reason: String| TelemetryError::SessionEstablish {
            channel: channel.clone(),
            reason,
        };

        if token.trim().is_empty() {
            return Err(establish_err("未配置设备令牌".to_string()));
        }

        let base = format!("{}/api/v1/{}", host.trim_end_matches('/'), token.trim());
        let agent = AgentBuilder::new().timeout(timeout).build();

        match agent.get(&format!("{}/attributes", base)).call() {
            Ok(resp) => debug!("{} 通道会话探测: HTTP {}", channel, resp.status()),
            Err(ureq::Error::Status(code, _)) => {
                return Err(establish_err(format!("服务端返回 HTTP {}", code)))
            }
            Err(ureq::Error::Transport(t)) => return Err(establish_err(t.to_string())),
        }

        info!(
            "🔗 {} 通道会话已建立: {} (令牌 {})",
            channel,
            host,
            mask_token(token.trim())
        );

        Ok(Self {
            agent,
            telemetry_url: format!("{}/telemetry", base),
            channel,
            closed: false,
        })
    }
}

impl TelemetrySender for HttpSender {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn send(&mut self, payload: &serde_json::Value) -> Result<(), TelemetryError> {
        if self.closed {
            return Err(TelemetryError::Send {
                channel: self.channel.clone(),
                reason: "会话已关闭".to_string(),
            });
        }

        let reason = match self.agent.post(&self.telemetry_url).send_json(payload) {
            Ok(_) => return Ok(()),
            Err(ureq::Error::Status(code, _)) => format!("服务端返回 HTTP {}", code),
            Err(ureq::Error::Transport(t)) => t.to_string(),
        };
        Err(TelemetryError::Send {
            channel: self.channel.clone(),
            reason,
        })
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            info!("🔌 {} 通道会话已关闭", self.channel);
        }
    }
}

/// 日志里只显示令牌前4位
fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{}****", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("8JpXCiP482pz"), "8JpX****");
        assert_eq!(mask_token("ab"), "ab****");
    }

    #[test]
    fn test_empty_token_is_rejected_before_network() {
        let err = HttpSender::connect(
            "http://127.0.0.1:9",
            "  ",
            TelemetryKind::Luma,
            Duration::from_millis(100),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            TelemetryError::SessionEstablish { ref channel, .. } if channel == "luma"
        ));
    }
}
