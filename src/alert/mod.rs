// Alert delivery port
//
// Alerts are best-effort: delivery failures are logged and never affect
// the trading cycle.

/// Notification collaborator
#[allow(async_fn_in_trait)]
pub trait Alerter: Send + Sync {
    async fn send(&self, message: &str);
}

/// Logs alerts without delivering them anywhere
#[derive(Default)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    async fn send(&self, message: &str) {
        tracing::warn!("ALERT: {}", message);
    }
}

/// Telegram bot alerter
pub struct TelegramAlerter {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramAlerter {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }
}

impl Alerter for TelegramAlerter {
    async fn send(&self, message: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let params = [("chat_id", self.chat_id.as_str()), ("text", message)];

        match self.client.post(&url).form(&params).send().await {
            Ok(response) => {
                if !response.status().is_success() {
                    tracing::warn!("Telegram send failed: {}", response.status());
                }
            }
            Err(e) => {
                tracing::warn!("Telegram error: {}", e);
            }
        }
    }
}

/// Runtime-selected alert sink
pub enum AlertSink {
    Telegram(TelegramAlerter),
    Log(LogAlerter),
}

impl Alerter for AlertSink {
    async fn send(&self, message: &str) {
        match self {
            AlertSink::Telegram(alerter) => alerter.send(message).await,
            AlertSink::Log(alerter) => alerter.send(message).await,
        }
    }
}
