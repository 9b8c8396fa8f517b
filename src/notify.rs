use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, info};

use crate::validate::MailData;

/// One inbound mail was received. `mail` is the persisted row, or `None`
/// when persistence is disabled.
pub struct InboundMailEvent {
    pub mail_data: MailData,
    pub mail: Option<entity::inbound_mail::Model>,
}

#[async_trait]
pub trait InboundMailListener: Send + Sync {
    async fn on_inbound_mail(&self, event: &InboundMailEvent) -> anyhow::Result<()>;
}

/// Best-effort broadcast to registered listeners. A listener that errors or
/// panics is logged and skipped; it never stops the remaining listeners and
/// never fails the webhook call.
#[derive(Default)]
pub struct MailBroadcaster {
    listeners: Vec<Arc<dyn InboundMailListener>>,
}

impl MailBroadcaster {
    pub fn register(&mut self, listener: Arc<dyn InboundMailListener>) {
        self.listeners.push(listener);
    }

    pub async fn send(&self, event: &InboundMailEvent) {
        for listener in &self.listeners {
            match AssertUnwindSafe(listener.on_inbound_mail(event))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(error = %err, "inbound mail listener failed"),
                Err(_) => error!("inbound mail listener panicked"),
            }
        }
    }
}

/// Default listener wired up by the binary; records each received mail in
/// the log. At debug level the full validated data is logged, with
/// attachment content re-encoded to base64 when configured.
pub struct LogListener {
    pub encode_attachments: bool,
}

#[async_trait]
impl InboundMailListener for LogListener {
    async fn on_inbound_mail(&self, event: &InboundMailEvent) -> anyhow::Result<()> {
        info!(
            message_id = %event.mail_data.message_id,
            from = %event.mail_data.from_email,
            saved = event.mail.is_some(),
            "inbound mail received"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(mail = %event.mail_data.to_json(self.encode_attachments), "validated mail data");
        }
        Ok(())
    }
}
