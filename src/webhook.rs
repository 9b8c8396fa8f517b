use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::debug;

use crate::error::WebhookError;
use crate::normalize::underscoreize;
use crate::notify::{InboundMailEvent, MailBroadcaster};
use crate::persist::save_inbound_mail;
use crate::settings::Settings;
use crate::storage::{AttachmentStore, ContentSniffer, InferSniffer};
use crate::validate::validate_mail;

pub struct AppState {
    pub settings: Settings,
    pub db: Option<DatabaseConnection>,
    pub store: AttachmentStore,
    pub sniffer: Box<dyn ContentSniffer>,
    pub broadcaster: MailBroadcaster,
}

impl AppState {
    pub fn new(settings: Settings, db: Option<DatabaseConnection>) -> Self {
        let store = AttachmentStore::new(settings.attachment_upload_to());
        Self {
            settings,
            db,
            store,
            sniffer: Box::new(InferSniffer),
            broadcaster: MailBroadcaster::default(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook/inbound", post(receive_inbound_mail))
        .with_state(state)
}

/// One request, one unit of work: authenticate the caller address, parse
/// and normalize the body, validate, persist (unless disabled), broadcast,
/// acknowledge.
async fn receive_inbound_mail(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookError> {
    let caller = forwarded_ip(&headers).unwrap_or_else(|| peer.ip());
    if !state.settings.allows(caller) {
        debug!(%caller, "rejected webhook call from unlisted address");
        return Err(WebhookError::Forbidden);
    }

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|err| WebhookError::Parse(err.to_string()))?;

    let mail_data = validate_mail(underscoreize(payload), state.sniffer.as_ref())?;

    let mail = match &state.db {
        Some(db) if state.settings.save_mail_to_db() => {
            Some(save_inbound_mail(db, &state.store, &mail_data).await?)
        }
        _ => None,
    };

    let event = InboundMailEvent { mail_data, mail };
    state.broadcaster.send(&event).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "detail": "Inbound mail received. Thanks Postmark!" })),
    ))
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_address_wins_when_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("50.31.156.104"));
        assert_eq!(forwarded_ip(&headers), "50.31.156.104".parse().ok());
    }

    #[test]
    fn garbage_forwarded_address_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("not-an-ip"));
        assert_eq!(forwarded_ip(&headers), None);
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }
}
