mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::http::{Request, StatusCode};
use base64::prelude::{Engine, BASE64_STANDARD};
use entity::address_kind::AddressKind;
use entity::prelude::{AddressDetail, Attachment, Header, InboundMail};
use entity::{address_detail, attachment, header};
use http_body_util::BodyExt;
use postmark_inbound::notify::{InboundMailEvent, InboundMailListener};
use postmark_inbound::webhook::{router, AppState};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};
use tower::ServiceExt;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn example_payload() -> Value {
    let text_attachment = BASE64_STANDARD.encode(b"First attachment contents.");
    let png_attachment = BASE64_STANDARD.encode(PNG_MAGIC);

    json!({
        "From": "sender@example.org",
        "FromName": "Postmarkapp Support",
        "FromFull": {"Email": "sender@example.org", "Name": "Postmarkapp Support", "MailboxHash": ""},
        "To": "one@inbound.example.org, two@inbound.example.org",
        "ToFull": [
            {"Email": "one@inbound.example.org", "Name": "", "MailboxHash": ""},
            {"Email": "two@inbound.example.org", "Name": "", "MailboxHash": ""},
        ],
        "Cc": "copied@example.org",
        "CcFull": [
            {"Email": "copied@example.org", "Name": "Copied", "MailboxHash": ""},
        ],
        "Bcc": "",
        "BccFull": [],
        "OriginalRecipient": "one@inbound.example.org",
        "Subject": "Test subject",
        "MessageID": "73e6d360-66eb-11e1-8e72-a8904824019b",
        "ReplyTo": "reply@example.org",
        "MailboxHash": "",
        "Date": "Fri, 1 Aug 2014 16:45:32 -0400",
        "TextBody": "This is a test text body.",
        "HtmlBody": "<html><body><p>This is a test html body.</p></body></html>",
        "StrippedTextReply": "Ok, thanks for letting me know!",
        "Tag": "TestTag",
        "Headers": [
            {"Name": "X-Spam-Status", "Value": "No"},
            {"Name": "X-Spam-Score", "Value": "-0.1"},
            {"Name": "Received-SPF", "Value": "None"},
        ],
        "Attachments": [
            {
                "Name": "test.txt",
                "Content": text_attachment,
                "ContentType": "text/plain",
                "ContentLength": 26,
            },
            {
                "Name": "logo.png",
                "Content": png_attachment,
                "ContentType": "application/octet-stream",
                "ContentID": "logo",
                "ContentLength": 8,
            },
        ],
    })
}

fn post_webhook(payload: &str, caller: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/inbound")
        .header("content-type", "application/json")
        .header("x-real-ip", caller)
        .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 51234))))
        .body(Body::from(payload.to_owned()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn accepts_and_persists_inbound_mail() {
    let (app, db) = common::setup("config.toml").await;

    let response = app
        .oneshot(post_webhook(&example_payload().to_string(), "127.0.0.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response_json(response).await;
    assert_eq!(body["detail"], "Inbound mail received. Thanks Postmark!");

    let mail = InboundMail::find().one(&db).await.unwrap().unwrap();
    assert_eq!(mail.from_email, "sender@example.org");
    assert_eq!(mail.from_name, "Postmarkapp Support");
    assert_eq!(mail.message_id, "73e6d360-66eb-11e1-8e72-a8904824019b");
    assert_eq!(mail.subject, "Test subject");
    assert_eq!(mail.tag, "TestTag");
    // "Fri, 1 Aug 2014 16:45:32 -0400" as a UTC instant
    assert_eq!(mail.date.to_rfc3339(), "2014-08-01T20:45:32+00:00");

    let headers = Header::find()
        .filter(header::Column::ParentMailId.eq(mail.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(headers.len(), 3);

    let attachments = Attachment::find()
        .filter(attachment::Column::ParentMailId.eq(mail.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(attachments.len(), 2);
    assert!(mail.has_attachment(&db).await.unwrap());

    let png = attachments
        .iter()
        .find(|attachment| attachment.name == "logo.png")
        .unwrap();
    assert_eq!(png.content_type, "image/png");
    assert_eq!(png.content_length, PNG_MAGIC.len() as i32);
    assert_eq!(png.content_id.as_deref(), Some("logo"));
    // the blob landed under the upload root at the stored locator
    assert!(std::fs::metadata(&png.content).is_ok());

    let text = attachments
        .iter()
        .find(|attachment| attachment.name == "test.txt")
        .unwrap();
    assert_eq!(text.content_length, 26);
    assert_eq!(
        std::fs::read(&text.content).unwrap(),
        b"First attachment contents."
    );
}

#[tokio::test]
async fn address_details_carry_the_right_discriminators() {
    let (app, db) = common::setup("config.toml").await;

    let response = app
        .oneshot(post_webhook(&example_payload().to_string(), "127.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let mail = InboundMail::find().one(&db).await.unwrap().unwrap();

    let count_of = |kind: AddressKind| {
        AddressDetail::find()
            .filter(address_detail::Column::ParentMailId.eq(mail.id))
            .filter(address_detail::Column::AddressKind.eq(kind))
            .count(&db)
    };
    assert_eq!(count_of(AddressKind::From).await.unwrap(), 1);
    assert_eq!(count_of(AddressKind::To).await.unwrap(), 2);
    assert_eq!(count_of(AddressKind::Cc).await.unwrap(), 1);
    assert_eq!(count_of(AddressKind::Bcc).await.unwrap(), 0);

    let from = mail.from_full(&db).await.unwrap().unwrap();
    assert_eq!(from.email, "sender@example.org");
    assert_eq!(mail.to_full(&db).await.unwrap().len(), 2);
    assert!(mail.bcc_full(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn unlisted_caller_is_rejected_and_nothing_is_saved() {
    let (app, db) = common::setup("config.toml").await;

    let response = app
        .oneshot(post_webhook(&example_payload().to_string(), "203.0.113.9"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(
        body["detail"],
        "You do not have permission to perform this action."
    );
    assert_eq!(InboundMail::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_json_returns_a_parse_error() {
    let (app, db) = common::setup("config.toml").await;

    let response = app
        .oneshot(post_webhook("{not json", "127.0.0.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("JSON parse error - "));
    assert_eq!(InboundMail::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn validation_errors_are_collected_per_field() {
    let (app, db) = common::setup("config.toml").await;

    let mut payload = example_payload();
    payload["Date"] = json!("abc");
    payload["From"] = json!("not-an-address");

    let response = app
        .oneshot(post_webhook(&payload.to_string(), "127.0.0.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["date"].is_array());
    assert!(body["from_email"].is_array());
    assert_eq!(InboundMail::find().count(&db).await.unwrap(), 0);
}

struct Recording {
    calls: Arc<AtomicUsize>,
    saw_persisted_mail: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl InboundMailListener for Recording {
    async fn on_inbound_mail(&self, event: &InboundMailEvent) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.saw_persisted_mail
            .store(event.mail.is_some(), Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn save_disabled_still_accepts_and_notifies() {
    let db = common::connect().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let saw_persisted_mail = Arc::new(AtomicBool::new(true));

    let mut state = AppState::new(common::load_settings("config_nosave.toml"), Some(db.clone()));
    state.broadcaster.register(Arc::new(Recording {
        calls: calls.clone(),
        saw_persisted_mail: saw_persisted_mail.clone(),
    }));
    let app = router(Arc::new(state));

    let response = app
        .oneshot(post_webhook(&example_payload().to_string(), "127.0.0.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!saw_persisted_mail.load(Ordering::SeqCst));
    assert_eq!(InboundMail::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn notification_fires_after_persistence() {
    let db = common::connect().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let saw_persisted_mail = Arc::new(AtomicBool::new(false));

    let mut state = AppState::new(common::load_settings("config.toml"), Some(db.clone()));
    state.broadcaster.register(Arc::new(Recording {
        calls: calls.clone(),
        saw_persisted_mail: saw_persisted_mail.clone(),
    }));
    let app = router(Arc::new(state));

    let response = app
        .oneshot(post_webhook(&example_payload().to_string(), "127.0.0.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(saw_persisted_mail.load(Ordering::SeqCst));
    assert_eq!(InboundMail::find().count(&db).await.unwrap(), 1);
}
