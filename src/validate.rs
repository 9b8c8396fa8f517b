use base64::prelude::{Engine, BASE64_STANDARD};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::storage::ContentSniffer;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const FALLBACK_EXTENSION: &str = "bin";

/// Naive formats are taken as UTC; `d/m/Y` is retried as `m/d/Y` when the
/// first component cannot be a day-first date.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DAY_FIRST_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const MONTH_FIRST_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];

/// Raw shape of the normalized payload. Everything defaults so that the
/// validator, not serde, decides which omissions are errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawPayload {
    from_name: String,
    from_email: String,
    to_email: String,
    cc_email: String,
    bcc_email: String,
    original_recipient: String,
    subject: String,
    message_id: String,
    reply_to: String,
    mailbox_hash: String,
    date: Option<String>,
    text_body: String,
    html_body: String,
    stripped_text_reply: String,
    tag: String,
    from_full: Option<RawAddress>,
    to_full: Vec<RawAddress>,
    cc_full: Vec<RawAddress>,
    bcc_full: Vec<RawAddress>,
    headers: Vec<RawHeader>,
    attachments: Vec<RawAttachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAddress {
    email: String,
    name: String,
    mailbox_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawHeader {
    name: String,
    value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAttachment {
    name: String,
    content: Option<String>,
    content_id: Option<String>,
}

/// Fully validated inbound mail aggregate, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailData {
    pub from_name: String,
    pub from_email: String,
    pub to_email: String,
    pub cc_email: String,
    pub bcc_email: String,
    pub original_recipient: String,
    pub subject: String,
    pub message_id: String,
    pub reply_to: String,
    pub mailbox_hash: String,
    pub date: DateTime<Utc>,
    pub text_body: String,
    pub html_body: String,
    pub stripped_text_reply: String,
    pub tag: String,
    pub from_full: AddressData,
    pub to_full: Vec<AddressData>,
    pub cc_full: Vec<AddressData>,
    pub bcc_full: Vec<AddressData>,
    pub headers: Vec<HeaderData>,
    pub attachments: Vec<AttachmentData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressData {
    pub email: String,
    pub name: String,
    pub mailbox_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderData {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentData {
    pub name: String,
    /// Sniffed from the decoded bytes, never taken from the payload.
    pub content_type: String,
    pub content: Vec<u8>,
    /// Unique file name the blob is stored under: a random token plus the
    /// extension matching the sniffed content type.
    pub stored_name: String,
    pub content_id: Option<String>,
    pub content_length: i32,
}

impl AttachmentData {
    pub fn content_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.content)
    }
}

impl MailData {
    /// JSON view of the validated data as handed to listeners. Attachment
    /// content is the stored locator by default, or the re-encoded base64
    /// string when `encode_attachments` is set.
    pub fn to_json(&self, encode_attachments: bool) -> Value {
        let attachments: Vec<Value> = self
            .attachments
            .iter()
            .map(|attachment| {
                let content = if encode_attachments {
                    attachment.content_base64()
                } else {
                    attachment.stored_name.clone()
                };
                json!({
                    "name": attachment.name,
                    "content_type": attachment.content_type,
                    "content": content,
                    "content_id": attachment.content_id,
                    "content_length": attachment.content_length,
                })
            })
            .collect();

        json!({
            "from_name": self.from_name,
            "from_email": self.from_email,
            "to_email": self.to_email,
            "cc_email": self.cc_email,
            "bcc_email": self.bcc_email,
            "original_recipient": self.original_recipient,
            "subject": self.subject,
            "message_id": self.message_id,
            "reply_to": self.reply_to,
            "mailbox_hash": self.mailbox_hash,
            "date": self.date.to_rfc3339(),
            "text_body": self.text_body,
            "html_body": self.html_body,
            "stripped_text_reply": self.stripped_text_reply,
            "tag": self.tag,
            "from_full": address_json(&self.from_full),
            "to_full": self.to_full.iter().map(address_json).collect::<Vec<_>>(),
            "cc_full": self.cc_full.iter().map(address_json).collect::<Vec<_>>(),
            "bcc_full": self.bcc_full.iter().map(address_json).collect::<Vec<_>>(),
            "headers": self.headers.iter().map(|header| json!({
                "name": header.name,
                "value": header.value,
            })).collect::<Vec<_>>(),
            "attachments": attachments,
        })
    }
}

fn address_json(address: &AddressData) -> Value {
    json!({
        "email": address.email,
        "name": address.name,
        "mailbox_hash": address.mailbox_hash,
    })
}

/// Permissive date parse: RFC 2822 first (Postmark's own format), then
/// RFC 3339 and its spaced/colonless variants, then the loose numeric forms.
/// Everything normalizes to UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    // RFC-2822-looking dates with a colon in the zone offset
    if let Ok(parsed) = DateTime::parse_from_str(value, "%a, %d %b %Y %H:%M:%S %:z") {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DAY_FIRST_FORMATS.iter().chain(MONTH_FIRST_FORMATS.iter()) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Validate a normalized payload into a [`MailData`] aggregate. Every field
/// error is collected before failing; a payload is never partially accepted.
pub fn validate_mail(
    payload: Value,
    sniffer: &dyn ContentSniffer,
) -> Result<MailData, ValidationErrors> {
    let raw: RawPayload = serde_json::from_value(payload).map_err(|err| {
        let mut errors = ValidationErrors::default();
        errors.add("non_field_errors", err.to_string());
        errors
    })?;

    let mut errors = ValidationErrors::default();

    if raw.from_email.is_empty() {
        errors.add("from_email", "This field is required.");
    } else if !EmailAddress::is_valid(&raw.from_email) {
        errors.add("from_email", "Enter a valid email address.");
    }

    let date = match raw.date.as_deref() {
        None => {
            errors.add("date", "This field is required.");
            None
        }
        Some(value) => match parse_datetime(value) {
            Some(parsed) => Some(parsed),
            None => {
                errors.add("date", format!("Datetime has wrong format: {value}."));
                None
            }
        },
    };

    let from_full = match raw.from_full {
        None => {
            errors.add("from_full", "This field is required.");
            None
        }
        Some(address) => Some(validate_address("from_full", address, &mut errors)),
    };
    let to_full = validate_addresses("to_full", raw.to_full, &mut errors);
    let cc_full = validate_addresses("cc_full", raw.cc_full, &mut errors);
    let bcc_full = validate_addresses("bcc_full", raw.bcc_full, &mut errors);

    let mut attachments = Vec::with_capacity(raw.attachments.len());
    for (index, attachment) in raw.attachments.into_iter().enumerate() {
        match validate_attachment(attachment, sniffer) {
            Ok(data) => attachments.push(data),
            Err(message) => errors.add("attachments", format!("attachment {index}: {message}")),
        }
    }

    let headers = raw
        .headers
        .into_iter()
        .map(|header| HeaderData {
            name: header.name,
            value: header.value,
        })
        .collect();

    match (date, from_full) {
        (Some(date), Some(from_full)) if errors.is_empty() => Ok(MailData {
            from_name: raw.from_name,
            from_email: raw.from_email,
            to_email: raw.to_email,
            cc_email: raw.cc_email,
            bcc_email: raw.bcc_email,
            original_recipient: raw.original_recipient,
            subject: raw.subject,
            message_id: raw.message_id,
            reply_to: raw.reply_to,
            mailbox_hash: raw.mailbox_hash,
            date,
            text_body: raw.text_body,
            html_body: raw.html_body,
            stripped_text_reply: raw.stripped_text_reply,
            tag: raw.tag,
            from_full,
            to_full,
            cc_full,
            bcc_full,
            headers,
            attachments,
        }),
        _ => Err(errors),
    }
}

fn validate_addresses(
    field: &str,
    raw: Vec<RawAddress>,
    errors: &mut ValidationErrors,
) -> Vec<AddressData> {
    raw.into_iter()
        .map(|address| validate_address(field, address, errors))
        .collect()
}

fn validate_address(
    field: &str,
    raw: RawAddress,
    errors: &mut ValidationErrors,
) -> AddressData {
    if !raw.email.is_empty() && !EmailAddress::is_valid(&raw.email) {
        errors.add(field, format!("{}: enter a valid email address.", raw.email));
    }
    AddressData {
        email: raw.email,
        name: raw.name,
        mailbox_hash: raw.mailbox_hash,
    }
}

fn validate_attachment(
    raw: RawAttachment,
    sniffer: &dyn ContentSniffer,
) -> Result<AttachmentData, String> {
    let Some(encoded) = raw.content else {
        return Err("content is required.".to_owned());
    };

    let content = BASE64_STANDARD
        .decode(encoded.as_bytes())
        .map_err(|_| "File could not be decoded.".to_owned())?;

    let content_type = sniffer.sniff(&content).unwrap_or(FALLBACK_CONTENT_TYPE);
    let extension = mime_guess::get_mime_extensions_str(content_type)
        .and_then(|extensions| extensions.first())
        .copied()
        .unwrap_or(FALLBACK_EXTENSION);
    let stored_name = format!("{}.{}", Uuid::new_v4().simple(), extension);

    Ok(AttachmentData {
        name: raw.name,
        content_type: content_type.to_owned(),
        content_length: content.len() as i32,
        content,
        stored_name,
        content_id: raw.content_id,
    })
}
