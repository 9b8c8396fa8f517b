use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, TransactionTrait};

use entity::address_kind::AddressKind;
use entity::{address_detail, attachment, header, inbound_mail};

use crate::error::WebhookError;
use crate::storage::AttachmentStore;
use crate::validate::{AddressData, AttachmentData, HeaderData, MailData};

/// Persist the whole aggregate: parent row first, then every child
/// collection tagged with the parent's id. The write is one transaction, so
/// a failure in a later child collection rolls back everything inserted
/// before it.
pub async fn save_inbound_mail(
    db: &DatabaseConnection,
    store: &AttachmentStore,
    data: &MailData,
) -> Result<inbound_mail::Model, WebhookError> {
    let txn = db.begin().await?;

    let mail = inbound_mail::ActiveModel {
        from_name: Set(data.from_name.clone()),
        from_email: Set(data.from_email.clone()),
        to_email: Set(data.to_email.clone()),
        cc_email: Set(data.cc_email.clone()),
        bcc_email: Set(data.bcc_email.clone()),
        original_recipient: Set(data.original_recipient.clone()),
        subject: Set(data.subject.clone()),
        message_id: Set(data.message_id.clone()),
        reply_to: Set(data.reply_to.clone()),
        mailbox_hash: Set(data.mailbox_hash.clone()),
        date: Set(data.date),
        text_body: Set(data.text_body.clone()),
        html_body: Set(data.html_body.clone()),
        stripped_text_reply: Set(data.stripped_text_reply.clone()),
        tag: Set(data.tag.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for attachment in &data.attachments {
        let locator = store.save(&attachment.stored_name, &attachment.content).await?;
        tag_attachment(attachment, locator, mail.id).insert(&txn).await?;
    }

    for header in tag_headers(&data.headers, mail.id) {
        header.insert(&txn).await?;
    }

    let from = std::slice::from_ref(&data.from_full);
    for row in tag_address_details(from, mail.id, AddressKind::From) {
        row.insert(&txn).await?;
    }
    for row in tag_address_details(&data.to_full, mail.id, AddressKind::To) {
        row.insert(&txn).await?;
    }
    for row in tag_address_details(&data.cc_full, mail.id, AddressKind::Cc) {
        row.insert(&txn).await?;
    }
    for row in tag_address_details(&data.bcc_full, mail.id, AddressKind::Bcc) {
        row.insert(&txn).await?;
    }

    txn.commit().await?;

    Ok(mail)
}

/// Stamp the parent id and the blob locator onto an attachment row. The
/// stamped values win over anything the payload carried.
fn tag_attachment(
    attachment: &AttachmentData,
    locator: String,
    parent_mail_id: i32,
) -> attachment::ActiveModel {
    attachment::ActiveModel {
        parent_mail_id: Set(parent_mail_id),
        name: Set(attachment.name.clone()),
        content_type: Set(attachment.content_type.clone()),
        content: Set(locator),
        content_id: Set(attachment.content_id.clone()),
        content_length: Set(attachment.content_length),
        ..Default::default()
    }
}

fn tag_headers(headers: &[HeaderData], parent_mail_id: i32) -> Vec<header::ActiveModel> {
    headers
        .iter()
        .map(|header| header::ActiveModel {
            parent_mail_id: Set(parent_mail_id),
            name: Set(header.name.clone()),
            value: Set(header.value.clone()),
            ..Default::default()
        })
        .collect()
}

/// Stamp the parent id and the address-kind discriminator onto every row of
/// one sub-collection. The discriminator is not part of the payload; it is
/// injected here, once per sub-collection.
fn tag_address_details(
    addresses: &[AddressData],
    parent_mail_id: i32,
    address_kind: AddressKind,
) -> Vec<address_detail::ActiveModel> {
    addresses
        .iter()
        .map(|address| address_detail::ActiveModel {
            parent_mail_id: Set(parent_mail_id),
            address_kind: Set(address_kind),
            email: Set(address.email.clone()),
            name: Set(address.name.clone()),
            mailbox_hash: Set(address.mailbox_hash.clone()),
            ..Default::default()
        })
        .collect()
}
