use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InboundMail::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InboundMail::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::FromName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::FromEmail)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::ToEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::CcEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::BccEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::OriginalRecipient)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::Subject)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::MessageId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::ReplyTo)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::MailboxHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundMail::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InboundMail::TextBody).text().not_null())
                    .col(ColumnDef::new(InboundMail::HtmlBody).text().not_null())
                    .col(
                        ColumnDef::new(InboundMail::StrippedTextReply)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InboundMail::Tag).string_len(255).not_null())
                    .clone(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inbound_mail_message_id")
                    .if_not_exists()
                    .table(InboundMail::Table)
                    .col(InboundMail::MessageId)
                    .clone(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Header::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Header::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Header::ParentMailId).integer().not_null())
                    .col(ColumnDef::new(Header::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Header::Value).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Header::Table, Header::ParentMailId)
                            .to(InboundMail::Table, InboundMail::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .clone(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachment::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(Attachment::ParentMailId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachment::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Attachment::ContentType)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attachment::Content)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachment::ContentId).string_len(255))
                    .col(
                        ColumnDef::new(Attachment::ContentLength)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attachment::Table, Attachment::ParentMailId)
                            .to(InboundMail::Table, InboundMail::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .clone(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AddressDetail::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddressDetail::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(AddressDetail::ParentMailId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AddressDetail::AddressKind)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AddressDetail::Email)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AddressDetail::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AddressDetail::MailboxHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AddressDetail::Table, AddressDetail::ParentMailId)
                            .to(InboundMail::Table, InboundMail::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .clone(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AddressDetail::Table).clone())
            .await?;

        manager
            .drop_table(Table::drop().table(Attachment::Table).clone())
            .await?;

        manager
            .drop_table(Table::drop().table(Header::Table).clone())
            .await?;

        manager
            .drop_table(Table::drop().table(InboundMail::Table).clone())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum InboundMail {
    Table,
    Id,
    FromName,
    FromEmail,
    ToEmail,
    CcEmail,
    BccEmail,
    OriginalRecipient,
    Subject,
    MessageId,
    ReplyTo,
    MailboxHash,
    Date,
    TextBody,
    HtmlBody,
    StrippedTextReply,
    Tag,
}

#[derive(DeriveIden)]
enum Header {
    Table,
    Id,
    ParentMailId,
    Name,
    Value,
}

#[derive(DeriveIden)]
enum Attachment {
    Table,
    Id,
    ParentMailId,
    Name,
    ContentType,
    Content,
    ContentId,
    ContentLength,
}

#[derive(DeriveIden)]
enum AddressDetail {
    Table,
    Id,
    ParentMailId,
    AddressKind,
    Email,
    Name,
    MailboxHash,
}
