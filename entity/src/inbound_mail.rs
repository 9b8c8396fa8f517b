use sea_orm::entity::prelude::*;
use sea_orm::PaginatorTrait;

use super::address_kind::AddressKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "inbound_mail")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
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
    pub date: DateTimeUtc,
    #[sea_orm(column_type = "Text")]
    pub text_body: String,
    #[sea_orm(column_type = "Text")]
    pub html_body: String,
    #[sea_orm(column_type = "Text")]
    pub stripped_text_reply: String,
    pub tag: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::header::Entity")]
    Header,
    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachment,
    #[sea_orm(has_many = "super::address_detail::Entity")]
    AddressDetail,
}

impl Related<super::header::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Header.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachment.def()
    }
}

impl Related<super::address_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AddressDetail.def()
    }
}

impl Model {
    pub async fn has_attachment(&self, db: &impl ConnectionTrait) -> Result<bool, DbErr> {
        let count = self
            .find_related(super::attachment::Entity)
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// The single FROM address detail of this mail.
    pub async fn from_full(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Option<super::address_detail::Model>, DbErr> {
        self.address_details(db, AddressKind::From)
            .await
            .map(|mut rows| rows.pop())
    }

    pub async fn to_full(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Vec<super::address_detail::Model>, DbErr> {
        self.address_details(db, AddressKind::To).await
    }

    pub async fn cc_full(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Vec<super::address_detail::Model>, DbErr> {
        self.address_details(db, AddressKind::Cc).await
    }

    pub async fn bcc_full(
        &self,
        db: &impl ConnectionTrait,
    ) -> Result<Vec<super::address_detail::Model>, DbErr> {
        self.address_details(db, AddressKind::Bcc).await
    }

    async fn address_details(
        &self,
        db: &impl ConnectionTrait,
        kind: AddressKind,
    ) -> Result<Vec<super::address_detail::Model>, DbErr> {
        self.find_related(super::address_detail::Entity)
            .filter(super::address_detail::Column::AddressKind.eq(kind))
            .all(db)
            .await
    }
}

impl ActiveModelBehavior for ActiveModel {}
