use sea_orm::entity::prelude::*;

use super::address_kind::AddressKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "address_detail")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_mail_id: i32,
    pub address_kind: AddressKind,
    pub email: String,
    pub name: String,
    pub mailbox_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inbound_mail::Entity",
        from = "Column::ParentMailId",
        to = "super::inbound_mail::Column::Id",
        on_delete = "Cascade"
    )]
    InboundMail,
}

impl Related<super::inbound_mail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InboundMail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
