use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "attachment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_mail_id: i32,
    pub name: String,
    pub content_type: String,
    /// Locator of the stored blob, relative to the attachment upload root.
    pub content: String,
    pub content_id: Option<String>,
    pub content_length: i32,
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
