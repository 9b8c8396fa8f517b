use sea_orm::{DeriveActiveEnum, EnumIter};

/// Which address line of the mail an address detail row was extracted from.
#[derive(Copy, Clone, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(Some(10))")]
pub enum AddressKind {
    #[sea_orm(string_value = "FROM")]
    From,
    #[sea_orm(string_value = "TO")]
    To,
    #[sea_orm(string_value = "CC")]
    Cc,
    #[sea_orm(string_value = "BCC")]
    Bcc,
}
