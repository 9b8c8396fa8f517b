pub mod address_detail;
pub mod address_kind;
pub mod attachment;
pub mod header;
pub mod inbound_mail;
pub mod prelude;
