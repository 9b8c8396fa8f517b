pub use super::address_detail::Entity as AddressDetail;
pub use super::address_kind::AddressKind;
pub use super::attachment::Entity as Attachment;
pub use super::header::Entity as Header;
pub use super::inbound_mail::Entity as InboundMail;
