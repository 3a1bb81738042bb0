pub mod entry;
pub mod inventory;
pub mod mac;
