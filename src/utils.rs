pub mod phone;
pub mod sms;
