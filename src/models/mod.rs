pub mod bank_account;
pub mod flagship;
pub mod payment;
pub mod refund;
pub mod registration;
pub mod user;
