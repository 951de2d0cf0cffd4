pub mod bank_accounts;
pub mod flagships;
pub mod payments;
pub mod refunds;
pub mod registrations;
