pub mod flagships;
pub mod payments;
pub mod registrations;
