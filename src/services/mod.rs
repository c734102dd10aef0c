// Gateway plumbing
pub mod gateway;

// Payment flow services
pub mod checkout;
pub mod orders;
pub mod token_health;

// Local bookkeeping
pub mod payment_records;
