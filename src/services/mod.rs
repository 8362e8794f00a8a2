pub mod readiness;
pub mod sleep_debt;
pub mod trends;
