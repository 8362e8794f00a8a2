pub mod calendar;
pub mod health_log;
pub mod profile;
