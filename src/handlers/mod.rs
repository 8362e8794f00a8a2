pub mod health_logs;
pub mod insights;
pub mod probes;
pub mod profile;
pub mod ws;
