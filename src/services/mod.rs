pub mod availability;
pub mod guard;
pub mod metrics;
pub mod queries;
pub mod sessions;
