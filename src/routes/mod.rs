pub mod coach;
pub mod health;
pub mod metrics;
pub mod parent;
