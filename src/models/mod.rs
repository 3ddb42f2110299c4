pub mod auth;
pub mod availability;
pub mod player;
pub mod session;
pub mod user;
