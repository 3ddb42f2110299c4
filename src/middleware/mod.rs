pub mod auth;
pub mod capability;
pub mod tenant;
