pub mod auth;
pub mod channel;
pub mod message;
pub mod team;
