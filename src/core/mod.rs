pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod message;
pub mod session;
pub mod tracker;
