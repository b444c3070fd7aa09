pub mod commands;
pub mod config;
pub mod connection;
pub mod data;
pub mod db;
pub mod frame;
pub mod persistence;
pub mod server;
pub mod slowlog;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
