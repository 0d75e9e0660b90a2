pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod device;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod rpc;
pub mod types;

#[cfg(test)]
pub mod testing;
