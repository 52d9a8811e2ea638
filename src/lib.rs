#[macro_use]
extern crate tracing;

pub mod auth;
pub mod config;
pub mod db;
pub mod friendship_store;
pub mod http;
pub mod init;
pub mod models;
