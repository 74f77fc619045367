pub mod config;
pub mod id;
pub mod models;
pub mod service;
pub mod storage;

pub mod api;
pub mod redirect;
