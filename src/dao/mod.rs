pub mod catalog;
pub mod kv_store;
pub mod models;
pub mod storage;
pub mod team_persistence;
