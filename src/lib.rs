pub mod access;
pub mod config;
pub mod database;
pub mod executor;
pub mod expression;
pub mod index;
pub mod planner;
pub mod storage;
