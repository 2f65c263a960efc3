pub mod catalog;
pub mod config;
pub mod context;
pub mod eliminate;
pub mod engine;
pub mod error;
pub mod expr;
pub mod filter;
pub mod value;
