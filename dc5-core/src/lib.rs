pub mod digits;
pub mod models;
