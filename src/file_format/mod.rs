pub mod clusters;
pub mod config;
pub mod hierarchy;
pub mod label_table;
