pub mod config;
pub mod static_files;
