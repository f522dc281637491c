pub mod add;
pub mod common;
pub mod completions;
pub mod config;
pub mod list;
pub mod remove;
pub mod sync;
