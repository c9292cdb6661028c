pub mod brew;
pub mod config;
pub mod recipe;
pub mod sample;
pub mod watch;
