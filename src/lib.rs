// Library exports for the daemon startup guard

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod logs;
