#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod deck;
pub mod group;
pub mod input;
pub mod layout;
pub mod post;
pub mod recency;
pub mod render;
pub mod rows;
pub mod telemetry;
pub mod thread;
pub mod view;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
