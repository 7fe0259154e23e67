pub mod app;
#[cfg(feature = "desktop")]
pub mod camera;
pub mod config;
pub mod control;
pub mod error;
pub mod game;
pub mod pose;
#[cfg(feature = "desktop")]
pub mod render;
pub mod store;
pub mod tracker;
