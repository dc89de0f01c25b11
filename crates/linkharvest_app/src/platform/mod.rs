pub mod app;
pub mod config;
mod console;
mod effects;
pub mod logging;
mod opener;
