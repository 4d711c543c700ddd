pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod tui;

pub use tareas_core as core;
pub use tareas_core::model;
pub use tareas_core::remote;

pub use tareas_core::AppConfig;
