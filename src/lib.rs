pub use tareas_tui::cli;
pub use tareas_tui::commands;
pub use tareas_tui::config;
pub use tareas_tui::logging;
pub use tareas_tui::tui;
pub use tareas_tui::AppConfig;

pub use tareas_core as core;
pub use tareas_core::controller;
pub use tareas_core::model;
pub use tareas_core::remote;
