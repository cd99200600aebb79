pub mod chart_controller;
pub mod config;

pub use chart_controller::{ChartController, Key};
pub use config::WidgetConfig;
