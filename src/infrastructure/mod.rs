pub mod rendering;
pub mod services;
pub mod synthetic;

pub use services::{BrowserTimeProvider, ConsoleLogger, MemoryLogger};
pub use synthetic::SyntheticSeriesSource;
