//! Market data aggregate: bars, series storage and indicator math.

pub mod entities;
pub mod indicator_cache;
pub mod indicator_engine;
pub mod repositories;
pub mod series_store;
pub mod value_objects;

pub use entities::*;
pub use indicator_cache::{IndicatorCache, IndicatorKind, IndicatorValue};
pub use indicator_engine::*;
pub use repositories::SeriesSource;
pub use series_store::SeriesStore;
pub use value_objects::*;
