//! Chart aggregate: annotations and presentation value objects.

pub mod annotations;
pub mod value_objects;

pub use annotations::*;
pub use value_objects::*;
