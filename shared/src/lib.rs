pub mod annotation;
pub mod catalog;
pub mod query;
pub mod selection;
pub mod viewer;

pub use annotation::Annotation;
pub use catalog::*;
pub use query::{MapQuery, map_endpoint};
pub use selection::*;
pub use viewer::{DEFAULT_MARKERS, ManagerOptions, ViewerOptions};
