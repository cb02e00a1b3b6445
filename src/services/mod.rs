pub mod catalog_cache;
pub mod queries;

pub use catalog_cache::{CatalogCache, Freshness};
pub use queries::{CourseQueries, SectionStatus};
