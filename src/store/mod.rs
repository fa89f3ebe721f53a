//! In-memory data store and query validation

mod dataset;
mod query;

pub use dataset::Dataset;
pub use query::{coerce_number, validate_car_query, CarFilter, RawCarQuery};
