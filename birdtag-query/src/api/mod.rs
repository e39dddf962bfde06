//! HTTP API handlers for birdtag-query

mod delete;
mod health;
mod search;
mod tags;

pub use delete::delete_files;
pub use health::health;
pub use search::{file_based_search, search, search_by_species, search_by_thumbnail};
pub use tags::manage_tags;
