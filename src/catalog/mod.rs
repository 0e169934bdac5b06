pub mod filter;
pub mod sort;

pub use filter::{apply_filters, EstablishmentFilters};
pub use sort::sort_establishments;
