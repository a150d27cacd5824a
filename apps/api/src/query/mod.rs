pub mod filter;
pub mod params;

pub use filter::{matched_columns, Condition, FieldValue, Fields, Filter, Literal, Order};
pub use params::{wants_summary, FilterSpec, Param};
