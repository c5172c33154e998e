//! Property values and the per-graph extrema cache kept over them.

pub mod element_property;
pub mod min_max;

pub use element_property::{ElementProperty, PropertyValue};
pub use min_max::MinMaxProperty;
