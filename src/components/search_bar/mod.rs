//! Search input and suggestion dropdown.

mod component;

pub use component::SearchBar;
