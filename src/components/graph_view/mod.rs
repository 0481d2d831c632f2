//! Canvas graph view: layout-seeded simulation, pointer interaction and
//! rendering.

mod component;
mod render;
mod state;

pub use component::GraphView;
