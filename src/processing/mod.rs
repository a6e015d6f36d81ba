// src/processing/mod.rs
pub mod change;
pub mod indices;
pub mod pipeline;

// Re-export main components
pub use change::{calc_dndvi_dnbr, ChangeDirection, DeltaIndex};
pub use pipeline::{ChangePipeline, ChangeProducts, Scene};
