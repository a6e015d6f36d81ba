// src/processing/indices/mod.rs
pub mod ndi;

pub use ndi::NDI;

use crate::error::Result;
use crate::raster::{IndexRaster, MaskedRaster};

pub trait IndexCalculator: Send + Sync {
    /// Calculate the index from the bands of a masked scene
    fn calculate(&self, raster: &MaskedRaster) -> Result<IndexRaster>;

    /// Return the number of bands the scene must carry
    fn required_bands(&self) -> usize;

    /// Return the name of the index
    fn name(&self) -> &str;
}
