// src/lib.rs
pub mod batch;
pub mod classify;
pub mod cli;
pub mod error;
#[cfg(feature = "gdal")]
pub mod io;
pub mod masking;
pub mod processing;
pub mod raster;
pub mod render;
pub mod utils;

pub use classify::{classify, ClassBins, ClassScheme, Histogram, HISTOGRAM_EDGES};
pub use error::{Error, Result};
pub use masking::{remove_clouds, CloudMask, PixelQaFlag};
pub use processing::{calc_dndvi_dnbr, ChangeDirection, DeltaIndex};
pub use raster::{IndexRaster, Landsat8Band, MaskedRaster};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
