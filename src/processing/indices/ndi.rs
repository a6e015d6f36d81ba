// src/processing/indices/ndi.rs
use ndarray::Zip;

use crate::error::{Error, Result};
use crate::processing::indices::IndexCalculator;
use crate::raster::{IndexRaster, Landsat8Band, MaskedRaster};

/// Normalized Difference Index (NDI) calculator: (A - B) / (A + B)
pub struct NDI {
    band_a: Landsat8Band,
    band_b: Landsat8Band,
    name: String,
}

impl NDI {
    pub fn new(band_a: Landsat8Band, band_b: Landsat8Band, name: Option<String>) -> Self {
        Self {
            band_a,
            band_b,
            name: name.unwrap_or_else(|| "NDI".to_string()),
        }
    }

    /// Normalized Difference Vegetation Index: (NIR - RED) / (NIR + RED)
    pub fn ndvi() -> Self {
        Self::new(Landsat8Band::Nir, Landsat8Band::Red, Some("NDVI".to_string()))
    }

    /// Normalized Burn Ratio: (NIR - SWIR2) / (NIR + SWIR2)
    pub fn nbr() -> Self {
        Self::new(Landsat8Band::Nir, Landsat8Band::Swir2, Some("NBR".to_string()))
    }

    pub fn bands(&self) -> (Landsat8Band, Landsat8Band) {
        (self.band_a, self.band_b)
    }
}

impl IndexCalculator for NDI {
    fn calculate(&self, raster: &MaskedRaster) -> Result<IndexRaster> {
        if raster.band_count() < self.required_bands() {
            return Err(Error::MissingBand {
                band: self.band_a.index().max(self.band_b.index()),
                available: raster.band_count(),
            });
        }

        let a = raster.band(self.band_a)?;
        let b = raster.band(self.band_b)?;

        // Zero sums are left to IEEE division (NaN or +-inf)
        let data = Zip::from(&a)
            .and(&b)
            .par_map_collect(|&a_val, &b_val| (a_val - b_val) / (a_val + b_val));

        let mask = Zip::from(&raster.band_mask(self.band_a)?)
            .and(&raster.band_mask(self.band_b)?)
            .map_collect(|&ma, &mb| ma || mb);

        IndexRaster::new(self.name.clone(), data, mask)
    }

    fn required_bands(&self) -> usize {
        self.band_a.index().max(self.band_b.index()) + 1
    }

    fn name(&self) -> &str {
        &self.name
    }
}
