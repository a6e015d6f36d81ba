// src/raster.rs
use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};

use crate::error::{Error, Result};

/// Landsat 8 surface reflectance bands, in stack order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landsat8Band {
    CoastalAerosol,
    Blue,
    Green,
    Red,
    Nir,
    Swir1,
    Swir2,
}

impl Landsat8Band {
    pub const ALL: [Landsat8Band; 7] = [
        Self::CoastalAerosol,
        Self::Blue,
        Self::Green,
        Self::Red,
        Self::Nir,
        Self::Swir1,
        Self::Swir2,
    ];

    /// Position of the band along the first axis of a scene stack.
    pub fn index(self) -> usize {
        match self {
            Self::CoastalAerosol => 0,
            Self::Blue => 1,
            Self::Green => 2,
            Self::Red => 3,
            Self::Nir => 4,
            Self::Swir1 => 5,
            Self::Swir2 => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CoastalAerosol => "B1 coastal aerosol",
            Self::Blue => "B2 blue",
            Self::Green => "B3 green",
            Self::Red => "B4 red",
            Self::Nir => "B5 near infrared",
            Self::Swir1 => "B6 shortwave infrared 1",
            Self::Swir2 => "B7 shortwave infrared 2",
        }
    }
}

/// A (band, row, col) reflectance stack with an exclusion mask of the same shape.
///
/// `true` in the mask marks a cell that takes no part in index arithmetic or rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedRaster {
    data: Array3<f32>,
    mask: Array3<bool>,
}

impl MaskedRaster {
    /// Wrap a raster with nothing masked.
    pub fn new(data: Array3<f32>) -> Self {
        let mask = Array3::from_elem(data.raw_dim(), false);
        Self { data, mask }
    }

    pub fn with_mask(data: Array3<f32>, mask: Array3<bool>) -> Result<Self> {
        if data.shape() != mask.shape() {
            return Err(Error::SizeMismatch {
                expected: data.shape().to_vec(),
                actual: mask.shape().to_vec(),
            });
        }
        Ok(Self { data, mask })
    }

    /// Returns a copy whose mask also excludes every cell flagged in `spatial`,
    /// on all bands.
    pub fn masked_where(&self, spatial: ArrayView2<'_, bool>) -> Result<Self> {
        let (_, rows, cols) = self.data.dim();
        if spatial.dim() != (rows, cols) {
            return Err(Error::SizeMismatch {
                expected: vec![rows, cols],
                actual: spatial.shape().to_vec(),
            });
        }

        let mut mask = self.mask.clone();
        for mut band in mask.axis_iter_mut(Axis(0)) {
            Zip::from(&mut band).and(&spatial).for_each(|m, &s| *m |= s);
        }
        Ok(Self {
            data: self.data.clone(),
            mask,
        })
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn mask(&self) -> &Array3<bool> {
        &self.mask
    }

    pub fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// (rows, cols)
    pub fn extent(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    pub fn band(&self, band: Landsat8Band) -> Result<ArrayView2<'_, f32>> {
        self.check_band(band)?;
        Ok(self.data.index_axis(Axis(0), band.index()))
    }

    pub fn band_mask(&self, band: Landsat8Band) -> Result<ArrayView2<'_, bool>> {
        self.check_band(band)?;
        Ok(self.mask.index_axis(Axis(0), band.index()))
    }

    pub fn masked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    fn check_band(&self, band: Landsat8Band) -> Result<()> {
        if band.index() >= self.band_count() {
            return Err(Error::MissingBand {
                band: band.index(),
                available: self.band_count(),
            });
        }
        Ok(())
    }
}

impl From<Array3<f32>> for MaskedRaster {
    fn from(data: Array3<f32>) -> Self {
        Self::new(data)
    }
}

/// A named 2-D index (NDVI, dNBR, ...) with the mask inherited from its sources.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRaster {
    name: String,
    data: Array2<f32>,
    mask: Array2<bool>,
}

impl IndexRaster {
    pub fn new(name: impl Into<String>, data: Array2<f32>, mask: Array2<bool>) -> Result<Self> {
        if data.shape() != mask.shape() {
            return Err(Error::SizeMismatch {
                expected: data.shape().to_vec(),
                actual: mask.shape().to_vec(),
            });
        }
        Ok(Self {
            name: name.into(),
            data,
            mask,
        })
    }

    pub fn unmasked(name: impl Into<String>, data: Array2<f32>) -> Self {
        let mask = Array2::from_elem(data.raw_dim(), false);
        Self {
            name: name.into(),
            data,
            mask,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// (rows, cols)
    pub fn extent(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        match self.mask.get((row, col)) {
            Some(false) => self.data.get((row, col)).copied(),
            _ => None,
        }
    }

    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.mask.get((row, col)).copied().unwrap_or(true)
    }

    /// Values of all cells that are not masked, in row-major order.
    pub fn unmasked_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data
            .iter()
            .zip(self.mask.iter())
            .filter(|&(_, &m)| !m)
            .map(|(&v, _)| v)
    }

    pub fn unmasked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }
}
