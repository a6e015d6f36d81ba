// src/masking.rs
use std::collections::HashSet;

use log::debug;
use ndarray::{Array2, Array3, Axis};

use crate::error::{Error, Result};
use crate::raster::MaskedRaster;

/// Landsat 8 `pixel_qa` value sets (Collection 1 surface reflectance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelQaFlag {
    Fill,
    Clear,
    Water,
    CloudShadow,
    Snow,
    Cloud,
    HighCloudConfidence,
}

impl PixelQaFlag {
    pub fn values(self) -> &'static [u16] {
        match self {
            Self::Fill => &[1],
            Self::Clear => &[322, 386, 834, 898, 1346],
            Self::Water => &[324, 388, 836, 900, 1348],
            Self::CloudShadow => &[328, 392, 840, 904, 1350],
            Self::Snow => &[336, 368, 400, 432, 848, 880, 912, 944, 1352],
            Self::Cloud => &[352, 368, 416, 432, 480, 864, 880, 928, 944, 992],
            Self::HighCloudConfidence => &[480, 992],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Clear => "clear",
            Self::Water => "water",
            Self::CloudShadow => "cloud-shadow",
            Self::Snow => "snow",
            Self::Cloud => "cloud",
            Self::HighCloudConfidence => "high-cloud-confidence",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "fill" => Some(Self::Fill),
            "clear" => Some(Self::Clear),
            "water" => Some(Self::Water),
            "cloud-shadow" | "cloud_shadow" | "shadow" => Some(Self::CloudShadow),
            "snow" => Some(Self::Snow),
            "cloud" => Some(Self::Cloud),
            "high-cloud-confidence" | "high_cloud_confidence" => Some(Self::HighCloudConfidence),
            _ => None,
        }
    }

    /// Sorted, deduplicated union of the QA values of several flags.
    pub fn combined(flags: &[PixelQaFlag]) -> Vec<u16> {
        let mut values: Vec<u16> = flags.iter().flat_map(|f| f.values().iter().copied()).collect();
        values.sort_unstable();
        values.dedup();
        values
    }
}

/// Per-pixel exclusion flags derived from a QA raster.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudMask {
    flags: Array2<bool>,
}

impl CloudMask {
    /// Flags every cell of a (1, rows, cols) QA raster whose value is one of `masked_values`.
    pub fn from_qa(qa: &Array3<u16>, masked_values: &[u16]) -> Result<Self> {
        if qa.len_of(Axis(0)) != 1 {
            return Err(Error::InvalidParameter {
                name: "qa",
                value: format!("{:?}", qa.shape()),
                reason: "QA raster must have exactly one band".to_string(),
            });
        }

        let lookup: HashSet<u16> = masked_values.iter().copied().collect();
        let flags = qa
            .index_axis(Axis(0), 0)
            .mapv(|value| lookup.contains(&value));

        debug!(
            "cloud mask: {} of {} cells flagged by {} QA value(s)",
            flags.iter().filter(|&&f| f).count(),
            flags.len(),
            lookup.len()
        );

        Ok(Self { flags })
    }

    pub fn flags(&self) -> &Array2<bool> {
        &self.flags
    }

    pub fn flagged_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Applies the mask on every band of `raster`, keeping cells it already excludes.
    pub fn apply(&self, raster: &MaskedRaster) -> Result<MaskedRaster> {
        raster.masked_where(self.flags.view())
    }
}

/// Removes clouds and cloud shadows from a Landsat stack.
///
/// Every cell whose QA value is in `masked_values` is excluded on all bands. An empty
/// value set masks nothing, and values missing from the QA raster have no effect.
///
/// # Example
/// ```ignore
/// let masked_values = PixelQaFlag::combined(&[PixelQaFlag::CloudShadow, PixelQaFlag::Cloud]);
/// let landsat_pre_cl = remove_clouds(&landsat_pre, &landsat_pre_qa, &masked_values)?;
/// ```
pub fn remove_clouds(
    raster: &MaskedRaster,
    qa: &Array3<u16>,
    masked_values: &[u16],
) -> Result<MaskedRaster> {
    let (rows, cols) = raster.extent();
    let (_, qa_rows, qa_cols) = qa.dim();
    if (qa_rows, qa_cols) != (rows, cols) {
        return Err(Error::SizeMismatch {
            expected: vec![rows, cols],
            actual: vec![qa_rows, qa_cols],
        });
    }

    CloudMask::from_qa(qa, masked_values)?.apply(raster)
}
