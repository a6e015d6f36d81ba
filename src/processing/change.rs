// src/processing/change.rs
use log::debug;
use ndarray::Zip;

use crate::error::{Error, Result};
use crate::processing::indices::{IndexCalculator, NDI};
use crate::raster::{IndexRaster, MaskedRaster};

/// Which image is subtracted from which when differencing an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDirection {
    /// post - pre: gains are positive (dNDVI)
    PostMinusPre,
    /// pre - post: losses are positive (dNBR, burn severity)
    PreMinusPost,
}

/// An index differenced between a pre-event and a post-event scene.
pub struct DeltaIndex {
    calculator: NDI,
    direction: ChangeDirection,
    name: String,
}

impl DeltaIndex {
    pub fn new(calculator: NDI, direction: ChangeDirection, name: impl Into<String>) -> Self {
        Self {
            calculator,
            direction,
            name: name.into(),
        }
    }

    /// dNDVI = NDVI(post) - NDVI(pre)
    pub fn dndvi() -> Self {
        Self::new(NDI::ndvi(), ChangeDirection::PostMinusPre, "dNDVI")
    }

    /// dNBR = NBR(pre) - NBR(post)
    ///
    /// The sign is reversed with respect to dNDVI so burn severity reads as a
    /// positive value.
    pub fn dnbr() -> Self {
        Self::new(NDI::nbr(), ChangeDirection::PreMinusPost, "dNBR")
    }

    pub fn direction(&self) -> ChangeDirection {
        self.direction
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calculate(&self, pre: &MaskedRaster, post: &MaskedRaster) -> Result<IndexRaster> {
        check_pair(pre, post)?;

        let pre_index = self.calculator.calculate(pre)?;
        let post_index = self.calculator.calculate(post)?;
        let (first, second) = match self.direction {
            ChangeDirection::PostMinusPre => (&post_index, &pre_index),
            ChangeDirection::PreMinusPost => (&pre_index, &post_index),
        };

        let data = Zip::from(first.data())
            .and(second.data())
            .par_map_collect(|&a, &b| a - b);
        let mask = Zip::from(first.mask())
            .and(second.mask())
            .map_collect(|&ma, &mb| ma || mb);

        let delta = IndexRaster::new(self.name.clone(), data, mask)?;
        debug!(
            "{}: {} of {} cells unmasked",
            self.name,
            delta.unmasked_count(),
            delta.data().len()
        );
        Ok(delta)
    }
}

/// Computes dNDVI and dNBR for a Landsat 8 scene pair.
///
/// # Example
/// ```ignore
/// let (landsat_dndvi_06, landsat_dnbr_06) = calc_dndvi_dnbr(&landsat_pre_masked, &landsat_post_06_masked)?;
/// ```
pub fn calc_dndvi_dnbr(
    pre: &MaskedRaster,
    post: &MaskedRaster,
) -> Result<(IndexRaster, IndexRaster)> {
    let dndvi = DeltaIndex::dndvi().calculate(pre, post)?;
    let dnbr = DeltaIndex::dnbr().calculate(pre, post)?;
    Ok((dndvi, dnbr))
}

fn check_pair(pre: &MaskedRaster, post: &MaskedRaster) -> Result<()> {
    if pre.data().shape() != post.data().shape() {
        return Err(Error::SizeMismatch {
            expected: pre.data().shape().to_vec(),
            actual: post.data().shape().to_vec(),
        });
    }
    Ok(())
}
