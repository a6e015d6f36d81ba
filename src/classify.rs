// src/classify.rs
//! Severity classification and histogram bucketing of index rasters.

use itertools::Itertools;
use ndarray::{Array2, Zip};

use crate::error::{Error, Result};
use crate::raster::IndexRaster;
use crate::render::colormap::Rgb;

/// Bucket edges used for dNDVI and dNBR histograms.
pub const HISTOGRAM_EDGES: [f32; 7] = [-0.99, -0.5, -0.2, 0.0, 0.2, 0.5, 1.0];

/// Strictly increasing class boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBins {
    edges: Vec<f32>,
}

impl ClassBins {
    pub fn new(edges: Vec<f32>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidParameter {
                name: "bins",
                value: format!("{:?}", edges),
                reason: "at least two edges are required".to_string(),
            });
        }
        if edges.iter().any(|e| e.is_nan()) {
            return Err(Error::InvalidParameter {
                name: "bins",
                value: format!("{:?}", edges),
                reason: "edges must not be NaN".to_string(),
            });
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidParameter {
                name: "bins",
                value: format!("{:?}", edges),
                reason: "edges must be strictly increasing".to_string(),
            });
        }
        Ok(Self { edges })
    }

    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Class of `value`: `i` such that `edges[i-1] <= value < edges[i]`.
    ///
    /// Values below the first edge give 0; values at or above the last edge, and NaN,
    /// give `len()`.
    pub fn digitize(&self, value: f32) -> usize {
        if value.is_nan() {
            return self.edges.len();
        }
        self.edges.partition_point(|&edge| edge <= value)
    }
}

/// Bins plus one label and one colour per interior interval.
///
/// Class `i` (for `1 <= i < bins.len()`) is labelled `labels[i - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScheme {
    bins: ClassBins,
    labels: Vec<String>,
    colors: Vec<Rgb>,
}

impl ClassScheme {
    pub fn new(bins: ClassBins, labels: Vec<String>, colors: Vec<Rgb>) -> Result<Self> {
        let intervals = bins.len() - 1;
        if labels.len() != intervals {
            return Err(Error::InvalidParameter {
                name: "labels",
                value: labels.len().to_string(),
                reason: format!("expected one label per interval ({})", intervals),
            });
        }
        if colors.len() != intervals {
            return Err(Error::InvalidParameter {
                name: "colors",
                value: colors.len().to_string(),
                reason: format!("expected one colour per interval ({})", intervals),
            });
        }
        Ok(Self {
            bins,
            labels,
            colors,
        })
    }

    /// USGS-style dNBR burn severity classes.
    pub fn dnbr_severity() -> Self {
        let bins = ClassBins {
            edges: vec![f32::NEG_INFINITY, -0.1, 0.1, 0.27, 0.66, f32::INFINITY],
        };
        let labels = [
            "Enhanced Regrowth",
            "Unburned",
            "Low Severity",
            "Moderate Severity",
            "High Severity",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let colors = vec![
            Rgb::new(0, 128, 0),
            Rgb::new(154, 205, 50),
            Rgb::new(255, 218, 185),
            Rgb::new(255, 127, 80),
            Rgb::new(128, 0, 0),
        ];
        Self {
            bins,
            labels,
            colors,
        }
    }

    pub fn bins(&self) -> &ClassBins {
        &self.bins
    }

    pub fn label(&self, class: usize) -> Option<&str> {
        class
            .checked_sub(1)
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }

    pub fn color(&self, class: usize) -> Option<Rgb> {
        class.checked_sub(1).and_then(|i| self.colors.get(i)).copied()
    }
}

/// Per-cell class indices with the mask of the classified raster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRaster {
    classes: Array2<usize>,
    mask: Array2<bool>,
}

impl ClassRaster {
    pub fn classes(&self) -> &Array2<usize> {
        &self.classes
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        match self.mask.get((row, col)) {
            Some(false) => self.classes.get((row, col)).copied(),
            _ => None,
        }
    }

    /// Sorted classes that occur in at least one unmasked cell.
    pub fn present_classes(&self) -> Vec<usize> {
        self.classes
            .iter()
            .zip(self.mask.iter())
            .filter(|&(_, &m)| !m)
            .map(|(&c, _)| c)
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

pub fn classify(raster: &IndexRaster, bins: &ClassBins) -> ClassRaster {
    let classes = Zip::from(raster.data()).par_map_collect(|&v| bins.digitize(v));
    ClassRaster {
        classes,
        mask: raster.mask().clone(),
    }
}

/// Unmasked cell counts per bucket.
///
/// Buckets are `[e_i, e_i+1)` except the last, which is closed. Values outside the
/// edges are clamped into the outermost buckets; NaN cells are counted apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f32>,
    counts: Vec<usize>,
    nan_count: usize,
}

impl Histogram {
    pub fn compute(raster: &IndexRaster, edges: &[f32]) -> Result<Self> {
        let bins = ClassBins::new(edges.to_vec())?;
        let buckets = bins.len() - 1;
        let mut counts = vec![0usize; buckets];
        let mut nan_count = 0;

        for value in raster.unmasked_values() {
            if value.is_nan() {
                nan_count += 1;
                continue;
            }
            let bucket = bins.digitize(value).clamp(1, buckets) - 1;
            counts[bucket] += 1;
        }

        Ok(Self {
            edges: bins.edges,
            counts,
            nan_count,
        })
    }

    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn nan_count(&self) -> usize {
        self.nan_count
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn standard_bins() -> ClassBins {
        ClassBins::new(HISTOGRAM_EDGES.to_vec()).unwrap()
    }

    #[test]
    fn digitize_is_left_inclusive() {
        let bins = standard_bins();
        assert_eq!(bins.digitize(0.3), 5);
        assert_eq!(bins.digitize(0.2), 5);
        assert_eq!(bins.digitize(0.19), 4);
        assert_eq!(bins.digitize(-0.99), 1);
        assert_eq!(bins.digitize(-1.5), 0);
        assert_eq!(bins.digitize(1.0), 7);
        assert_eq!(bins.digitize(f32::NAN), 7);
    }

    #[test]
    fn bins_must_increase() {
        assert!(ClassBins::new(vec![0.0, 0.0, 1.0]).is_err());
        assert!(ClassBins::new(vec![1.0]).is_err());
        assert!(ClassBins::new(vec![0.0, f32::NAN]).is_err());
        assert!(ClassBins::new(vec![f32::NEG_INFINITY, 0.0, f32::INFINITY]).is_ok());
    }

    #[test]
    fn last_bucket_is_closed() {
        let raster = IndexRaster::unmasked("dNBR", arr2(&[[1.0, 0.5], [-0.99, 0.0]]));
        let hist = Histogram::compute(&raster, &HISTOGRAM_EDGES).unwrap();
        assert_eq!(hist.counts(), &[1, 0, 0, 1, 0, 2]);
    }

    #[test]
    fn out_of_range_values_clamp_to_outer_buckets() {
        let raster = IndexRaster::unmasked(
            "dNBR",
            arr2(&[[-1.5, 1.8], [f32::NEG_INFINITY, f32::NAN]]),
        );
        let hist = Histogram::compute(&raster, &HISTOGRAM_EDGES).unwrap();
        assert_eq!(hist.counts(), &[2, 0, 0, 0, 0, 1]);
        assert_eq!(hist.nan_count(), 1);
    }

    #[test]
    fn scheme_requires_one_label_per_interval() {
        let bins = standard_bins();
        let result = ClassScheme::new(bins, vec!["a".to_string()], vec![Rgb::new(0, 0, 0)]);
        assert!(matches!(result, Err(Error::InvalidParameter { name: "labels", .. })));
    }

    #[test]
    fn severity_labels_line_up_with_classes() {
        let scheme = ClassScheme::dnbr_severity();
        assert_eq!(scheme.label(0), None);
        assert_eq!(scheme.label(1), Some("Enhanced Regrowth"));
        assert_eq!(scheme.label(5), Some("High Severity"));
        assert_eq!(scheme.label(6), None);
        assert_eq!(scheme.bins().digitize(0.5), 4);
        assert_eq!(scheme.label(4), Some("Moderate Severity"));
    }
}
