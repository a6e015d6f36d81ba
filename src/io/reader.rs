// src/io/reader.rs
use gdal::Dataset;
use log::debug;
use ndarray::{Array3, Axis};
use rayon::prelude::*;
use std::path::Path;

use crate::error::{Error, Result};

pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

/// Reads every band of a multi-band scene (e.g. a stacked Landsat 8 SR product) as f32,
/// shaped (band, row, col).
pub fn read_scene(path: &Path) -> Result<(Array3<f32>, GeoInfo)> {
    let dataset = Dataset::open(path)?;
    let (width, height) = dataset.raster_size();
    let band_count = dataset.raster_count();
    let geo_info = GeoInfo {
        projection: dataset.projection(),
        geo_transform: dataset.geo_transform()?,
        width,
        height,
    };

    let mut scene = Array3::<f32>::zeros((band_count, height, width));
    for (i, mut plane) in scene.axis_iter_mut(Axis(0)).enumerate() {
        let band = dataset.rasterband(i + 1)?;
        let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;
        plane
            .as_slice_mut()
            .ok_or_else(|| Error::Gdal("scene plane is not contiguous".to_string()))?
            .copy_from_slice(buffer.data());
    }

    debug!("read {} band(s) of {}x{} from {}", band_count, width, height, path.display());
    Ok((scene, geo_info))
}

/// Reads single-band files in parallel and stacks them in the given order.
pub fn read_band_files(band_paths: &[&Path]) -> Result<(Array3<f32>, GeoInfo)> {
    let first = band_paths.first().ok_or_else(|| Error::InvalidParameter {
        name: "band_paths",
        value: "[]".to_string(),
        reason: "at least one band file is required".to_string(),
    })?;

    // Open first dataset to get dimensions and projection info
    let first_ds = Dataset::open(first)?;
    let (width, height) = first_ds.raster_size();
    let geo_info = GeoInfo {
        projection: first_ds.projection(),
        geo_transform: first_ds.geo_transform()?,
        width,
        height,
    };

    let planes = band_paths
        .par_iter()
        .map(|path| -> Result<Vec<f32>> {
            let ds = Dataset::open(path)?;
            if ds.raster_size() != (width, height) {
                let (w, h) = ds.raster_size();
                return Err(Error::SizeMismatch {
                    expected: vec![height, width],
                    actual: vec![h, w],
                });
            }
            let buffer = ds
                .rasterband(1)?
                .read_as::<f32>((0, 0), (width, height), (width, height), None)?;
            Ok(buffer.data().to_vec())
        })
        .collect::<Result<Vec<_>>>()?;

    let data: Vec<f32> = planes.into_iter().flatten().collect();
    let scene = Array3::from_shape_vec((band_paths.len(), height, width), data).map_err(|e| {
        Error::InvalidParameter {
            name: "band_paths",
            value: band_paths.len().to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok((scene, geo_info))
}

/// Reads a scene from one stacked file, or from one file per band in band order.
pub fn read_scene_files<P: AsRef<Path>>(paths: &[P]) -> Result<(Array3<f32>, GeoInfo)> {
    match paths {
        [single] => read_scene(single.as_ref()),
        _ => {
            let band_paths: Vec<&Path> = paths.iter().map(|p| p.as_ref()).collect();
            read_band_files(&band_paths)
        }
    }
}

/// Reads band 1 of a pixel QA file as (1, row, col).
pub fn read_qa(path: &Path) -> Result<Array3<u16>> {
    let dataset = Dataset::open(path)?;
    let (width, height) = dataset.raster_size();
    let buffer = dataset
        .rasterband(1)?
        .read_as::<u16>((0, 0), (width, height), (width, height), None)?;

    Array3::from_shape_vec((1, height, width), buffer.data().to_vec()).map_err(|e| {
        Error::InvalidParameter {
            name: "qa",
            value: path.display().to_string(),
            reason: e.to_string(),
        }
    })
}
