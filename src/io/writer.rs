// src/io/writer.rs
use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{DriverManager, Metadata};
use log::info;
use std::path::Path;

use super::reader::GeoInfo;
use crate::error::{Error, Result};
use crate::raster::IndexRaster;
use crate::utils::fixed_point::{to_fixed_point, to_float, FIXED_POINT_NODATA};

pub const FLOAT_NODATA: f32 = -999.0;

/// Writes an index raster to a single-band GeoTIFF.
///
/// Fixed-point output stores `round(value * scale_factor)` as int16 and records
/// the inverse scale in the band's SCALE metadata.
pub fn write_index(
    raster: &IndexRaster,
    geo_info: &GeoInfo,
    output_path: &Path,
    use_fixed_point: bool,
    scale_factor: i32,
) -> Result<()> {
    let (height, width) = raster.extent();
    if (width, height) != (geo_info.width, geo_info.height) {
        return Err(Error::SizeMismatch {
            expected: vec![geo_info.height, geo_info.width],
            actual: vec![height, width],
        });
    }

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let creation_options =
        RasterCreationOptions::from_iter(["COMPRESS=DEFLATE", "TILED=YES", "NUM_THREADS=ALL_CPUS"]);

    if use_fixed_point {
        let values = to_fixed_point(raster, scale_factor, FIXED_POINT_NODATA)?;

        // Create int16 output
        let mut out_ds = driver.create_with_band_type_with_options::<i16, _>(
            output_path,
            width,
            height,
            1,
            &creation_options,
        )?;
        out_ds.set_projection(&geo_info.projection)?;
        out_ds.set_geo_transform(&geo_info.geo_transform)?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(FIXED_POINT_NODATA as f64))?;
        band.set_metadata_item("SCALE", &format!("{}", 1.0 / scale_factor as f64), "")?;
        band.set_metadata_item("OFFSET", "0", "")?;
        band.set_description(&format!("{} (scaled)", raster.name()))?;

        let mut buffer = Buffer::new((width, height), values);
        band.write((0, 0), (width, height), &mut buffer)?;
        out_ds.flush_cache()?;
    } else {
        // Create float32 output
        let mut out_ds = driver.create_with_band_type_with_options::<f32, _>(
            output_path,
            width,
            height,
            1,
            &creation_options,
        )?;
        out_ds.set_projection(&geo_info.projection)?;
        out_ds.set_geo_transform(&geo_info.geo_transform)?;

        let mut band = out_ds.rasterband(1)?;
        band.set_no_data_value(Some(FLOAT_NODATA as f64))?;
        band.set_description(raster.name())?;

        let mut buffer = Buffer::new((width, height), to_float(raster, FLOAT_NODATA));
        band.write((0, 0), (width, height), &mut buffer)?;
        out_ds.flush_cache()?;
    }

    info!("Wrote {} to {}", raster.name(), output_path.display());
    Ok(())
}
