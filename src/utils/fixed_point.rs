// src/utils/fixed_point.rs
use crate::error::{Error, Result};
use crate::raster::IndexRaster;

/// Largest magnitude a difference index can take.
pub const DELTA_LIMIT: f32 = 2.0;

/// int16 nodata; lies outside the range any clamped value can scale to.
pub const FIXED_POINT_NODATA: i16 = i16::MIN;

/// Largest scale factor for which `DELTA_LIMIT * scale_factor` still fits in an int16.
pub const MAX_SCALE_FACTOR: i32 = (i16::MAX as f32 / DELTA_LIMIT) as i32;

pub fn check_scale_factor(scale_factor: i32) -> Result<()> {
    if scale_factor <= 0 || scale_factor > MAX_SCALE_FACTOR {
        return Err(Error::InvalidParameter {
            name: "scale_factor",
            value: scale_factor.to_string(),
            reason: format!("must be between 1 and {}", MAX_SCALE_FACTOR),
        });
    }
    Ok(())
}

/// Scales index values to int16; masked or non-finite cells become `nodata_value`.
///
/// Fails when the scale factor is out of range or when `nodata_value` could be
/// produced by a valid cell.
pub fn to_fixed_point(raster: &IndexRaster, scale_factor: i32, nodata_value: i16) -> Result<Vec<i16>> {
    check_scale_factor(scale_factor)?;
    let scale = scale_factor as f32;
    let limit = DELTA_LIMIT - 1.0 / scale;
    let reach = (limit * scale).round() as i32;
    if (nodata_value as i32).abs() <= reach {
        return Err(Error::InvalidParameter {
            name: "nodata_value",
            value: nodata_value.to_string(),
            reason: format!("collides with scaled values in -{}..={}", reach, reach),
        });
    }

    Ok(raster
        .data()
        .iter()
        .zip(raster.mask().iter())
        .map(|(&value, &masked)| {
            if masked || !value.is_finite() {
                nodata_value
            } else {
                (value.clamp(-limit, limit) * scale).round() as i16
            }
        })
        .collect())
}

/// Float output; masked and non-finite cells become `nodata_value`.
pub fn to_float(raster: &IndexRaster, nodata_value: f32) -> Vec<f32> {
    raster
        .data()
        .iter()
        .zip(raster.mask().iter())
        .map(|(&value, &masked)| {
            if masked || !value.is_finite() {
                nodata_value
            } else {
                value
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn raster() -> IndexRaster {
        IndexRaster::new(
            "dNBR",
            arr2(&[[0.5, f32::NAN], [3.0, -0.25]]),
            arr2(&[[false, false], [false, true]]),
        )
        .unwrap()
    }

    #[test]
    fn fixed_point_scales_clamps_and_marks_nodata() {
        let encoded = to_fixed_point(&raster(), 10000, FIXED_POINT_NODATA).unwrap();
        assert_eq!(encoded, vec![5000, FIXED_POINT_NODATA, 19999, FIXED_POINT_NODATA]);
    }

    #[test]
    fn minus_one_is_not_nodata() {
        let raster = IndexRaster::unmasked("dNDVI", arr2(&[[-1.0, 0.5], [-2.5, 2.5]]));
        let encoded = to_fixed_point(&raster, 10000, FIXED_POINT_NODATA).unwrap();
        assert_eq!(encoded, vec![-10000, 5000, -19999, 19999]);
        assert!(!encoded.contains(&FIXED_POINT_NODATA));
    }

    #[test]
    fn infinities_become_nodata() {
        let raster = IndexRaster::unmasked("dNBR", arr2(&[[f32::INFINITY, f32::NEG_INFINITY]]));
        let encoded = to_fixed_point(&raster, 10000, FIXED_POINT_NODATA).unwrap();
        assert_eq!(encoded, vec![FIXED_POINT_NODATA, FIXED_POINT_NODATA]);
    }

    #[test]
    fn scale_factor_must_fit_int16() {
        for bad in [0, -5, MAX_SCALE_FACTOR + 1, 20000] {
            assert!(matches!(
                to_fixed_point(&raster(), bad, FIXED_POINT_NODATA),
                Err(Error::InvalidParameter { name: "scale_factor", .. })
            ));
        }
        assert_eq!(MAX_SCALE_FACTOR, 16383);

        let extreme = IndexRaster::unmasked("dNBR", arr2(&[[5.0, -5.0]]));
        let encoded = to_fixed_point(&extreme, MAX_SCALE_FACTOR, FIXED_POINT_NODATA).unwrap();
        assert_eq!(encoded, vec![32765, -32765]);
        assert!(to_fixed_point(&extreme, 1, FIXED_POINT_NODATA).is_ok());
    }

    #[test]
    fn reachable_nodata_is_rejected() {
        assert!(matches!(
            to_fixed_point(&raster(), 10000, -10000),
            Err(Error::InvalidParameter { name: "nodata_value", .. })
        ));
    }

    #[test]
    fn float_output_marks_masked_and_nan() {
        let encoded = to_float(&raster(), -999.0);
        assert_eq!(encoded, vec![0.5, -999.0, 3.0, -999.0]);
    }
}
