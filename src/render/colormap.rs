// src/render/colormap.rs
//! Colour ramps and contrast stretching for figure rendering.

use ndarray::ArrayView2;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Self = Self::new(255, 255, 255);
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// ColorBrewer PiYG: magenta (losses) -> white -> green (gains).
const PIYG_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 142, 1, 82),
    ColorStop::new(0.1, 197, 27, 125),
    ColorStop::new(0.2, 222, 119, 174),
    ColorStop::new(0.3, 241, 182, 218),
    ColorStop::new(0.4, 253, 224, 239),
    ColorStop::new(0.5, 247, 247, 247),
    ColorStop::new(0.6, 230, 245, 208),
    ColorStop::new(0.7, 184, 225, 134),
    ColorStop::new(0.8, 127, 188, 65),
    ColorStop::new(0.9, 77, 146, 33),
    ColorStop::new(1.0, 39, 100, 25),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Diverging colormap over a fixed value range; values outside are clipped.
#[derive(Debug, Clone, Copy)]
pub struct Diverging {
    pub min: f64,
    pub max: f64,
}

impl Diverging {
    /// The [-1, 1] scale shared by every continuous index panel.
    pub const UNIT: Self = Self {
        min: -1.0,
        max: 1.0,
    };

    /// Colour for `value`, or `None` for NaN.
    pub fn color(&self, value: f64) -> Option<Rgb> {
        if value.is_nan() {
            return None;
        }
        let t = (value - self.min) / (self.max - self.min);
        Some(multi_stop(PIYG_STOPS, t))
    }
}

/// Linear contrast stretch between two cut values, mapped to 0..=255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearStretch {
    pub low: f32,
    pub high: f32,
}

impl LinearStretch {
    /// Lower and upper percentile clipped by the display stretch.
    pub const CLIP_PERCENT: f64 = 2.0;

    /// Cuts at the 2nd and 98th percentiles of the unmasked finite cells.
    ///
    /// Falls back to [0, 1] when no cell qualifies.
    pub fn from_band(band: ArrayView2<'_, f32>, mask: ArrayView2<'_, bool>) -> Self {
        let mut values: Vec<f32> = band
            .iter()
            .zip(mask.iter())
            .filter(|&(v, &m)| !m && v.is_finite())
            .map(|(&v, _)| v)
            .collect();

        if values.is_empty() {
            return Self {
                low: 0.0,
                high: 1.0,
            };
        }

        values.sort_unstable_by(f32::total_cmp);
        Self {
            low: percentile(&values, Self::CLIP_PERCENT),
            high: percentile(&values, 100.0 - Self::CLIP_PERCENT),
        }
    }

    pub fn apply(&self, value: f32) -> u8 {
        let range = self.high - self.low;
        if range <= f32::EPSILON {
            return if value > self.low { 255 } else { 0 };
        }
        let t = ((value - self.low) / range).clamp(0.0, 1.0);
        (t * 255.0).round() as u8
    }
}

/// Linear-interpolated percentile of already sorted values.
fn percentile(sorted: &[f32], p: f64) -> f32 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
