// src/render/composite.rs
use log::debug;
use ndarray::ArrayView2;

use crate::error::Result;
use crate::raster::{Landsat8Band, MaskedRaster};
use crate::render::colormap::{LinearStretch, Rgb};
use crate::render::{draw_grid, render, with_title, Area, Figure, FigureKind, FigureOutput};

/// Red, green, blue
pub const RGB_BANDS: [Landsat8Band; 3] = [Landsat8Band::Red, Landsat8Band::Green, Landsat8Band::Blue];

/// Colour infrared: NIR as red, so vegetation shows bright red
pub const CIR_BANDS: [Landsat8Band; 3] = [Landsat8Band::Nir, Landsat8Band::Red, Landsat8Band::Green];

const FIGURE_SIZE: (u32, u32) = (1600, 860);

struct Channel<'a> {
    data: ArrayView2<'a, f32>,
    mask: ArrayView2<'a, bool>,
    stretch: LinearStretch,
}

impl<'a> Channel<'a> {
    fn new(raster: &'a MaskedRaster, band: Landsat8Band) -> Result<Self> {
        let data = raster.band(band)?;
        let mask = raster.band_mask(band)?;
        let stretch = LinearStretch::from_band(data, mask);
        debug!("{} stretch {:.4}..{:.4}", band.name(), stretch.low, stretch.high);
        Ok(Self {
            data,
            mask,
            stretch,
        })
    }

    fn value(&self, row: usize, col: usize) -> Option<u8> {
        if self.mask[[row, col]] {
            None
        } else {
            Some(self.stretch.apply(self.data[[row, col]]))
        }
    }
}

/// Stretched three-band composite; cells masked in any channel are left blank.
fn composite_channels(raster: &MaskedRaster, bands: [Landsat8Band; 3]) -> Result<[Channel<'_>; 3]> {
    Ok([
        Channel::new(raster, bands[0])?,
        Channel::new(raster, bands[1])?,
        Channel::new(raster, bands[2])?,
    ])
}

fn draw_composite(area: &Area<'_>, extent: (usize, usize), channels: &[Channel<'_>; 3]) -> Result<()> {
    draw_grid(area, extent, |row, col| {
        Some(Rgb::new(
            channels[0].value(row, col)?,
            channels[1].value(row, col)?,
            channels[2].value(row, col)?,
        ))
    })
}

/// Renders true-colour and colour-infrared composites of a Landsat 8 scene side by side.
///
/// With `save`, the figure is written as `landsat_rgb_cir_<date>.png`.
///
/// # Example
/// ```ignore
/// plot_rgb_cir(&landsat_pre, "03-02-2017", None)?;
/// ```
pub fn plot_rgb_cir(
    raster: &MaskedRaster,
    date: &str,
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    let rgb_title = format!("RGB Image {}", date);
    let cir_title = format!("CIR Image {}", date);

    let composites = [
        (&rgb_title, composite_channels(raster, RGB_BANDS)?),
        (&cir_title, composite_channels(raster, CIR_BANDS)?),
    ];

    let figure = render(FigureKind::RgbCir, vec![date.to_string()], FIGURE_SIZE, |root| {
        let panels = root.split_evenly((1, 2));
        for (panel, (title, channels)) in panels.iter().zip(&composites) {
            let inner = with_title(panel, &["Landsat 8 | 30 meter resolution", title.as_str()])?;
            draw_composite(&inner.margin(5, 5, 5, 5), raster.extent(), channels)?;
        }
        Ok(())
    })?;

    figure.persist(save)
}
