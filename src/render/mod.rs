// src/render/mod.rs
//! Figure rendering into in-memory RGB buffers, with optional PNG output.

pub mod colormap;
pub mod composite;
pub mod index_plot;

pub use composite::plot_rgb_cir;
pub use index_plot::{
    plot_classified, plot_continuous, plot_dnbr, plot_dndvi, plot_hist_dnbr, plot_hist_dndvi,
    plot_histogram, Panel,
};

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;

use crate::error::{Error, Result};
use colormap::Rgb;

/// Directory figures are written to unless configured otherwise.
pub const DEFAULT_OUTPUT_DIR: &str = "data/group/outputs/figs";

/// File name prefix of every persisted figure.
pub const DEFAULT_PREFIX: &str = "landsat";

#[cfg(feature = "ttf")]
pub(crate) const TITLE_FONT: (&str, u32) = ("sans-serif", 22);
#[cfg(feature = "ttf")]
pub(crate) const LABEL_FONT: (&str, u32) = ("sans-serif", 16);
#[cfg(not(feature = "ttf"))]
const TITLE_LINE_HEIGHT: u32 = 30;

/// What a figure shows; decides the tag in its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigureKind {
    RgbCir,
    IndexMap(String),
    Histogram(String),
}

impl FigureKind {
    fn tag(&self) -> String {
        match self {
            Self::RgbCir => "rgb_cir".to_string(),
            Self::IndexMap(name) => name.clone(),
            Self::Histogram(name) => format!("hist_{}", name),
        }
    }

    /// Histogram file names run their labels together; maps separate them with `_`.
    fn label_separator(&self) -> &'static str {
        match self {
            Self::Histogram(_) => "",
            _ => "_",
        }
    }
}

/// Where persisted figures go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureOutput {
    pub dir: PathBuf,
    pub prefix: String,
}

impl Default for FigureOutput {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl FigureOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn path_for(&self, figure: &Figure) -> PathBuf {
        self.dir.join(figure.file_name(&self.prefix))
    }
}

/// A rendered figure held as packed RGB8 pixels.
#[derive(Debug, Clone)]
pub struct Figure {
    kind: FigureKind,
    labels: Vec<String>,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Figure {
    pub fn kind(&self) -> &FigureKind {
        &self.kind
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 3) as usize;
        Some(Rgb::new(
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ))
    }

    /// `<prefix>_<tag>_<labels>.png`
    pub fn file_name(&self, prefix: &str) -> String {
        let labels = self
            .labels
            .iter()
            .map(|label| sanitize_label(label))
            .collect::<Vec<_>>()
            .join(self.kind.label_separator());
        format!("{}_{}_{}.png", prefix, self.kind.tag(), labels)
    }

    /// Writes the figure as PNG, replacing any file of the same name.
    pub fn save(&self, output: &FigureOutput) -> Result<PathBuf> {
        fs::create_dir_all(&output.dir)?;
        let path = output.path_for(self);
        self.write_png(&path)?;
        info!("Saved figure {}", path.display());
        Ok(path)
    }

    pub fn write_png(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width,
            self.height,
            image::ColorType::Rgb8,
        )?;
        Ok(())
    }

    /// Saves when an output is given, then hands the figure back.
    pub(crate) fn persist(self, save: Option<&FigureOutput>) -> Result<Self> {
        if let Some(output) = save {
            self.save(output)?;
        }
        Ok(self)
    }
}

/// Keeps labels from escaping the output directory.
fn sanitize_label(label: &str) -> String {
    label.replace(['/', '\\'], "-")
}

pub(crate) type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub(crate) fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// Renders onto a white canvas of the given size.
pub(crate) fn render<F>(
    kind: FigureKind,
    labels: Vec<String>,
    (width, height): (u32, u32),
    draw: F,
) -> Result<Figure>
where
    F: FnOnce(&Area<'_>) -> Result<()>,
{
    let mut pixels = vec![255u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        draw(&root)?;
        root.present().map_err(plot_err)?;
    }
    Ok(Figure {
        kind,
        labels,
        width,
        height,
        pixels,
    })
}

/// Draws a (rows, cols) grid of colours into `area`, scaled to fit and centred,
/// nearest-neighbour sampled. `None` cells stay background.
pub(crate) fn draw_grid<F>(area: &Area<'_>, (rows, cols): (usize, usize), color_at: F) -> Result<()>
where
    F: Fn(usize, usize) -> Option<Rgb>,
{
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let (area_w, area_h) = area.dim_in_pixel();
    let scale = (area_w as f64 / cols as f64).min(area_h as f64 / rows as f64);
    let out_w = ((cols as f64 * scale).floor() as u32).max(1);
    let out_h = ((rows as f64 * scale).floor() as u32).max(1);
    let x0 = (area_w.saturating_sub(out_w) / 2) as i32;
    let y0 = (area_h.saturating_sub(out_h) / 2) as i32;

    for y in 0..out_h {
        let row = ((y as f64 / scale) as usize).min(rows - 1);
        for x in 0..out_w {
            let col = ((x as f64 / scale) as usize).min(cols - 1);
            if let Some(c) = color_at(row, col) {
                area.draw_pixel((x0 + x as i32, y0 + y as i32), &RGBColor(c.r, c.g, c.b))
                    .map_err(plot_err)?;
            }
        }
    }
    Ok(())
}

/// Adds a title line by line on top of `area` and returns the remaining space.
#[cfg(feature = "ttf")]
pub(crate) fn with_title<'a>(area: &Area<'a>, lines: &[&str]) -> Result<Area<'a>> {
    let mut current = area.clone();
    for line in lines {
        current = current.titled(line, TITLE_FONT).map_err(plot_err)?;
    }
    Ok(current)
}

/// Without a font backend the title rows are reserved but left blank.
#[cfg(not(feature = "ttf"))]
pub(crate) fn with_title<'a>(area: &Area<'a>, lines: &[&str]) -> Result<Area<'a>> {
    let (_, body) = area.split_vertically(TITLE_LINE_HEIGHT * lines.len() as u32);
    Ok(body)
}

/// Draws `text` with its top-left corner at `pos`.
#[cfg(feature = "ttf")]
pub(crate) fn draw_label(area: &Area<'_>, text: &str, pos: (i32, i32)) -> Result<()> {
    area.draw(&Text::new(text.to_string(), pos, LABEL_FONT))
        .map_err(plot_err)
}

/// Plotters' fallback font cannot rasterize glyphs, so labels need `ttf`.
#[cfg(not(feature = "ttf"))]
pub(crate) fn draw_label(_area: &Area<'_>, _text: &str, _pos: (i32, i32)) -> Result<()> {
    Ok(())
}
