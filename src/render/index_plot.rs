// src/render/index_plot.rs
use log::debug;
use plotters::coord::types::{RangedCoordf32, RangedCoordf64};
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;

use crate::classify::{classify, ClassRaster, ClassScheme, Histogram, HISTOGRAM_EDGES};
use crate::error::{Error, Result};
use crate::raster::IndexRaster;
use crate::render::colormap::{Diverging, Rgb};
use crate::render::{
    draw_grid, draw_label, plot_err, render, with_title, Area, Figure, FigureKind, FigureOutput,
};

const MAP_PANEL_SIZE: (u32, u32) = (800, 860);
const COLORBAR_WIDTH: u32 = 140;
const LEGEND_WIDTH: u32 = 230;
const HIST_PANEL_SIZE: (u32, u32) = (750, 600);

const OUT_OF_RANGE_COLOR: Rgb = Rgb::new(190, 190, 190);
const OUT_OF_RANGE_LABEL: &str = "Outside class range";
const HIST_BAR_COLOR: RGBColor = RGBColor(128, 0, 128);

/// One index raster and the label (usually a date pair) shown under its title.
#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    pub raster: &'a IndexRaster,
    pub label: &'a str,
}

impl<'a> Panel<'a> {
    pub fn new(raster: &'a IndexRaster, label: &'a str) -> Self {
        Self { raster, label }
    }
}

fn check_panels(panels: &[Panel<'_>]) -> Result<()> {
    if panels.is_empty() || panels.len() > 2 {
        return Err(Error::InvalidParameter {
            name: "panels",
            value: panels.len().to_string(),
            reason: "one or two index rasters can be plotted".to_string(),
        });
    }
    Ok(())
}

fn labels_of(panels: &[Panel<'_>]) -> Vec<String> {
    panels.iter().map(|p| p.label.to_string()).collect()
}

/// Renders each raster with a diverging colormap clipped to [-1, 1] and one shared colour bar.
pub fn plot_continuous(panels: &[Panel<'_>], save: Option<&FigureOutput>) -> Result<Figure> {
    check_panels(panels)?;
    continuous_figure(panels[0].raster.name(), panels, save)
}

/// Renders each raster as severity classes, with a legend of the classes present in it.
pub fn plot_classified(
    panels: &[Panel<'_>],
    scheme: &ClassScheme,
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    check_panels(panels)?;
    classified_figure(panels[0].raster.name(), panels, scheme, save)
}

/// Draws a bar histogram of each raster's unmasked values over `edges`.
pub fn plot_histogram(
    panels: &[Panel<'_>],
    edges: &[f32],
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    check_panels(panels)?;
    histogram_figure(panels[0].raster.name(), panels, edges, save)
}

/// # Example
/// ```ignore
/// plot_dndvi(&landsat_dndvi_06, "06-25-2018 - 03-02-2017",
///            &landsat_dndvi_11, "11-16-2018 - 03-02-2017", None)?;
/// ```
pub fn plot_dndvi(
    dndvi1: &IndexRaster,
    date1: &str,
    dndvi2: &IndexRaster,
    date2: &str,
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    continuous_figure(
        "dNDVI",
        &[Panel::new(dndvi1, date1), Panel::new(dndvi2, date2)],
        save,
    )
}

pub fn plot_dnbr(
    dnbr1: &IndexRaster,
    date1: &str,
    dnbr2: &IndexRaster,
    date2: &str,
    scheme: &ClassScheme,
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    classified_figure(
        "dNBR",
        &[Panel::new(dnbr1, date1), Panel::new(dnbr2, date2)],
        scheme,
        save,
    )
}

pub fn plot_hist_dndvi(
    dndvi1: &IndexRaster,
    date1: &str,
    dndvi2: &IndexRaster,
    date2: &str,
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    histogram_figure(
        "dNDVI",
        &[Panel::new(dndvi1, date1), Panel::new(dndvi2, date2)],
        &HISTOGRAM_EDGES,
        save,
    )
}

pub fn plot_hist_dnbr(
    dnbr1: &IndexRaster,
    date1: &str,
    dnbr2: &IndexRaster,
    date2: &str,
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    histogram_figure(
        "dNBR",
        &[Panel::new(dnbr1, date1), Panel::new(dnbr2, date2)],
        &HISTOGRAM_EDGES,
        save,
    )
}

fn continuous_figure(name: &str, panels: &[Panel<'_>], save: Option<&FigureOutput>) -> Result<Figure> {
    let n = panels.len() as u32;
    let maps_width = MAP_PANEL_SIZE.0 * n;
    let size = (maps_width + COLORBAR_WIDTH, MAP_PANEL_SIZE.1);
    let title = format!("Landsat 8 Derived {}", name);
    let cmap = Diverging::UNIT;

    let figure = render(FigureKind::IndexMap(name.to_string()), labels_of(panels), size, |root| {
        let (maps, bar) = root.split_horizontally(maps_width);
        for (area, panel) in maps.split_evenly((1, panels.len())).iter().zip(panels) {
            let inner = with_title(area, &[title.as_str(), panel.label])?;
            let raster = panel.raster;
            draw_grid(&inner.margin(5, 5, 5, 5), raster.extent(), |row, col| {
                raster.get(row, col).and_then(|v| cmap.color(v as f64))
            })?;
        }
        draw_colorbar(&bar, cmap)
    })?;

    figure.persist(save)
}

fn draw_colorbar(area: &Area<'_>, cmap: Diverging) -> Result<()> {
    let (_, height) = area.dim_in_pixel();
    let (left, right) = (20, 50);
    let top = 80;
    let bottom = height as i32 - 80;
    let span = (bottom - top).max(1);

    for y in top..bottom {
        let t = (y - top) as f64 / span as f64;
        let value = cmap.max - t * (cmap.max - cmap.min);
        if let Some(c) = cmap.color(value) {
            area.draw(&Rectangle::new(
                [(left, y), (right, y + 1)],
                RGBColor(c.r, c.g, c.b).filled(),
            ))
            .map_err(plot_err)?;
        }
    }
    area.draw(&Rectangle::new([(left, top), (right, bottom)], BLACK.stroke_width(1)))
        .map_err(plot_err)?;

    for step in 0..=4 {
        let t = step as f64 / 4.0;
        let value = cmap.max - t * (cmap.max - cmap.min);
        let y = top + (t * span as f64) as i32;
        draw_label(area, &format!("{:.1}", value), (right + 8, y - 8))?;
    }
    Ok(())
}

/// A class present in a classified raster, as shown in its legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub class: usize,
    pub label: String,
    pub color: Rgb,
}

/// Legend rows for the classes that actually occur among the unmasked cells.
pub fn legend_entries(classes: &ClassRaster, scheme: &ClassScheme) -> Vec<LegendEntry> {
    classes
        .present_classes()
        .into_iter()
        .map(|class| LegendEntry {
            class,
            label: scheme.label(class).unwrap_or(OUT_OF_RANGE_LABEL).to_string(),
            color: scheme.color(class).unwrap_or(OUT_OF_RANGE_COLOR),
        })
        .collect()
}

fn classified_figure(
    name: &str,
    panels: &[Panel<'_>],
    scheme: &ClassScheme,
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    let n = panels.len() as u32;
    let size = ((MAP_PANEL_SIZE.0 + LEGEND_WIDTH) * n, MAP_PANEL_SIZE.1);
    let title = format!("Landsat 8 Derived {}", name);

    let figure = render(FigureKind::IndexMap(name.to_string()), labels_of(panels), size, |root| {
        for (area, panel) in root.split_evenly((1, panels.len())).iter().zip(panels) {
            let classes = classify(panel.raster, scheme.bins());
            let legend = legend_entries(&classes, scheme);
            debug!("{} [{}]: {} class(es) present", name, panel.label, legend.len());

            let inner = with_title(area, &[title.as_str(), panel.label])?;
            let (map_area, legend_area) = inner.split_horizontally(MAP_PANEL_SIZE.0);
            draw_grid(&map_area.margin(5, 5, 5, 5), panel.raster.extent(), |row, col| {
                classes
                    .get(row, col)
                    .map(|class| scheme.color(class).unwrap_or(OUT_OF_RANGE_COLOR))
            })?;
            draw_legend(&legend_area, &legend)?;
        }
        Ok(())
    })?;

    figure.persist(save)
}

fn draw_legend(area: &Area<'_>, entries: &[LegendEntry]) -> Result<()> {
    const SWATCH: i32 = 18;
    const ROW: i32 = 28;
    let top = 40;

    for (i, entry) in entries.iter().enumerate() {
        let y = top + i as i32 * ROW;
        let c = entry.color;
        area.draw(&Rectangle::new(
            [(10, y), (10 + SWATCH, y + SWATCH)],
            RGBColor(c.r, c.g, c.b).filled(),
        ))
        .map_err(plot_err)?;
        area.draw(&Rectangle::new([(10, y), (10 + SWATCH, y + SWATCH)], BLACK.stroke_width(1)))
            .map_err(plot_err)?;
        draw_label(area, &entry.label, (18 + SWATCH, y + 1))?;
    }
    Ok(())
}

fn histogram_figure(
    name: &str,
    panels: &[Panel<'_>],
    edges: &[f32],
    save: Option<&FigureOutput>,
) -> Result<Figure> {
    let histograms = panels
        .iter()
        .map(|p| Histogram::compute(p.raster, edges))
        .collect::<Result<Vec<_>>>()?;

    let n = panels.len() as u32;
    let size = (HIST_PANEL_SIZE.0 * n, HIST_PANEL_SIZE.1);
    let title = format!("Landsat 8 Derived {} Histogram", name);

    let figure = render(FigureKind::Histogram(name.to_string()), labels_of(panels), size, |root| {
        let areas = root.split_evenly((1, panels.len()));
        for ((area, panel), hist) in areas.iter().zip(panels).zip(&histograms) {
            debug!("{} [{}]: bucket counts {:?}", name, panel.label, hist.counts());
            let inner = with_title(area, &[title.as_str(), panel.label])?;
            draw_histogram(&inner, hist)?;
        }
        Ok(())
    })?;

    figure.persist(save)
}

fn draw_histogram(area: &Area<'_>, hist: &Histogram) -> Result<()> {
    let edges = hist.edges();
    let x_range = x_range_of(edges);
    let y_max = (hist.max_count().max(1) as f64) * 1.1;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, 0f64..y_max)
        .map_err(plot_err)?;

    draw_axes(&mut chart, x_range_of(edges), y_max)?;

    chart
        .draw_series(hist.counts().iter().enumerate().map(|(i, &count)| {
            Rectangle::new(
                [(edges[i], 0.0), (edges[i + 1], count as f64)],
                HIST_BAR_COLOR.filled(),
            )
        }))
        .map_err(plot_err)?;

    Ok(())
}

fn x_range_of(edges: &[f32]) -> std::ops::Range<f32> {
    edges[0]..edges[edges.len() - 1]
}

type HistChart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf32, RangedCoordf64>>;

#[cfg(feature = "ttf")]
fn draw_axes(chart: &mut HistChart<'_, '_>, _x: std::ops::Range<f32>, _y_max: f64) -> Result<()> {
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .draw()
        .map_err(plot_err)
}

/// Bare axis lines; tick labels need a font backend.
#[cfg(not(feature = "ttf"))]
fn draw_axes(chart: &mut HistChart<'_, '_>, x: std::ops::Range<f32>, y_max: f64) -> Result<()> {
    chart
        .draw_series([
            PathElement::new(vec![(x.start, 0.0), (x.end, 0.0)], BLACK),
            PathElement::new(vec![(x.start, 0.0), (x.start, y_max)], BLACK),
        ])
        .map_err(plot_err)?;
    Ok(())
}
