// src/processing/pipeline.rs
use log::info;
use ndarray::Array3;

use crate::classify::{ClassScheme, HISTOGRAM_EDGES};
use crate::error::Result;
use crate::masking::remove_clouds;
use crate::processing::change::calc_dndvi_dnbr;
use crate::raster::{IndexRaster, MaskedRaster};
use crate::render::{
    plot_classified, plot_continuous, plot_histogram, plot_rgb_cir, Figure, FigureOutput, Panel,
};

/// One acquisition: the reflectance stack, its optional QA band and a date label.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub raster: &'a MaskedRaster,
    pub qa: Option<&'a Array3<u16>>,
    pub date: &'a str,
}

impl<'a> Scene<'a> {
    pub fn new(raster: &'a MaskedRaster, date: &'a str) -> Self {
        Self {
            raster,
            qa: None,
            date,
        }
    }

    pub fn with_qa(mut self, qa: &'a Array3<u16>) -> Self {
        self.qa = Some(qa);
        self
    }
}

/// Everything derived from one pre/post pair.
#[derive(Debug)]
pub struct ChangeProducts {
    pub label: String,
    pub dndvi: IndexRaster,
    pub dnbr: IndexRaster,
    pub figures: Vec<Figure>,
}

/// Mask -> dNDVI/dNBR -> figures for a pair of scenes.
#[derive(Debug, Clone)]
pub struct ChangePipeline {
    masked_values: Vec<u16>,
    scheme: ClassScheme,
    render_figures: bool,
    output: Option<FigureOutput>,
}

impl ChangePipeline {
    pub fn new(masked_values: Vec<u16>) -> Self {
        Self {
            masked_values,
            scheme: ClassScheme::dnbr_severity(),
            render_figures: true,
            output: None,
        }
    }

    pub fn with_scheme(mut self, scheme: ClassScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Persist every rendered figure under `output`.
    pub fn with_output(mut self, output: FigureOutput) -> Self {
        self.output = Some(output);
        self
    }

    pub fn without_figures(mut self) -> Self {
        self.render_figures = false;
        self
    }

    pub fn masked_values(&self) -> &[u16] {
        &self.masked_values
    }

    /// Applies the cloud mask when the scene carries a QA band.
    pub fn mask(&self, scene: &Scene<'_>) -> Result<MaskedRaster> {
        match scene.qa {
            Some(qa) => remove_clouds(scene.raster, qa, &self.masked_values),
            None => Ok(scene.raster.clone()),
        }
    }

    pub fn run(&self, pre: &Scene<'_>, post: &Scene<'_>) -> Result<ChangeProducts> {
        let label = format!("{} - {}", post.date, pre.date);

        let pre_masked = self.mask(pre)?;
        let post_masked = self.mask(post)?;
        info!(
            "{}: masked {} pre / {} post cells",
            label,
            pre_masked.masked_count(),
            post_masked.masked_count()
        );

        let (dndvi, dnbr) = calc_dndvi_dnbr(&pre_masked, &post_masked)?;

        let figures = if self.render_figures {
            self.render(&pre_masked, pre.date, &post_masked, post.date, &dndvi, &dnbr, &label)?
        } else {
            Vec::new()
        };

        Ok(ChangeProducts {
            label,
            dndvi,
            dnbr,
            figures,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn render(
        &self,
        pre: &MaskedRaster,
        pre_date: &str,
        post: &MaskedRaster,
        post_date: &str,
        dndvi: &IndexRaster,
        dnbr: &IndexRaster,
        label: &str,
    ) -> Result<Vec<Figure>> {
        let save = self.output.as_ref();
        let dndvi_panel = [Panel::new(dndvi, label)];
        let dnbr_panel = [Panel::new(dnbr, label)];

        Ok(vec![
            plot_rgb_cir(pre, pre_date, save)?,
            plot_rgb_cir(post, post_date, save)?,
            plot_continuous(&dndvi_panel, save)?,
            plot_classified(&dnbr_panel, &self.scheme, save)?,
            plot_histogram(&dndvi_panel, &HISTOGRAM_EDGES, save)?,
            plot_histogram(&dnbr_panel, &HISTOGRAM_EDGES, save)?,
        ])
    }
}
