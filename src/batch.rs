// src/batch.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::masking::PixelQaFlag;
use crate::utils::fixed_point::check_scale_factor;
use crate::render::{DEFAULT_OUTPUT_DIR, DEFAULT_PREFIX};

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub operations: Vec<Operation>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_masked_values")]
    pub masked_values: Vec<u16>,
    #[serde(default = "default_true")]
    pub save_figures: bool,
    #[serde(default)]
    pub float: bool,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: i32,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            prefix: default_prefix(),
            masked_values: default_masked_values(),
            save_figures: true,
            float: false,
            scale_factor: default_scale_factor(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_masked_values() -> Vec<u16> {
    PixelQaFlag::combined(&[PixelQaFlag::CloudShadow, PixelQaFlag::Cloud])
}

fn default_scale_factor() -> i32 {
    10000
}

fn default_true() -> bool {
    true
}

/// One pre/post scene pair.
#[derive(Deserialize, Serialize, Debug)]
pub struct Operation {
    pub pre: String,
    pub post: String,
    pub pre_date: String,
    pub post_date: String,
    pub pre_qa: Option<String>,
    pub post_qa: Option<String>,
    /// GeoTIFF path prefix; writes `<output>_dndvi.tif` and `<output>_dnbr.tif`
    pub output: Option<String>,
    pub masked_values: Option<Vec<u16>>,
    pub save_figures: Option<bool>,
    pub float: Option<bool>,
    pub scale_factor: Option<i32>,
}

impl BatchConfig {
    pub fn from_path(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)?;
        Self::from_json(&config_content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects scale factors the int16 encoding cannot represent.
    pub fn validate(&self) -> Result<()> {
        check_scale_factor(self.global.scale_factor)?;
        for op in &self.operations {
            if let Some(scale_factor) = op.scale_factor {
                check_scale_factor(scale_factor)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "gdal")]
pub use run::process_batch;

#[cfg(feature = "gdal")]
mod run {
    use anyhow::{Context, Result};
    use log::{error, info};
    use rayon::prelude::*;
    use std::path::{Path, PathBuf};

    use super::{BatchConfig, Operation};
    use crate::io::{read_qa, read_scene, write_index};
    use crate::processing::{ChangePipeline, Scene};
    use crate::raster::MaskedRaster;
    use crate::render::FigureOutput;

    pub fn process_batch(config_path: &PathBuf) -> Result<()> {
        let config = BatchConfig::from_path(config_path)
            .with_context(|| format!("Failed to load batch config {}", config_path.display()))?;
        let total = config.operations.len();

        info!("Starting batch processing with {} operations...", total);

        // Each pair is independent; one failure does not stop the others
        let failures: Vec<(usize, anyhow::Error)> = config
            .operations
            .par_iter()
            .enumerate()
            .filter_map(|(i, op)| {
                info!("[{}/{}] Processing {} -> {}", i + 1, total, op.pre_date, op.post_date);
                process_operation(&config, op).err().map(|e| (i, e))
            })
            .collect();

        for (i, e) in &failures {
            error!("[{}/{}] failed: {:#}", i + 1, total, e);
        }
        if !failures.is_empty() {
            return Err(anyhow::anyhow!(
                "{} of {} operations failed",
                failures.len(),
                total
            ));
        }

        info!("Batch processing complete!");
        Ok(())
    }

    fn process_operation(config: &BatchConfig, op: &Operation) -> Result<()> {
        let global = &config.global;
        let masked_values = op
            .masked_values
            .clone()
            .unwrap_or_else(|| global.masked_values.clone());
        let save_figures = op.save_figures.unwrap_or(global.save_figures);
        let float = op.float.unwrap_or(global.float);
        let scale_factor = op.scale_factor.unwrap_or(global.scale_factor);

        let (pre_data, geo_info) = read_scene(Path::new(&op.pre))
            .with_context(|| format!("Failed to read pre-event scene {}", op.pre))?;
        let (post_data, _) = read_scene(Path::new(&op.post))
            .with_context(|| format!("Failed to read post-event scene {}", op.post))?;
        let pre_qa = op.pre_qa.as_deref().map(|p| read_qa(Path::new(p))).transpose()?;
        let post_qa = op.post_qa.as_deref().map(|p| read_qa(Path::new(p))).transpose()?;

        let pre_raster = MaskedRaster::new(pre_data);
        let post_raster = MaskedRaster::new(post_data);
        let mut pre = Scene::new(&pre_raster, &op.pre_date);
        let mut post = Scene::new(&post_raster, &op.post_date);
        if let Some(qa) = &pre_qa {
            pre = pre.with_qa(qa);
        }
        if let Some(qa) = &post_qa {
            post = post.with_qa(qa);
        }

        let mut pipeline = ChangePipeline::new(masked_values);
        if save_figures {
            pipeline = pipeline.with_output(FigureOutput {
                dir: global.output_dir.clone(),
                prefix: global.prefix.clone(),
            });
        } else {
            pipeline = pipeline.without_figures();
        }
        let products = pipeline.run(&pre, &post)?;

        if let Some(output) = &op.output {
            for raster in [&products.dndvi, &products.dnbr] {
                let path = format!("{}_{}.tif", output, raster.name().to_lowercase());
                write_index(raster, &geo_info, Path::new(&path), !float, scale_factor)
                    .with_context(|| format!("Failed to write {}", path))?;
            }
        }
        Ok(())
    }
}
