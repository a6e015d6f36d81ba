// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::info;
use std::path::{Path, PathBuf};

use burn_calc::batch::process_batch;
use burn_calc::cli::{resolve_masked_values, Cli, Commands};
use burn_calc::io::{read_qa, read_scene_files, write_index};
use burn_calc::masking::remove_clouds;
use burn_calc::processing::{ChangePipeline, Scene};
use burn_calc::raster::MaskedRaster;
use burn_calc::render::{plot_rgb_cir, FigureOutput};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let output = FigureOutput::new(&cli.output_dir);

    match &cli.command {
        Commands::RgbCir {
            scene,
            qa,
            date,
            mask,
            mask_values,
            save,
        } => {
            let masked_values =
                resolve_masked_values(mask, mask_values).map_err(anyhow::Error::msg)?;
            let (data, _) = read_scene_files(scene)
                .with_context(|| format!("Failed to read scene {}", display_paths(scene)))?;
            let mut raster = MaskedRaster::new(data);
            if let Some(qa_path) = qa {
                let qa = read_qa(qa_path)?;
                raster = remove_clouds(&raster, &qa, &masked_values)?;
            }
            plot_rgb_cir(&raster, date, save.then_some(&output))?;
        }
        Commands::Change {
            pre,
            post,
            pre_qa,
            post_qa,
            pre_date,
            post_date,
            mask,
            mask_values,
            save,
            tif,
            float,
            scale_factor,
        } => {
            let masked_values =
                resolve_masked_values(mask, mask_values).map_err(anyhow::Error::msg)?;

            let (pre_data, geo_info) = read_scene_files(pre)
                .with_context(|| format!("Failed to read pre-event scene {}", display_paths(pre)))?;
            let (post_data, _) = read_scene_files(post).with_context(|| {
                format!("Failed to read post-event scene {}", display_paths(post))
            })?;
            let pre_qa = pre_qa.as_deref().map(read_qa).transpose()?;
            let post_qa = post_qa.as_deref().map(read_qa).transpose()?;

            let pre_raster = MaskedRaster::new(pre_data);
            let post_raster = MaskedRaster::new(post_data);
            let mut pre_scene = Scene::new(&pre_raster, pre_date);
            let mut post_scene = Scene::new(&post_raster, post_date);
            if let Some(qa) = &pre_qa {
                pre_scene = pre_scene.with_qa(qa);
            }
            if let Some(qa) = &post_qa {
                post_scene = post_scene.with_qa(qa);
            }

            let mut pipeline = ChangePipeline::new(masked_values);
            if *save {
                pipeline = pipeline.with_output(output.clone());
            }
            let products = pipeline.run(&pre_scene, &post_scene)?;

            if let Some(prefix) = tif {
                for raster in [&products.dndvi, &products.dnbr] {
                    let path = format!(
                        "{}_{}.tif",
                        prefix.display(),
                        raster.name().to_lowercase()
                    );
                    write_index(raster, &geo_info, Path::new(&path), !float, *scale_factor)?;
                }
            }
            info!("Processed {}", products.label);
        }
        Commands::Batch { config } => {
            process_batch(config)?;
        }
    }

    println!("Processing complete");
    Ok(())
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display()).join(", ")
}
