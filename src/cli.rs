// src/cli.rs
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::masking::PixelQaFlag;
use crate::utils::fixed_point::MAX_SCALE_FACTOR;

#[derive(Parser)]
#[command(name = "burn-calc")]
#[command(about = "Burn severity and vegetation change indices from Landsat 8 imagery")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory figures are written to
    #[arg(long, default_value = crate::render::DEFAULT_OUTPUT_DIR, global = true)]
    pub output_dir: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render RGB and color-infrared composites of a scene
    RgbCir {
        /// Landsat 8 surface reflectance stack, or one file per band in band order
        #[arg(short, long, num_args = 1.., required = true)]
        scene: Vec<PathBuf>,

        /// Pixel QA file used to mask clouds
        #[arg(short, long)]
        qa: Option<PathBuf>,

        /// Acquisition date label
        #[arg(short, long)]
        date: String,

        /// QA classes to mask (cloud, cloud-shadow, snow, water, ...)
        #[arg(long, value_delimiter = ',', default_values_t = default_mask())]
        mask: Vec<String>,

        /// Extra raw QA values to mask
        #[arg(long, value_delimiter = ',')]
        mask_values: Vec<u16>,

        /// Save the figure
        #[arg(long)]
        save: bool,
    },

    /// dNDVI and dNBR between a pre-event and a post-event scene
    Change {
        /// Pre-event scene stack, or one file per band in band order
        #[arg(long, num_args = 1.., required = true)]
        pre: Vec<PathBuf>,

        /// Post-event scene stack, or one file per band in band order
        #[arg(long, num_args = 1.., required = true)]
        post: Vec<PathBuf>,

        /// Pre-event pixel QA file
        #[arg(long)]
        pre_qa: Option<PathBuf>,

        /// Post-event pixel QA file
        #[arg(long)]
        post_qa: Option<PathBuf>,

        /// Pre-event date label
        #[arg(long)]
        pre_date: String,

        /// Post-event date label
        #[arg(long)]
        post_date: String,

        /// QA classes to mask (cloud, cloud-shadow, snow, water, ...)
        #[arg(long, value_delimiter = ',', default_values_t = default_mask())]
        mask: Vec<String>,

        /// Extra raw QA values to mask
        #[arg(long, value_delimiter = ',')]
        mask_values: Vec<u16>,

        /// Save figures
        #[arg(long)]
        save: bool,

        /// GeoTIFF path prefix for dNDVI/dNBR rasters
        #[arg(long)]
        tif: Option<PathBuf>,

        /// Use float32 instead of int16
        #[arg(long)]
        float: bool,

        /// Scaling factor for fixed-point
        #[arg(long, default_value = "10000", value_parser = clap::value_parser!(i32).range(1..=MAX_SCALE_FACTOR as i64))]
        scale_factor: i32,
    },

    /// Process pre/post pairs listed in a JSON config
    Batch {
        /// Batch configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn default_mask() -> Vec<String> {
    vec![
        PixelQaFlag::CloudShadow.name().to_string(),
        PixelQaFlag::Cloud.name().to_string(),
    ]
}

/// QA values for the named flags plus any raw values.
pub fn resolve_masked_values(names: &[String], raw: &[u16]) -> Result<Vec<u16>, String> {
    let mut flags = Vec::with_capacity(names.len());
    for name in names {
        let flag =
            PixelQaFlag::from_name(name).ok_or_else(|| format!("unknown QA class: {}", name))?;
        flags.push(flag);
    }
    let mut values = PixelQaFlag::combined(&flags);
    values.extend_from_slice(raw);
    values.sort_unstable();
    values.dedup();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_command_defaults_to_cloud_and_shadow() {
        let cli = Cli::try_parse_from([
            "burn-calc",
            "change",
            "--pre",
            "pre.tif",
            "--post",
            "post.tif",
            "--pre-date",
            "03-02-2017",
            "--post-date",
            "06-25-2018",
        ])
        .unwrap();

        match cli.command {
            Commands::Change { mask, save, scale_factor, .. } => {
                assert_eq!(mask, vec!["cloud-shadow", "cloud"]);
                assert!(!save);
                assert_eq!(scale_factor, 10000);
            }
            _ => panic!("expected change command"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn rgb_cir_takes_band_files_and_mask_options() {
        let cli = Cli::try_parse_from([
            "burn-calc",
            "rgb-cir",
            "--scene",
            "b1.tif",
            "b2.tif",
            "b3.tif",
            "--date",
            "06-25-2018",
            "--mask",
            "snow",
            "--mask-values",
            "1,2",
        ])
        .unwrap();

        match cli.command {
            Commands::RgbCir { scene, mask, mask_values, .. } => {
                assert_eq!(scene.len(), 3);
                assert_eq!(mask, vec!["snow"]);
                assert_eq!(mask_values, vec![1, 2]);
            }
            _ => panic!("expected rgb-cir command"),
        }
    }

    #[test]
    fn rgb_cir_masks_cloud_and_shadow_by_default() {
        let cli = Cli::try_parse_from(["burn-calc", "rgb-cir", "-s", "scene.tif", "-d", "x"]).unwrap();
        match cli.command {
            Commands::RgbCir { mask, mask_values, .. } => {
                assert_eq!(mask, vec!["cloud-shadow", "cloud"]);
                assert!(mask_values.is_empty());
            }
            _ => panic!("expected rgb-cir command"),
        }
    }

    #[test]
    fn scale_factor_out_of_range_is_rejected() {
        for bad in ["0", "-1", "16384"] {
            let result = Cli::try_parse_from([
                "burn-calc",
                "change",
                "--pre",
                "pre.tif",
                "--post",
                "post.tif",
                "--pre-date",
                "a",
                "--post-date",
                "b",
                "--scale-factor",
                bad,
            ]);
            assert!(result.is_err(), "accepted scale factor {}", bad);
        }
    }

    #[test]
    fn masked_values_merge_flags_and_raw_values() {
        let values = resolve_masked_values(&["fill".to_string()], &[5, 1]).unwrap();
        assert_eq!(values, vec![1, 5]);
        assert!(resolve_masked_values(&["haze".to_string()], &[]).is_err());
    }
}
