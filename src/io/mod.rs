// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_band_files, read_qa, read_scene, read_scene_files, GeoInfo};
pub use writer::write_index;
