//! Headless runner and presentation layer for Sinew creatures
//!
//! The core crate owns simulation; this crate owns everything a host
//! application needs to show it: ordered body poses, muscle anchor pairs
//! with contraction-mapped colors, and a headless fixed-timestep runner.

pub mod render;
pub mod runner;

pub use render::{extract_render_data, BodyRenderData, CreatureRenderData, MuscleRenderData};
pub use runner::{HeadlessConfig, HeadlessRunner};
