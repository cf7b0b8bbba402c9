use clap::Parser;
use glam::Vec3;
use instant::Instant;

use sinew::{HeadlessConfig, HeadlessRunner};
use sinew_creature::{RigConfig, RigProfile};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulated seconds to run
    #[arg(long, default_value = "10")]
    seconds: f32,

    /// Controller weight seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Overall creature size multiplier
    #[arg(long, default_value = "3.0")]
    scale: f32,

    /// Downward gravity (m/s^2, negative pulls down)
    #[arg(long, default_value = "-9.81")]
    gravity: f32,

    /// Rig profile: standard, pretensioned
    #[arg(long, default_value = "standard")]
    profile: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let profile = match args.profile.as_str() {
        "standard" => RigProfile::standard(),
        "pretensioned" => RigProfile::pretensioned(),
        other => {
            log::warn!("Unknown profile '{}', using standard", other);
            RigProfile::standard()
        }
    };

    let config = HeadlessConfig {
        seconds: args.seconds,
        seed: args.seed,
        rig: RigConfig {
            scale: args.scale,
            ..RigConfig::default()
        },
        profile,
        gravity: Vec3::new(0.0, args.gravity, 0.0),
        ..HeadlessConfig::default()
    };

    log::info!("Starting Sinew headless run");
    let started = Instant::now();

    let mut runner = HeadlessRunner::new(config)?;
    runner.run()?;

    log::info!("Finished in {:.2?} wall time", started.elapsed());
    Ok(())
}
