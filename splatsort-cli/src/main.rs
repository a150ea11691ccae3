use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::{rngs::StdRng, SeedableRng};
use splatsort_algorithms::CpuDepthSorter;
use splatsort_core::{ArcballCamera, CameraConfig, DepthSorter, Point3, ResortPolicy, SortConfig, VerifyMode};
use splatsort_gpu::{GpuContext, GpuDepthSorter};
use std::path::{Path, PathBuf};

mod session;

use session::{check_stats, Orbit, Session};

#[derive(Parser)]
#[command(name = "splatsort")]
#[command(about = "Per-frame back-to-front depth sorting of splat datasets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Orbit the camera around datasets, sorting and verifying every frame
    Run {
        /// Splat files of 32-byte records, shown one after another
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Backend::Gpu)]
        backend: Backend,

        /// Frames per dataset
        #[arg(long, default_value = "120")]
        frames: u64,

        #[arg(long, value_enum, default_value_t = Verify::Monotonic)]
        verify: Verify,

        /// Verify every K sorted frames
        #[arg(long, default_value = "1")]
        interval: u32,

        /// Sort even when the camera did not move
        #[arg(long)]
        every_frame: bool,

        /// Horizontal drag per frame in pixels; 0 keeps the camera still
        #[arg(long, default_value = "3.0")]
        drag: f32,

        /// Hold the camera still every N frames (0 = never)
        #[arg(long, default_value = "0")]
        pause_every: u64,

        /// GPU compute workgroup size
        #[arg(long, default_value = "256")]
        workgroup_size: u32,
    },

    /// Write a random dataset
    Generate {
        file: PathBuf,
        #[arg(short, long, default_value = "100000")]
        count: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Positions are drawn from [-extent, extent] on each axis
        #[arg(long, default_value = "5.0")]
        extent: f32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Gpu,
    Cpu,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Verify {
    Off,
    Monotonic,
    Reference,
}

impl From<Verify> for VerifyMode {
    fn from(v: Verify) -> Self {
        match v {
            Verify::Off => VerifyMode::Off,
            Verify::Monotonic => VerifyMode::Monotonic,
            Verify::Reference => VerifyMode::Reference,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            files,
            backend,
            frames,
            verify,
            interval,
            every_frame,
            drag,
            pause_every,
            workgroup_size,
        } => {
            let config = SortConfig::new()
                .with_verify(verify.into())
                .with_verify_interval(interval)
                .with_workgroup_size(workgroup_size)
                .with_resort(if every_frame { ResortPolicy::EveryFrame } else { ResortPolicy::OnChange });
            run(&files, backend, frames, config, Orbit { drag, pause_every })
        }
        Commands::Generate { file, count, seed, extent } => generate(&file, count, seed, extent),
    }
}

fn run(files: &[PathBuf], backend: Backend, frames: u64, config: SortConfig, orbit: Orbit) -> Result<()> {
    // every file is loaded up front so a bad one fails before any frame runs
    let datasets = files
        .iter()
        .map(|file| splatsort_io::load_dataset(file).with_context(|| format!("loading {}", file.display())))
        .collect::<Result<Vec<_>>>()?;

    let gpu = match backend {
        Backend::Gpu => match pollster::block_on(GpuContext::new()) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("GPU unavailable ({}), falling back to the CPU sorter", e);
                None
            }
        },
        Backend::Cpu => None,
    };

    let mut sorter: Box<dyn DepthSorter + '_> = match gpu.as_ref() {
        Some(ctx) => Box::new(GpuDepthSorter::new(ctx, config.clone())?),
        None => Box::new(CpuDepthSorter::new(config.clone())?),
    };
    let backend_name = sorter.backend_name();

    let camera = ArcballCamera::new(Point3::origin(), CameraConfig::default());
    let mut session = Session::new(sorter.as_mut(), camera, config);
    for (file, splats) in files.iter().zip(&datasets) {
        log::info!("switching to {} ({} splats)", file.display(), splats.len());
        session.switch_dataset(splats)?;
        session.run_frames(frames, orbit)?;
    }
    let stats = session.finish()?;
    check_stats(&stats, frames)?;

    println!(
        "{} backend: {} datasets, {} frames, {} sorts ({:.3} ms mean), {} verifications, {} failed readbacks, {} stale frames",
        backend_name,
        stats.datasets,
        stats.frames,
        stats.sorts,
        stats.mean_sort_ms(),
        stats.verifications,
        stats.failed_readbacks,
        stats.stale_frames
    );
    Ok(())
}

fn generate(file: &Path, count: usize, seed: u64, extent: f32) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let splats = splatsort_io::random_splats(&mut rng, count, extent);
    splatsort_io::write_splat_file(&splats, file).with_context(|| format!("writing {}", file.display()))?;
    println!("wrote {} splats to {}", splats.len(), file.display());
    Ok(())
}
