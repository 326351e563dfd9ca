use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cli::JobConfig;
use color_eyre::eyre::Result;
use segmask::{MaskContainer, MaskWriter, VolumeSource};
use segtool::{ChimeraXDriver, SegmentationOutputs, Segmenter};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};
use volume::{Hdf5VolumeCodec, LabelGrid, VolumeCodec, extract_regions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a density map through the external tool using a job config
    Segment {
        /// Path to the JSON or TOML job configuration
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Refine an existing id mask: author a container, reopen it in the
    /// tool, and collect the updated outputs
    Update {
        /// Path to the JSON or TOML job configuration
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Convert a label volume into a mask container without running the tool
    AuthorMask {
        /// Label volume to convert
        #[arg(short, long)]
        volume: PathBuf,
        /// Directory to write the container into
        #[arg(short, long)]
        out_dir: PathBuf,
    },
    /// Split a label volume into one indicator volume per region
    ExtractRegions {
        /// Label volume to split
        #[arg(short, long)]
        volume: PathBuf,
        /// Directory to write the pieces into
        #[arg(short, long)]
        out_dir: PathBuf,
    },
    /// Print a mask container's metadata as JSON
    Inspect {
        /// Container to open
        #[arg(short, long)]
        container: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Segment { config } => segment(config)?,
        Commands::Update { config } => update(config)?,
        Commands::AuthorMask { volume, out_dir } => author_mask(volume, out_dir)?,
        Commands::ExtractRegions { volume, out_dir } => extract_pieces(volume, out_dir)?,
        Commands::Inspect { container } => inspect(container)?,
    }

    Ok(())
}

fn segment(config_path: &Path) -> Result<()> {
    let job = JobConfig::from_file(config_path)?;
    fs::create_dir_all(&job.output_dir)?;

    let driver = ChimeraXDriver::new()?;
    let segmenter = Segmenter::new(driver, &job.output_dir);
    let outputs = segmenter.segment(&job.volume, &job.segmentation)?;

    materialize(&job, &outputs)
}

fn update(config_path: &Path) -> Result<()> {
    let job = JobConfig::from_file(config_path)?;
    fs::create_dir_all(&job.output_dir)?;

    let codec = Hdf5VolumeCodec;
    let voxels = codec.read(&job.volume)?;
    let source = VolumeSource::new(&job.volume, voxels);
    let container = MaskWriter::new().write(&job.output_dir, &source)?;
    info!(container = %container.display(), "authored container for refinement");

    let driver = ChimeraXDriver::new()?;
    let segmenter = Segmenter::new(driver, &job.output_dir);
    let outputs = segmenter.update(&container)?;

    materialize(&job, &outputs)
}

fn materialize(job: &JobConfig, outputs: &SegmentationOutputs) -> Result<()> {
    if job.output.wants_mask() {
        info!(mask = %outputs.label_volume.display(), "segmentation mask ready");
    }
    if let Some(container) = &outputs.container {
        info!(container = %container.display(), "updated container ready");
    }
    if job.output.wants_pieces() {
        let pieces = write_pieces(&outputs.label_volume, &job.output_dir)?;
        info!(count = pieces.len(), "region pieces ready");
    }
    Ok(())
}

fn author_mask(volume_path: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let codec = Hdf5VolumeCodec;
    let voxels = codec.read(volume_path)?;
    let source = VolumeSource::new(volume_path, voxels);
    let container = MaskWriter::new().write(out_dir, &source)?;
    println!("{}", container.display());
    Ok(())
}

fn extract_pieces(volume_path: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let pieces = write_pieces(volume_path, out_dir)?;
    for piece in &pieces {
        println!("{}", piece.display());
    }
    Ok(())
}

fn inspect(container_path: &Path) -> Result<()> {
    let container = MaskContainer::open(container_path)?;
    println!("{}", serde_json::to_string_pretty(&container.info())?);
    Ok(())
}

/// Write one indicator volume per region of `label_volume` into `out_dir`.
/// Zero regions is a valid outcome, not a failure.
fn write_pieces(label_volume: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let codec = Hdf5VolumeCodec;
    let raw = codec.read(label_volume).map_err(|err| {
        // the tool writes .mrc; reading it needs a codec for that format
        warn!(path = %label_volume.display(), "could not read label volume");
        err
    })?;
    let grid = LabelGrid::from_dyn(raw)?;
    let masks = extract_regions(&grid);
    if masks.is_empty() {
        info!("label volume has no foreground regions");
    }

    let stem = label_volume
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mask".to_string());
    masks
        .iter()
        .map(|mask| {
            let path = out_dir.join(format!("{stem}_group_{}.h5", mask.label));
            codec.write(&path, mask.voxels.view())?;
            Ok(path)
        })
        .collect()
}
