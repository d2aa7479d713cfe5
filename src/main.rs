use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use heightfield::{export, logging};
use heightfield::metrics::steepness_map;
use heightfield::noise_map::terrain_map;
use heightfield::synth::FractalLayer;
use heightfield::{HeightGrid, TerrainConfig, TerrainMesh, TerrainSynthesizer};

/// Noise-space distance one scroll step moves the imported noise map.
const SCROLL_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Layer {
    /// Uniform random whole numbers
    Random,
    /// Fractal Brownian motion, added on top
    Fractal,
    /// Random peaks raised over the terrain
    Voronoi,
    /// Randomized corners and centre
    Corners,
    /// Diamond-square midpoint displacement
    Diamond,
    /// Import from the stock noise-module graph
    NoiseMap,
}

#[derive(Parser, Debug)]
#[command(name = "heightfield")]
#[command(about = "Generate a heightfield terrain and its mesh")]
struct Args {
    /// JSON configuration file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Samples per side (overrides the config)
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Layers to apply, in order
    #[arg(short, long, value_enum, value_delimiter = ',', default_value = "noise-map")]
    layers: Vec<Layer>,

    /// Freeze cells whose elevation is below this value
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Scroll steps applied to the noise-map window along X
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    scroll_x: i32,

    /// Scroll steps applied to the noise-map window along Z
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    scroll_z: i32,

    /// Grayscale heightmap PNG (defaults to a time-stamped name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also export a lit preview PNG
    #[arg(long)]
    shaded_output: Option<PathBuf>,

    /// Also export a steepness PNG
    #[arg(long)]
    steepness_output: Option<PathBuf>,

    /// Rescan the grid for its true min/max before exporting
    #[arg(long)]
    exact_bounds: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TerrainConfig::from_json_file(path)?,
        None => TerrainConfig::default(),
    };
    if let Some(size) = args.size {
        config.grid_size = size;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.threshold.is_some() {
        config.threshold = args.threshold;
    }
    config.seed = Some(config.resolved_seed());
    config.validate()?;

    if args.dump_config {
        println!("{}", config.to_json_string()?);
        return Ok(());
    }

    info!(seed = ?config.seed, size = config.grid_size, "generating terrain");

    let mut grid = HeightGrid::new(config.grid_size);
    let mut synth = TerrainSynthesizer::from_config(&config)?;

    for layer in &args.layers {
        info!(?layer, "applying layer");
        match layer {
            Layer::Random => synth.fill_random(&mut grid),
            Layer::Fractal => {
                let fractal = FractalLayer {
                    octaves: config.octaves,
                    persistence: config.persistence,
                    ..Default::default()
                };
                synth.add_fractal_layer(&mut grid, &fractal)?;
            }
            Layer::Voronoi => {
                synth.add_voronoi_layer(&mut grid, config.peak_count, config.peak_dropoff, config.peak_falloff)
            }
            Layer::Corners => synth.seed_corners(&mut grid),
            Layer::Diamond => synth.midpoint_displacement(&mut grid, config.roughness, config.dampener)?,
            Layer::NoiseMap => {
                let offset = (args.scroll_x as f64 * SCROLL_STEP, args.scroll_z as f64 * SCROLL_STEP);
                let map = terrain_map(synth.noise().seed(), config.grid_size, offset)?;
                synth.import_height_map(&mut grid, &map)?;
            }
        }
    }

    if args.exact_bounds {
        grid.recompute_bounds();
    }
    match grid.bounds() {
        Some((min, max)) => info!(min, max, "elevation range"),
        None => warn!("no layer wrote to the grid"),
    }

    let mesh = TerrainMesh::from_grid(&grid, config.terrain_size);
    let steepness = steepness_map(&grid);
    let mean_steepness = steepness.iter().sum::<f64>() / steepness.len() as f64;
    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        bytes = mesh.vertex_bytes().len() + mesh.normal_bytes().len() + mesh.index_bytes().len(),
        mean_steepness,
        "mesh built"
    );

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("print_{}_hm.png", chrono::Local::now().timestamp())));
    export::export_heightmap(&grid, &output)?;
    info!(path = %output.display(), "heightmap saved");

    if let Some(path) = &args.shaded_output {
        export::export_shaded(&grid, &mesh, path)?;
        info!(path = %path.display(), "shaded preview saved");
    }
    if let Some(path) = &args.steepness_output {
        export::export_steepness(&grid, path)?;
        info!(path = %path.display(), "steepness map saved");
    }

    Ok(())
}
