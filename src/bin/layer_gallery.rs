//! Debug tool for comparing synthesis layers visually.
//! Runs each layer (or stack of layers) on a fresh grid with the same seed
//! and tiles the shaded results into one image.

use heightfield::export::render_shaded;
use heightfield::logging;
use heightfield::noise_map::terrain_map;
use heightfield::synth::{FractalLayer, LayerMode};
use heightfield::{HeightGrid, TerrainConfig, TerrainMesh, TerrainSynthesizer};
use image::{ImageBuffer, Rgb, RgbImage};
use tracing::info;

const SIZE: usize = 129;
const SEED: u64 = 42;
const OUTPUT: &str = "layer_gallery.png";

type Variant = Box<dyn Fn(&mut TerrainSynthesizer, &mut HeightGrid) -> heightfield::Result<()>>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = TerrainConfig {
        grid_size: SIZE,
        seed: Some(SEED),
        ..Default::default()
    };

    let variants: Vec<(&str, Variant)> = vec![
        ("random fill", variant(|s, g| {
            s.fill_random(g);
            Ok(())
        })),
        ("fractal", variant(|s, g| {
            s.add_fractal_layer(g, &FractalLayer::default())
        })),
        ("fractal x2", variant(|s, g| {
            s.add_fractal_layer(g, &FractalLayer { octaves: 6, persistence: 2.52, scale: 1.0, ..Default::default() })?;
            s.add_fractal_layer(g, &FractalLayer { octaves: 8, persistence: 3.52, scale: 0.6, ..Default::default() })
        })),
        ("voronoi", variant(|s, g| {
            s.add_voronoi_layer(g, 5, 1.05, 0.1);
            Ok(())
        })),
        ("diamond-square", variant(|s, g| {
            s.seed_corners(g);
            s.midpoint_displacement(g, 1.0, 6.9)
        })),
        ("noise map", variant(|s, g| {
            let map = terrain_map(s.noise().seed(), SIZE, (0.0, 0.0))?;
            s.import_height_map(g, &map)
        })),
        ("diamond + frozen basin", variant(|s, g| {
            s.midpoint_displacement(g, 1.0, 1.2)?;
            s.set_threshold(Some(10.0));
            s.add_voronoi_layer(g, 5, 1.05, 0.1);
            s.disable_threshold();
            Ok(())
        })),
        ("scrolled fractal", variant(|s, g| {
            let layer = FractalLayer { offset: (64, 64), mode: LayerMode::Replace, ..Default::default() };
            s.add_fractal_layer(g, &layer)
        })),
        ("voronoi + fractal", variant(|s, g| {
            s.add_voronoi_layer(g, 8, 1.05, 0.1);
            s.add_fractal_layer(g, &FractalLayer { scale: 0.3, ..Default::default() })
        })),
    ];

    let mut images: Vec<RgbImage> = Vec::new();
    for (i, (name, apply)) in variants.iter().enumerate() {
        info!(tile = i, name = %name, "rendering variant");
        let mut synth = TerrainSynthesizer::from_config(&config)?;
        let mut grid = HeightGrid::new(SIZE);
        apply(&mut synth, &mut grid)?;
        let mesh = TerrainMesh::from_grid(&grid, config.terrain_size);
        images.push(render_shaded(&grid, &mesh));
    }

    let gallery = create_grid(&images, 3, 3);
    gallery.save(OUTPUT)?;
    info!(path = OUTPUT, "saved layer gallery");
    Ok(())
}

fn variant<F>(f: F) -> Variant
where
    F: Fn(&mut TerrainSynthesizer, &mut HeightGrid) -> heightfield::Result<()> + 'static,
{
    Box::new(f)
}

fn create_grid(images: &[RgbImage], cols: usize, rows: usize) -> RgbImage {
    if images.is_empty() {
        return ImageBuffer::new(1, 1);
    }

    let gap = 4u32;
    let cell_width = images[0].width();
    let cell_height = images[0].height();
    let grid_width = (cell_width + gap) * cols as u32 + gap;
    let grid_height = (cell_height + gap) * rows as u32 + gap;

    let mut grid: RgbImage = ImageBuffer::from_pixel(grid_width, grid_height, Rgb([40, 40, 40]));

    for (idx, img) in images.iter().enumerate() {
        let col = idx % cols;
        let row = idx / cols;
        if row >= rows {
            break;
        }

        let x_offset = gap + col as u32 * (cell_width + gap);
        let y_offset = gap + row as u32 * (cell_height + gap);
        for (x, y, pixel) in img.enumerate_pixels() {
            grid.put_pixel(x_offset + x, y_offset + y, *pixel);
        }
    }

    grid
}
