//! Image export for heightfields: grayscale elevation, steepness and a
//! lit preview shaded with the mesh normals.

use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use crate::error::Result;
use crate::grid::HeightGrid;
use crate::mesh::TerrainMesh;
use crate::metrics::steepness_map;

/// Linearly map `value` from `[from_min, from_max]` to `[to_min, to_max]`.
pub fn remap(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    (value - from_min) * (to_max - to_min) / (from_max - from_min) + to_min
}

/// Grayscale elevation image, scaled by the grid's running bounds.
///
/// Row `z = 0` ends up at the bottom of the image. A grid that was never
/// written, or whose bounds are a single value, renders black.
pub fn render_heightmap(grid: &HeightGrid) -> GrayImage {
    let size = grid.size();
    let bounds = grid.bounds().filter(|(min, max)| max > min);
    let mut img: GrayImage = ImageBuffer::new(size as u32, size as u32);

    for (x, z, h) in grid.iter() {
        let level = match bounds {
            Some((min, max)) => remap(h, min, max, 0.0, 255.0).clamp(0.0, 255.0) as u8,
            None => 0,
        };
        img.put_pixel(x as u32, (size - 1 - z) as u32, Luma([level]));
    }

    img
}

pub fn export_heightmap(grid: &HeightGrid, path: impl AsRef<Path>) -> Result<()> {
    render_heightmap(grid).save(path)?;
    Ok(())
}

/// Grayscale steepness image, normalized by the steepest cell.
pub fn render_steepness(grid: &HeightGrid) -> GrayImage {
    let size = grid.size();
    let steepness = steepness_map(grid);
    let max = steepness.iter().cloned().fold(0.0f64, f64::max);
    let mut img: GrayImage = ImageBuffer::new(size as u32, size as u32);

    for (idx, &s) in steepness.iter().enumerate() {
        let (x, z) = (idx % size, idx / size);
        let level = if max > 0.0 { (s / max * 255.0) as u8 } else { 0 };
        img.put_pixel(x as u32, (size - 1 - z) as u32, Luma([level]));
    }

    img
}

pub fn export_steepness(grid: &HeightGrid, path: impl AsRef<Path>) -> Result<()> {
    render_steepness(grid).save(path)?;
    Ok(())
}

/// Top-down preview: elevation colour ramp lit by the mesh normals.
pub fn render_shaded(grid: &HeightGrid, mesh: &TerrainMesh) -> RgbImage {
    let size = grid.size();
    let (min_h, max_h) = grid.bounds().unwrap_or((0.0, 1.0));
    let range = (max_h - min_h).max(1e-9);

    // Light from high above the terrain, slightly off-axis.
    let light = normalize([-0.4, 1.0, -0.3]);
    let mut img = ImageBuffer::new(size as u32, size as u32);

    for (x, z, h) in grid.iter() {
        let n = mesh.normal(x, z);
        let diffuse = (n[0] * light[0] + n[1] * light[1] + n[2] * light[2]).max(0.0);
        let ambient = 0.3;
        let lighting = (ambient + (1.0 - ambient) * diffuse).min(1.0);

        let t = ((h - min_h) / range).clamp(0.0, 1.0);
        let base = elevation_color(t);
        let color = Rgb([
            (base[0] as f64 * lighting) as u8,
            (base[1] as f64 * lighting) as u8,
            (base[2] as f64 * lighting) as u8,
        ]);
        img.put_pixel(x as u32, (size - 1 - z) as u32, color);
    }

    img
}

pub fn export_shaded(grid: &HeightGrid, mesh: &TerrainMesh, path: impl AsRef<Path>) -> Result<()> {
    render_shaded(grid, mesh).save(path)?;
    Ok(())
}

fn elevation_color(t: f64) -> [u8; 3] {
    if t < 0.05 {
        [40, 80, 160] // water
    } else if t < 0.35 {
        [80, 140, 60] // lowland
    } else if t < 0.65 {
        let k = (t - 0.35) / 0.3;
        [(80.0 + k * 80.0) as u8, (140.0 - k * 60.0) as u8, (60.0 - k * 20.0) as u8]
    } else if t < 0.9 {
        let v = (160.0 - (t - 0.65) / 0.25 * 40.0) as u8;
        [v, v - 10, v - 20]
    } else {
        [240, 240, 245] // snow
    }
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(size: usize) -> HeightGrid {
        let mut grid = HeightGrid::new(size);
        for z in 0..size {
            for x in 0..size {
                grid.set(x, z, (x * 10) as f64);
            }
        }
        grid
    }

    #[test]
    fn test_remap() {
        assert_eq!(remap(50.0, 0.0, 100.0, 0.0, 255.0), 127.5);
        assert_eq!(remap(10.0, 10.0, 20.0, -1.0, 1.0), -1.0);
    }

    #[test]
    fn test_heightmap_spans_full_range() {
        let grid = ramp(4);
        let img = render_heightmap(&grid);
        assert_eq!(img.dimensions(), (4, 4));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(3, 0)[0], 255);
    }

    #[test]
    fn test_unwritten_grid_is_black() {
        let img = render_heightmap(&HeightGrid::new(3));
        assert!(img.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_z_axis_is_flipped() {
        let mut grid = HeightGrid::new(3);
        grid.set(0, 0, 1.0);
        grid.set(1, 1, 0.0);
        let img = render_heightmap(&grid);
        assert_eq!(img.get_pixel(0, 2)[0], 255);
    }

    #[test]
    fn test_steepness_image_normalized() {
        let img = render_steepness(&ramp(4));
        assert!(img.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_shaded_dimensions() {
        let grid = ramp(5);
        let mesh = TerrainMesh::from_grid(&grid, 800.0);
        let img = render_shaded(&grid, &mesh);
        assert_eq!(img.dimensions(), (5, 5));
    }

    #[test]
    fn test_export_writes_png() {
        let path = std::env::temp_dir().join("heightfield_export_test.png");
        export_heightmap(&ramp(8), &path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.width(), 8);
        let _ = std::fs::remove_file(&path);
    }
}
