//! Render geometry derived from a [`HeightGrid`].
//!
//! Buffers are laid out for direct upload: 3 `f64` per vertex position,
//! 3 `f64` per normal, and 6 `u32` indices (two triangles) per grid quad.

use tracing::debug;

use crate::error::{Result, TerrainError};
use crate::grid::HeightGrid;

/// Default world-space extent of the terrain on X and Z.
pub const DEFAULT_TERRAIN_SIZE: f64 = 800.0;

/// Vertical component of the unnormalized central-difference normal.
/// Changing it changes how smooth the shaded surface looks.
const NORMAL_VERTICAL_WEIGHT: f64 = 2.0;

/// Vertex, normal and index buffers for one grid.
///
/// Sizes are fixed at construction: `3 * n^2` positions and normals,
/// `6 * (n - 1)^2` indices.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainMesh {
    grid_size: usize,
    terrain_size: f64,
    vertices: Vec<f64>,
    normals: Vec<f64>,
    indices: Vec<u32>,
}

impl TerrainMesh {
    /// Allocate buffers for a `grid_size` grid. Positions and normals start at zero.
    ///
    /// # Panics
    ///
    /// If `grid_size > 65536`, see [`generate_indices`].
    pub fn new(grid_size: usize, terrain_size: f64) -> Self {
        let count = grid_size * grid_size;
        Self {
            grid_size,
            terrain_size,
            vertices: vec![0.0; count * 3],
            normals: vec![0.0; count * 3],
            indices: generate_indices(grid_size),
        }
    }

    /// Allocate buffers sized for `grid` and fill them.
    pub fn from_grid(grid: &HeightGrid, terrain_size: f64) -> Self {
        let mut mesh = Self::new(grid.size(), terrain_size);
        generate_mesh(grid, terrain_size, &mut mesh.vertices, &mut mesh.normals);
        mesh
    }

    /// Overwrite positions and normals from `grid` without reallocating.
    pub fn rebuild(&mut self, grid: &HeightGrid) -> Result<()> {
        if grid.size() != self.grid_size {
            return Err(TerrainError::SizeMismatch {
                expected: self.grid_size,
                actual: grid.size(),
            });
        }
        generate_mesh(grid, self.terrain_size, &mut self.vertices, &mut self.normals);
        debug!(grid_size = self.grid_size, "rebuilt terrain mesh");
        Ok(())
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn terrain_size(&self) -> f64 {
        self.terrain_size
    }

    pub fn vertices(&self) -> &[f64] {
        &self.vertices
    }

    pub fn normals(&self) -> &[f64] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Position of vertex `(x, z)`.
    pub fn position(&self, x: usize, z: usize) -> [f64; 3] {
        let p = (z * self.grid_size + x) * 3;
        [self.vertices[p], self.vertices[p + 1], self.vertices[p + 2]]
    }

    /// Normal of vertex `(x, z)`.
    pub fn normal(&self, x: usize, z: usize) -> [f64; 3] {
        let p = (z * self.grid_size + x) * 3;
        [self.normals[p], self.normals[p + 1], self.normals[p + 2]]
    }

    // Byte views for GPU upload.

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Fill `vertices` and `normals` from `grid`, row by row (z outer, x inner).
///
/// X and Z are stretched linearly over `[0, terrain_size]`; Y is the elevation.
///
/// # Panics
/// If either buffer is not exactly `3 * size^2` long.
pub fn generate_mesh(grid: &HeightGrid, terrain_size: f64, vertices: &mut [f64], normals: &mut [f64]) {
    let size = grid.size();
    assert_eq!(vertices.len(), size * size * 3, "vertex buffer does not match grid");
    assert_eq!(normals.len(), size * size * 3, "normal buffer does not match grid");

    let span = (size - 1) as f64;
    let mut p = 0;
    for z in 0..size {
        for x in 0..size {
            vertices[p * 3] = x as f64 / span * terrain_size;
            vertices[p * 3 + 1] = grid.get(x as isize, z as isize);
            vertices[p * 3 + 2] = z as f64 / span * terrain_size;

            let normal = vertex_normal(grid, x, z);
            normals[p * 3..p * 3 + 3].copy_from_slice(&normal);
            p += 1;
        }
    }
}

/// Central-difference normal at `(x, z)`. Neighbours off the grid read as zero.
pub fn vertex_normal(grid: &HeightGrid, x: usize, z: usize) -> [f64; 3] {
    let (x, z) = (x as isize, z as isize);
    let h_left = grid.get(x - 1, z);
    let h_right = grid.get(x + 1, z);
    let h_down = grid.get(x, z - 1);
    let h_up = grid.get(x, z + 1);

    let n = [h_left - h_right, NORMAL_VERTICAL_WEIGHT, h_down - h_up];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    [n[0] / len, n[1] / len, n[2] / len]
}

/// Triangle list for a `size x size` grid.
///
/// Each quad emits `(top_left, bottom_left, top_right)` then
/// `(top_right, bottom_left, bottom_right)`. Downstream backface culling
/// depends on this winding.
///
/// # Panics
///
/// If a vertex index of the grid does not fit in `u32` (`size > 65536`).
pub fn generate_indices(size: usize) -> Vec<u32> {
    let fits = size
        .checked_mul(size)
        .is_some_and(|count| u32::try_from(count.saturating_sub(1)).is_ok());
    assert!(fits, "a {size}x{size} grid has vertex indices beyond u32");
    let quads = size.saturating_sub(1);
    let mut indices = Vec::with_capacity(6 * quads * quads);

    for gz in 0..quads {
        for gx in 0..quads {
            let top_left = (gz * size + gx) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((gz + 1) * size + gx) as u32;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sloped_grid(size: usize) -> HeightGrid {
        let mut grid = HeightGrid::new(size);
        for z in 0..size {
            for x in 0..size {
                grid.set(x, z, (x * 3 + z * z) as f64);
            }
        }
        grid
    }

    #[test]
    fn test_index_count_and_range() {
        for size in [2usize, 3, 5, 17] {
            let indices = generate_indices(size);
            assert_eq!(indices.len(), 6 * (size - 1) * (size - 1));
            assert!(indices.iter().all(|&i| (i as usize) < size * size));
            for tri in indices.chunks(3) {
                assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
            }
        }
    }

    #[test]
    #[should_panic(expected = "beyond u32")]
    fn test_indices_reject_grids_past_u32() {
        generate_indices(65_537);
    }

    #[test]
    fn test_first_quad_winding() {
        let indices = generate_indices(4);
        assert_eq!(&indices[..6], &[0, 4, 1, 1, 4, 5]);
        // Last quad of a 4x4 grid: top-left is 2 * 4 + 2.
        assert_eq!(&indices[indices.len() - 6..], &[10, 14, 11, 11, 14, 15]);
    }

    #[test]
    fn test_buffer_sizes() {
        let mesh = TerrainMesh::from_grid(&sloped_grid(6), DEFAULT_TERRAIN_SIZE);
        assert_eq!(mesh.vertices().len(), 3 * 36);
        assert_eq!(mesh.normals().len(), 3 * 36);
        assert_eq!(mesh.indices().len(), 6 * 25);
        assert_eq!(mesh.triangle_count(), 50);
        assert_eq!(mesh.vertex_bytes().len(), 3 * 36 * 8);
        assert_eq!(mesh.index_bytes().len(), 6 * 25 * 4);
    }

    #[test]
    fn test_positions_span_terrain_size() {
        let grid = sloped_grid(5);
        let mesh = TerrainMesh::from_grid(&grid, 800.0);
        assert_eq!(mesh.position(0, 0), [0.0, 0.0, 0.0]);
        assert_eq!(mesh.position(4, 0), [800.0, 12.0, 0.0]);
        assert_eq!(mesh.position(2, 4), [400.0, 22.0, 800.0]);
    }

    #[test]
    fn test_flat_interior_normal_points_up() {
        let mut grid = HeightGrid::new(5);
        for z in 0..5 {
            for x in 0..5 {
                grid.set(x, z, 10.0);
            }
        }
        let n = vertex_normal(&grid, 2, 2);
        assert_eq!(n, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normal_central_difference() {
        let mut grid = HeightGrid::new(3);
        grid.set(0, 1, 4.0);
        grid.set(2, 1, 2.0);
        grid.set(1, 0, 1.0);
        grid.set(1, 2, 3.0);

        // (h_left - h_right, 2, h_down - h_up) = (2, 2, -2)
        let n = vertex_normal(&grid, 1, 1);
        let inv = 1.0 / 12f64.sqrt();
        assert!((n[0] - 2.0 * inv).abs() < 1e-12);
        assert!((n[1] - 2.0 * inv).abs() < 1e-12);
        assert!((n[2] + 2.0 * inv).abs() < 1e-12);
    }

    #[test]
    fn test_border_normal_uses_zero_fallback() {
        let mut grid = HeightGrid::new(2);
        for z in 0..2 {
            for x in 0..2 {
                grid.set(x, z, 2.0);
            }
        }
        // Left and down neighbours are off-grid and read as 0.
        let n = vertex_normal(&grid, 0, 0);
        let inv = 1.0 / 12f64.sqrt();
        assert!((n[0] + 2.0 * inv).abs() < 1e-12);
        assert!((n[2] + 2.0 * inv).abs() < 1e-12);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let grid = sloped_grid(9);
        let first = TerrainMesh::from_grid(&grid, 800.0);
        let mut second = TerrainMesh::new(9, 800.0);
        second.rebuild(&grid).unwrap();
        second.rebuild(&grid).unwrap();

        assert_eq!(first.vertex_bytes(), second.vertex_bytes());
        assert_eq!(first.normal_bytes(), second.normal_bytes());
        assert_eq!(first.index_bytes(), second.index_bytes());
    }

    #[test]
    fn test_rebuild_keeps_buffers() {
        let mut grid = sloped_grid(4);
        let mut mesh = TerrainMesh::from_grid(&grid, 10.0);
        let ptr = mesh.vertices().as_ptr();

        grid.set(1, 1, 99.0);
        mesh.rebuild(&grid).unwrap();
        assert_eq!(mesh.vertices().as_ptr(), ptr);
        assert_eq!(mesh.position(1, 1)[1], 99.0);
    }

    #[test]
    fn test_rebuild_rejects_other_sizes() {
        let mut mesh = TerrainMesh::new(4, 10.0);
        let grid = HeightGrid::new(5);
        assert!(matches!(
            mesh.rebuild(&grid),
            Err(TerrainError::SizeMismatch { expected: 4, actual: 5 })
        ));
    }
}
