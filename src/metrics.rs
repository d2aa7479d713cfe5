//! Slope metrics read off the heightfield.

use crate::grid::HeightGrid;

/// Steepness at `(x, z)`: length of the height difference to the next cell
/// along X and along Z. On the last row/column the previous cell is used.
pub fn steepness(grid: &HeightGrid, x: usize, z: usize) -> f64 {
    let last = grid.size() - 1;
    let nx = if x + 1 > last { x - 1 } else { x + 1 };
    let nz = if z + 1 > last { z - 1 } else { z + 1 };

    let (xi, zi) = (x as isize, z as isize);
    let height = grid.get(xi, zi);
    let dx = grid.get(nx as isize, zi) - height;
    let dz = grid.get(xi, nz as isize) - height;

    (dx * dx + dz * dz).sqrt()
}

/// Steepness of every cell, row-major.
pub fn steepness_map(grid: &HeightGrid) -> Vec<f64> {
    let size = grid.size();
    (0..size)
        .flat_map(|z| (0..size).map(move |x| (x, z)))
        .map(|(x, z)| steepness(grid, x, z))
        .collect()
}
