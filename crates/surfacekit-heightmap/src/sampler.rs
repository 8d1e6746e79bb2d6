//! Height queries over grids and meshes

use std::path::Path;

use surfacekit_core::{Result, SurfaceError};

use crate::grid::HeightGrid;
use crate::mesh::SurfaceMesh;

/// Something that can report a surface height at a planar position
pub trait HeightSampler {
    /// Height at (x, y), `None` only if there is no surface data at all
    fn height_at(&self, x: f64, y: f64) -> Option<f64>;

    /// Height at (x, y), failing with [`SurfaceError::NoSurfaceData`]
    fn sample(&self, x: f64, y: f64) -> std::result::Result<f64, SurfaceError> {
        self.height_at(x, y).ok_or(SurfaceError::NoSurfaceData)
    }
}

impl HeightSampler for HeightGrid {
    fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        self.nearest_height(x, y)
    }
}

impl HeightSampler for SurfaceMesh {
    fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        self.nearest_centroid_height(x, y)
    }
}

/// A loaded surface, either measured grid or triangle mesh
#[derive(Debug, Clone)]
pub enum HeightField {
    Grid(HeightGrid),
    Mesh(SurfaceMesh),
}

impl HeightField {
    /// Load a mesh field from an STL file
    pub fn from_stl(path: impl AsRef<Path>) -> Result<Self> {
        Ok(HeightField::Mesh(SurfaceMesh::load_stl(path)?))
    }

    /// Replace a grid field with its triangulation
    pub fn into_mesh(self) -> Self {
        match self {
            HeightField::Grid(grid) => HeightField::Mesh(SurfaceMesh::from_grid(&grid)),
            mesh => mesh,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HeightField::Grid(_) => "grid",
            HeightField::Mesh(_) => "mesh",
        }
    }
}

impl From<HeightGrid> for HeightField {
    fn from(grid: HeightGrid) -> Self {
        HeightField::Grid(grid)
    }
}

impl From<SurfaceMesh> for HeightField {
    fn from(mesh: SurfaceMesh) -> Self {
        HeightField::Mesh(mesh)
    }
}

impl HeightSampler for HeightField {
    fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        match self {
            HeightField::Grid(grid) => grid.height_at(x, y),
            HeightField::Mesh(mesh) => mesh.height_at(x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_and_mesh_agree_on_flat_surface() {
        let grid = HeightGrid::filled(4, 4, 2.5).unwrap();
        let field = HeightField::from(grid.clone());
        assert_eq!(field.sample(1.3, 2.2), Ok(2.5));

        let mesh = field.into_mesh();
        assert_eq!(mesh.kind(), "mesh");
        assert_eq!(mesh.sample(1.3, 2.2), Ok(2.5));
    }

    #[test]
    fn test_no_surface_data() {
        let field = HeightField::from(SurfaceMesh::new(Vec::new()));
        assert_eq!(field.sample(0.0, 0.0), Err(SurfaceError::NoSurfaceData));

        let grid = HeightGrid::filled(1, 1, f64::NAN).unwrap();
        assert_eq!(grid.sample(0.0, 0.0), Err(SurfaceError::NoSurfaceData));
    }
}
