//! # Surface Mesh
//!
//! Triangle mesh of a scanned surface. Meshes come either from an STL file
//! or from triangulating a [`HeightGrid`], and can be saved back to binary
//! STL.
//!
//! Height queries use the nearest-centroid approximation: the answer is the
//! centroid height of the triangle whose centroid is planarly closest to the
//! query point.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nalgebra::{Point3, Vector3};
use surfacekit_core::{write_atomic_with, Error, Result};
use tracing::debug;

use crate::grid::HeightGrid;

/// A triangle with its face normal
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle3D {
    pub vertices: [Point3<f64>; 3],
    pub normal: Vector3<f64>,
}

impl Triangle3D {
    pub fn new(v1: Point3<f64>, v2: Point3<f64>, v3: Point3<f64>) -> Self {
        let normal = face_normal(&v1, &v2, &v3);
        Self {
            vertices: [v1, v2, v3],
            normal,
        }
    }

    pub fn centroid(&self) -> Point3<f64> {
        let [a, b, c] = &self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Axis-aligned bounds (min, max)
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for v in &self.vertices[1..] {
            min = min.inf(v);
            max = max.sup(v);
        }
        (min, max)
    }
}

fn face_normal(v1: &Point3<f64>, v2: &Point3<f64>, v3: &Point3<f64>) -> Vector3<f64> {
    let edge1 = v2 - v1;
    let edge2 = v3 - v1;
    edge1
        .cross(&edge2)
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Triangle mesh of a surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    pub triangles: Vec<Triangle3D>,
    pub bounds_min: Point3<f64>,
    pub bounds_max: Point3<f64>,
}

impl SurfaceMesh {
    pub fn new(triangles: Vec<Triangle3D>) -> Self {
        let mut mesh = Self {
            triangles,
            bounds_min: Point3::origin(),
            bounds_max: Point3::origin(),
        };
        mesh.calculate_bounds();
        mesh
    }

    /// Triangulate a height grid.
    ///
    /// Every cell quad whose four corners hold readings becomes two
    /// triangles; quads touching a missing reading are left out.
    pub fn from_grid(grid: &HeightGrid) -> Self {
        let mut triangles = Vec::new();
        let vertex = |row: usize, col: usize| -> Option<Point3<f64>> {
            let z = grid.get(row, col).filter(|h| !h.is_nan())?;
            let (x, y) = grid.cell_position(row, col);
            Some(Point3::new(x, y, z))
        };

        for row in 0..grid.rows().saturating_sub(1) {
            for col in 0..grid.cols().saturating_sub(1) {
                let corners = (
                    vertex(row, col),
                    vertex(row, col + 1),
                    vertex(row + 1, col),
                    vertex(row + 1, col + 1),
                );
                if let (Some(v00), Some(v10), Some(v01), Some(v11)) = corners {
                    triangles.push(Triangle3D::new(v00, v10, v01));
                    triangles.push(Triangle3D::new(v01, v10, v11));
                }
            }
        }

        debug!(
            "Triangulated {}x{} grid into {} triangles",
            grid.rows(),
            grid.cols(),
            triangles.len()
        );
        Self::new(triangles)
    }

    pub fn from_stl_mesh(stl_mesh: &stl_io::IndexedMesh) -> Self {
        let point = |index: usize| {
            stl_mesh
                .vertices
                .get(index)
                .map(|v| Point3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
        };

        let triangles = stl_mesh
            .faces
            .iter()
            .filter_map(|face| {
                Some(Triangle3D::new(
                    point(face.vertices[0])?,
                    point(face.vertices[1])?,
                    point(face.vertices[2])?,
                ))
            })
            .collect();

        Self::new(triangles)
    }

    /// Read a binary or ASCII STL file
    pub fn load_stl(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Importing STL file: {}", path.display());

        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut reader = BufReader::new(file);
        let stl = stl_io::read_stl(&mut reader).map_err(|e| Error::io(path, e))?;

        debug!("STL contains {} faces", stl.faces.len());
        Ok(Self::from_stl_mesh(&stl))
    }

    /// Atomically write the mesh as binary STL
    pub fn save_stl(&self, path: impl AsRef<Path>) -> Result<()> {
        let stl_triangles: Vec<stl_io::Triangle> = self
            .triangles
            .iter()
            .map(|t| stl_io::Triangle {
                normal: stl_io::Vector::new(to_f32(&t.normal)),
                vertices: t.vertices.map(|v| stl_io::Vector::new(to_f32(&v.coords))),
            })
            .collect();

        write_atomic_with(path, |writer| {
            stl_io::write_stl(writer, stl_triangles.iter())
        })
    }

    fn calculate_bounds(&mut self) {
        let Some(first) = self.triangles.first() else {
            return;
        };

        let (mut min, mut max) = first.bounds();
        for triangle in &self.triangles[1..] {
            let (tri_min, tri_max) = triangle.bounds();
            min = min.inf(&tri_min);
            max = max.sup(&tri_max);
        }

        self.bounds_min = min;
        self.bounds_max = max;
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Size along X, Y and Z
    pub fn dimensions(&self) -> (f64, f64, f64) {
        let d = self.bounds_max - self.bounds_min;
        (d.x, d.y, d.z)
    }

    /// Translate every vertex by `offset`
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                *vertex += offset;
            }
        }
        self.calculate_bounds();
    }

    /// Copy of the mesh with its vertex centroid moved to the XY origin.
    ///
    /// Z is left alone so heights stay as measured.
    pub fn centered_xy(&self) -> Self {
        let count = self.triangles.len() * 3;
        if count == 0 {
            return self.clone();
        }

        let sum = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .fold(Vector3::zeros(), |acc, v| acc + v.coords);
        let centroid = sum / count as f64;

        let mut centered = self.clone();
        centered.translate(Vector3::new(-centroid.x, -centroid.y, 0.0));
        centered
    }

    /// Centroid height of the triangle whose centroid is planarly nearest
    /// to (x, y)
    pub fn nearest_centroid_height(&self, x: f64, y: f64) -> Option<f64> {
        self.triangles
            .iter()
            .map(|t| {
                let c = t.centroid();
                ((c.x - x).powi(2) + (c.y - y).powi(2), c.z)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, z)| z)
    }
}

fn to_f32(v: &Vector3<f64>) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x3() -> HeightGrid {
        HeightGrid::new(3, 3, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0])
            .unwrap()
            .with_spacing(10.0, 10.0)
    }

    #[test]
    fn test_from_grid_triangle_count() {
        let mesh = SurfaceMesh::from_grid(&grid_3x3());
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.dimensions(), (20.0, 20.0, 2.0));
    }

    #[test]
    fn test_from_grid_skips_missing_corners() {
        let mut grid = grid_3x3();
        grid.set(1, 1, f64::NAN);
        let mesh = SurfaceMesh::from_grid(&grid);
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_triangle_winding() {
        let mesh = SurfaceMesh::from_grid(&HeightGrid::filled(2, 2, 0.0).unwrap());
        let t = &mesh.triangles[0];
        assert_eq!(t.vertices[1], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(t.vertices[2], Point3::new(0.0, 1.0, 0.0));
        assert!((t.normal.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_centered_xy_keeps_z() {
        let mesh = SurfaceMesh::from_grid(&grid_3x3()).centered_xy();
        assert!((mesh.bounds_min.x + 10.0).abs() < 1e-9);
        assert!((mesh.bounds_max.y - 10.0).abs() < 1e-9);
        assert_eq!(mesh.bounds_min.z, 0.0);
    }

    #[test]
    fn test_nearest_centroid() {
        let mesh = SurfaceMesh::from_grid(&HeightGrid::filled(2, 2, 3.0).unwrap());
        assert_eq!(mesh.nearest_centroid_height(100.0, -50.0), Some(3.0));
        assert_eq!(SurfaceMesh::new(Vec::new()).nearest_centroid_height(0.0, 0.0), None);
    }

    #[test]
    fn test_stl_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.stl");
        let mesh = SurfaceMesh::from_grid(&grid_3x3());
        mesh.save_stl(&path).unwrap();

        let loaded = SurfaceMesh::load_stl(&path).unwrap();
        assert_eq!(loaded.triangle_count(), mesh.triangle_count());
        assert_eq!(loaded.dimensions(), mesh.dimensions());
    }

    #[test]
    fn test_load_missing_stl() {
        let err = SurfaceMesh::load_stl("/missing/surface.stl").unwrap_err();
        assert!(err.is_io_failure());
    }
}
