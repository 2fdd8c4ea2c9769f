//! CPU-built mesh geometry for the scene's ornament shapes.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex layout shared by every scene mesh.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed mesh data ready for upload.
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Axis-aligned cube with the given half-extent per axis.
pub fn cube(half: Vec3) -> MeshData {
    let (hx, hy, hz) = (half.x, half.y, half.z);

    // position, normal, uv per face corner
    struct Face {
        normal: [f32; 3],
        corners: [[f32; 3]; 4],
    }
    let faces = [
        Face { normal: [0.0, 0.0, 1.0], corners: [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]] },
        Face { normal: [0.0, 0.0, -1.0], corners: [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]] },
        Face { normal: [1.0, 0.0, 0.0], corners: [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]] },
        Face { normal: [-1.0, 0.0, 0.0], corners: [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]] },
        Face { normal: [0.0, 1.0, 0.0], corners: [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]] },
        Face { normal: [0.0, -1.0, 0.0], corners: [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]] },
    ];

    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for face in &faces {
        let base = vertices.len() as u32;
        for (corner, uv) in face.corners.iter().zip(uvs) {
            vertices.push(Vertex {
                position: *corner,
                normal: face.normal,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

/// Latitude/longitude sphere.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;

            let normal = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(Vertex {
                position: (normal * radius).to_array(),
                normal: normal.to_array(),
                uv: [u, v],
            });
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    MeshData { vertices, indices }
}

/// Flat quad in the XY plane facing +Z, with a back face so it is visible
/// from both sides.
pub fn quad(half_width: f32, half_height: f32) -> MeshData {
    let corners = [
        [-half_width, -half_height],
        [half_width, -half_height],
        [half_width, half_height],
        [-half_width, half_height],
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(8);
    for (c, uv) in corners.iter().zip(uvs) {
        vertices.push(Vertex {
            position: [c[0], c[1], 0.0],
            normal: [0.0, 0.0, 1.0],
            uv,
        });
    }
    for (c, uv) in corners.iter().zip(uvs) {
        vertices.push(Vertex {
            position: [c[0], c[1], 0.0],
            normal: [0.0, 0.0, -1.0],
            uv,
        });
    }

    MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6],
    }
}

/// Candy cane: a tube swept along a Catmull-Rom curve through the cane's
/// control points (straight shaft bending into a hook).
pub fn candy_cane(tube_radius: f32, path_segments: u32, radial_segments: u32) -> MeshData {
    let control = [
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.3, 1.3, 0.0),
        Vec3::new(0.5, 1.0, 0.0),
    ];

    // Sample the curve and its tangents.
    let mut centers = Vec::with_capacity(path_segments as usize + 1);
    for i in 0..=path_segments {
        let t = i as f32 / path_segments as f32;
        centers.push(catmull_rom(&control, t));
    }

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let mut prev_normal = Vec3::X;
    for (i, center) in centers.iter().enumerate() {
        let tangent = if i == 0 {
            (centers[1] - centers[0]).normalize()
        } else if i == centers.len() - 1 {
            (centers[i] - centers[i - 1]).normalize()
        } else {
            (centers[i + 1] - centers[i - 1]).normalize()
        };

        // Propagate the frame normal along the path to avoid twisting.
        let normal = (prev_normal - tangent * prev_normal.dot(tangent)).normalize_or_zero();
        let normal = if normal.length_squared() < 0.5 {
            let alt = tangent.cross(Vec3::Y);
            if alt.length_squared() > 1e-6 {
                alt.normalize()
            } else {
                Vec3::X
            }
        } else {
            normal
        };
        prev_normal = normal;
        let binormal = tangent.cross(normal);

        let v = i as f32 / path_segments as f32;
        for j in 0..=radial_segments {
            let u = j as f32 / radial_segments as f32;
            let angle = u * std::f32::consts::TAU;
            let offset = normal * angle.cos() + binormal * angle.sin();
            vertices.push(Vertex {
                position: (*center + offset * tube_radius).to_array(),
                normal: offset.to_array(),
                uv: [u, v * 4.0],
            });
        }
    }

    let stride = radial_segments + 1;
    for i in 0..path_segments {
        for j in 0..radial_segments {
            let a = i * stride + j;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    MeshData { vertices, indices }
}

/// Centripetal-free uniform Catmull-Rom over the whole control polygon,
/// clamping the end tangents.
fn catmull_rom(control: &[Vec3], t: f32) -> Vec3 {
    let n = control.len();
    debug_assert!(n >= 2);

    let span = (n - 1) as f32;
    let scaled = (t * span).clamp(0.0, span - f32::EPSILON.max(1e-6));
    let i = scaled.floor() as usize;
    let local = scaled - i as f32;

    let p0 = control[i.saturating_sub(1)];
    let p1 = control[i];
    let p2 = control[(i + 1).min(n - 1)];
    let p3 = control[(i + 2).min(n - 1)];

    let t2 = local * local;
    let t3 = t2 * local;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * local
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_36_indices() {
        let mesh = cube(Vec3::splat(0.25));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn sphere_vertices_sit_on_radius() {
        let mesh = uv_sphere(0.3, 16, 12);
        for v in &mesh.vertices {
            let r = Vec3::from(v.position).length();
            assert!((r - 0.3).abs() < 1e-4);
        }
    }

    #[test]
    fn cane_indices_in_bounds() {
        let mesh = candy_cane(0.08, 20, 8);
        let max = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn catmull_rom_hits_endpoints() {
        let pts = [Vec3::ZERO, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)];
        assert!(catmull_rom(&pts, 0.0).distance(Vec3::ZERO) < 1e-4);
        assert!(catmull_rom(&pts, 1.0).distance(Vec3::new(1.0, 1.0, 0.0)) < 1e-2);
    }
}
