//! # Primitive Shape Generation
//!
//! All shapes are Y-up, centered at the origin, with outward normals and
//! texture coordinates.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
///
/// Returns a sphere of radius 1.0 centered at the origin.
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 to PI
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32; // 0 to 2*PI
            let (sin_phi, cos_phi) = phi.sin_cos();

            let x = sin_theta * cos_phi;
            let y = cos_theta;
            let z = sin_theta * sin_phi;

            data.vertices.push([x, y, z]);
            data.normals.push([x, y, z]); // Normal is same as position for unit sphere
            data.tex_coords
                .push([long as f32 / long_segs as f32, lat as f32 / lat_segs as f32]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.extend_from_slice(&[first, second, first + 1]);
            data.indices.extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    data
}

/// Generate a plane in the XY plane facing +Z
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
pub fn generate_plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tex_coords.push([u, v]);
        }
    }

    // Counter-clockwise when viewed from +Z
    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}

/// Generate a box along Y with its sides split into rows along the height
///
/// The four sides are split into `height_segments` rows so a per-height
/// vertex displacement bends them smoothly instead of only moving the ends.
/// Each face has its own vertices so normals stay flat.
///
/// # Arguments
/// * `width` - Extent along X
/// * `height` - Extent along Y
/// * `depth` - Extent along Z
/// * `height_segments` - Number of rows along the height
pub fn generate_slab(width: f32, height: f32, depth: f32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let h_segs = height_segments.max(1);
    let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);

    // (origin, u edge, v edge, normal) with u x v pointing along the normal
    let sides = [
        ([-hx, -hy, hz], [width, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([hx, -hy, -hz], [-width, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([hx, -hy, hz], [0.0, 0.0, -depth], [1.0, 0.0, 0.0]),
        ([-hx, -hy, -hz], [0.0, 0.0, depth], [-1.0, 0.0, 0.0]),
    ];
    for (origin, u_edge, normal) in sides {
        push_face(&mut data, origin, u_edge, [0.0, height, 0.0], normal, h_segs);
    }

    push_face(
        &mut data,
        [-hx, hy, hz],
        [width, 0.0, 0.0],
        [0.0, 0.0, -depth],
        [0.0, 1.0, 0.0],
        1,
    );
    push_face(
        &mut data,
        [-hx, -hy, -hz],
        [width, 0.0, 0.0],
        [0.0, 0.0, depth],
        [0.0, -1.0, 0.0],
        1,
    );

    data
}

/// Appends a flat quad grid with one column and `rows` rows along `v_edge`
fn push_face(
    data: &mut GeometryData,
    origin: [f32; 3],
    u_edge: [f32; 3],
    v_edge: [f32; 3],
    normal: [f32; 3],
    rows: u32,
) {
    let base = data.vertices.len() as u32;

    for row in 0..=rows {
        let v = row as f32 / rows as f32;
        for u in [0.0, 1.0] {
            data.vertices.push([
                origin[0] + u * u_edge[0] + v * v_edge[0],
                origin[1] + u * u_edge[1] + v * v_edge[1],
                origin[2] + u * u_edge[2] + v * v_edge[2],
            ]);
            data.normals.push(normal);
            data.tex_coords.push([u, v]);
        }
    }

    for row in 0..rows {
        let i = base + row * 2;
        let next_row = i + 2;
        data.indices.extend_from_slice(&[i, i + 1, next_row]);
        data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
    }
}
