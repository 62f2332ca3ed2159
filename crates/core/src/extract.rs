//! Iso-surface extraction by cube marching.
//!
//! Every grid cell is classified by which of its eight corners lie inside the
//! surface (sample strictly above the isolation level). Cells that straddle
//! the level are split into six tetrahedra around the cell's main diagonal
//! (corner 0 to corner 7), and each tetrahedron is triangulated from its own
//! inside/outside pattern. Because every cell uses the same split, the faces
//! shared by neighbouring cells are cut identically and the resulting mesh is
//! watertight without a 256-case lookup table or ambiguous-face handling.
//!
//! Vertices are interpolated linearly along grid edges and deduplicated per
//! edge, so the output is an indexed mesh. Vertex normals come from the
//! negated field gradient, interpolated along the same edge.

use std::collections::HashMap;

use glam::DVec3;

use crate::field::ScalarField;
use crate::mesh::IsoSurface;

/// Corner offsets of a grid cell, indexed by bit pattern `x | y << 1 | z << 2`.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// The six tetrahedra of a cell, one per axis ordering walked from corner 0
/// to corner 7.
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

/// A cell corner resolved against the field.
#[derive(Debug, Clone, Copy)]
struct Corner {
    grid: [usize; 3],
    index: usize,
    value: f64,
}

/// Bit mask of the corners of cell `(x, y, z)` whose sample exceeds
/// `isolation`; bit `i` refers to `CORNERS[i]`.
///
/// The cell spans grid points `(x..=x+1, y..=y+1, z..=z+1)`; callers keep
/// `x, y, z < resolution - 1`.
pub fn classify_cell(field: &ScalarField, x: usize, y: usize, z: usize, isolation: f64) -> u8 {
    CORNERS.iter().enumerate().fold(0u8, |mask, (i, [dx, dy, dz])| {
        let value = field.data()[field.index(x + dx, y + dy, z + dz)];
        if value > isolation {
            mask | (1 << i)
        } else {
            mask
        }
    })
}

/// Parameter along the edge `a -> b` where the linear interpolant of the two
/// samples equals `isolation`, clamped to `[0, 1]`.
///
/// Equal samples return the midpoint.
pub fn edge_crossing(value_a: f64, value_b: f64, isolation: f64) -> f64 {
    let delta = value_b - value_a;
    if delta.abs() < f64::EPSILON {
        return 0.5;
    }
    ((isolation - value_a) / delta).clamp(0.0, 1.0)
}

/// Extracts the iso-surface of `field` at `isolation` in normalized
/// coordinates.
pub fn extract(field: &ScalarField, isolation: f64) -> IsoSurface {
    let mut mesh = IsoSurface::new();
    IsoSurfaceExtractor::new(isolation).extract_into(field, &mut mesh);
    mesh
}

/// Reusable extractor holding the isolation level and the per-edge vertex
/// cache, so repeated frames avoid reallocating.
#[derive(Debug, Clone)]
pub struct IsoSurfaceExtractor {
    isolation: f64,
    edge_vertices: HashMap<(usize, usize), u32>,
}

impl IsoSurfaceExtractor {
    pub fn new(isolation: f64) -> Self {
        Self {
            isolation,
            edge_vertices: HashMap::new(),
        }
    }

    pub fn isolation(&self) -> f64 {
        self.isolation
    }

    /// Rebuilds `mesh` from scratch out of `field`. Positions are in
    /// normalized `[0, 1]^3` coordinates.
    pub fn extract_into(&mut self, field: &ScalarField, mesh: &mut IsoSurface) {
        mesh.clear();
        self.edge_vertices.clear();

        let cells = field.resolution() - 1;
        for z in 0..cells {
            for y in 0..cells {
                for x in 0..cells {
                    let mask = classify_cell(field, x, y, z, self.isolation);
                    if mask == 0 || mask == 0xFF {
                        continue;
                    }
                    let corners = CORNERS.map(|[dx, dy, dz]| {
                        let grid = [x + dx, y + dy, z + dz];
                        let index = field.index(grid[0], grid[1], grid[2]);
                        Corner {
                            grid,
                            index,
                            value: field.data()[index],
                        }
                    });
                    for tet in TETRAHEDRA {
                        self.polygonize_tetrahedron(field, tet.map(|c| corners[c]), mesh);
                    }
                }
            }
        }
    }

    fn polygonize_tetrahedron(&mut self, field: &ScalarField, tet: [Corner; 4], mesh: &mut IsoSurface) {
        let (inside, outside): (Vec<Corner>, Vec<Corner>) =
            tet.into_iter().partition(|c| c.value > self.isolation);

        match (inside.as_slice(), outside.as_slice()) {
            ([i], [o0, o1, o2]) => {
                let tri = [
                    self.edge_vertex(field, *i, *o0, mesh),
                    self.edge_vertex(field, *i, *o1, mesh),
                    self.edge_vertex(field, *i, *o2, mesh),
                ];
                emit_triangle(field, &inside, &outside, tri, mesh);
            }
            ([i0, i1, i2], [o]) => {
                let tri = [
                    self.edge_vertex(field, *i0, *o, mesh),
                    self.edge_vertex(field, *i1, *o, mesh),
                    self.edge_vertex(field, *i2, *o, mesh),
                ];
                emit_triangle(field, &inside, &outside, tri, mesh);
            }
            ([a, b], [c, d]) => {
                let ac = self.edge_vertex(field, *a, *c, mesh);
                let ad = self.edge_vertex(field, *a, *d, mesh);
                let bd = self.edge_vertex(field, *b, *d, mesh);
                let bc = self.edge_vertex(field, *b, *c, mesh);
                emit_triangle(field, &inside, &outside, [ac, ad, bd], mesh);
                emit_triangle(field, &inside, &outside, [ac, bd, bc], mesh);
            }
            _ => {}
        }
    }

    /// Index of the vertex where the surface crosses edge `a -> b`, creating
    /// it on first use.
    fn edge_vertex(&mut self, field: &ScalarField, a: Corner, b: Corner, mesh: &mut IsoSurface) -> u32 {
        let (lo, hi) = if a.index < b.index { (a, b) } else { (b, a) };
        if let Some(&vertex) = self.edge_vertices.get(&(lo.index, hi.index)) {
            return vertex;
        }

        let t = edge_crossing(lo.value, hi.value, self.isolation);
        let p_lo = grid_point(field, lo.grid);
        let p_hi = grid_point(field, hi.grid);
        let g_lo = field.gradient(lo.grid[0], lo.grid[1], lo.grid[2]);
        let g_hi = field.gradient(hi.grid[0], hi.grid[1], hi.grid[2]);

        let vertex = mesh.positions.len() as u32;
        mesh.positions.push(p_lo.lerp(p_hi, t));
        mesh.normals.push((-g_lo.lerp(g_hi, t)).normalize_or_zero());
        self.edge_vertices.insert((lo.index, hi.index), vertex);
        vertex
    }
}

fn grid_point(field: &ScalarField, grid: [usize; 3]) -> DVec3 {
    field.point(grid[0], grid[1], grid[2])
}

/// Pushes a triangle wound so its normal faces the outside corners of the
/// tetrahedron it was cut from.
fn emit_triangle(
    field: &ScalarField,
    inside: &[Corner],
    outside: &[Corner],
    [a, b, c]: [u32; 3],
    mesh: &mut IsoSurface,
) {
    let centroid = |corners: &[Corner]| {
        corners
            .iter()
            .map(|c| grid_point(field, c.grid))
            .sum::<DVec3>()
            / corners.len() as f64
    };
    let outward = centroid(outside) - centroid(inside);

    let pa = mesh.positions[a as usize];
    let pb = mesh.positions[b as usize];
    let pc = mesh.positions[c as usize];
    let normal = (pb - pa).cross(pc - pa);

    if normal.dot(outward) < 0.0 {
        mesh.indices.extend_from_slice(&[a, c, b]);
    } else {
        mesh.indices.extend_from_slice(&[a, b, c]);
    }
}
