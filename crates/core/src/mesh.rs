//! Indexed triangle mesh produced by iso-surface extraction.

use std::collections::HashMap;

use glam::DVec3;

/// Triangle mesh handed to the renderer once per frame.
///
/// Vertices shared between triangles are stored once; `indices` holds three
/// entries per triangle, wound so the face normal points out of the surface
/// (towards decreasing field values).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsoSurface {
    pub positions: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    pub indices: Vec<u32>,
}

impl IsoSurface {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Drops all geometry but keeps allocations for the next frame.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
    }

    /// Maps positions from normalized field coordinates to world space,
    /// `(p - 0.5) * world_scale`. Normals are unaffected by the uniform scale.
    pub fn to_world(&mut self, world_scale: f64) {
        self.positions
            .iter_mut()
            .for_each(|p| *p = (*p - DVec3::splat(0.5)) * world_scale);
    }

    /// Signed enclosed volume; positive when triangles wind outwards.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| {
                let (a, b, c) = (
                    self.positions[a as usize],
                    self.positions[b as usize],
                    self.positions[c as usize],
                );
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }

    /// Iterates triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Axis-aligned bounds `(min, max)` of the vertices, `None` when empty.
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Whether every undirected edge is shared by exactly two triangles.
    ///
    /// True for a closed surface without boundary. An empty mesh is not
    /// considered closed.
    pub fn is_closed(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for [a, b, c] in self.triangles() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edges.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        edges.values().all(|&n| n == 2)
    }

    /// Number of connected pieces, counting vertices linked by triangles.
    pub fn component_count(&self) -> usize {
        let n = self.positions.len();
        let mut parent: Vec<usize> = (0..n).collect();
        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }
        for [a, b, c] in self.triangles() {
            for (u, v) in [(a, b), (b, c)] {
                let ru = find(&mut parent, u as usize);
                let rv = find(&mut parent, v as usize);
                if ru != rv {
                    parent[ru] = rv;
                }
            }
        }
        let mut used = vec![false; n];
        for &i in &self.indices {
            used[i as usize] = true;
        }
        (0..n)
            .filter(|&i| used[i] && find(&mut parent, i) == i)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> IsoSurface {
        IsoSurface {
            positions: vec![
                DVec3::ZERO,
                DVec3::X,
                DVec3::Y,
                DVec3::Z,
            ],
            normals: vec![DVec3::ZERO; 4],
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        }
    }

    #[test]
    fn empty_mesh_has_no_triangles() {
        let mesh = IsoSurface::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.bounds().is_none());
        assert!(!mesh.is_closed());
        assert_eq!(mesh.component_count(), 0);
    }

    #[test]
    fn tetrahedron_is_closed_single_component() {
        let mesh = tetrahedron();
        assert_eq!(mesh.triangle_count(), 4);
        assert!(mesh.is_closed());
        assert_eq!(mesh.component_count(), 1);
    }

    #[test]
    fn open_mesh_is_not_closed() {
        let mut mesh = tetrahedron();
        mesh.indices.truncate(9);
        assert!(!mesh.is_closed());
    }

    #[test]
    fn two_disjoint_tetrahedra_are_two_components() {
        let mut mesh = tetrahedron();
        let offset = mesh.positions.len() as u32;
        let shifted: Vec<DVec3> = mesh.positions.iter().map(|p| *p + DVec3::splat(5.0)).collect();
        mesh.positions.extend(shifted);
        mesh.normals.extend(vec![DVec3::ZERO; 4]);
        let extra: Vec<u32> = mesh.indices.iter().map(|i| i + offset).collect();
        mesh.indices.extend(extra);
        assert!(mesh.is_closed());
        assert_eq!(mesh.component_count(), 2);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let (lo, hi) = tetrahedron().bounds().unwrap();
        assert_eq!(lo, DVec3::ZERO);
        assert_eq!(hi, DVec3::ONE);
    }

    #[test]
    fn outward_tetrahedron_has_positive_volume() {
        let volume = tetrahedron().signed_volume();
        assert!((volume - 1.0 / 6.0).abs() < 1e-12, "volume {volume}");
    }

    #[test]
    fn to_world_recentres_and_scales() {
        let mut mesh = tetrahedron();
        mesh.to_world(4.0);
        assert_eq!(mesh.positions[0], DVec3::splat(-2.0));
        assert_eq!(mesh.positions[1], DVec3::new(2.0, -2.0, -2.0));
    }

    #[test]
    fn clear_empties_geometry() {
        let mut mesh = tetrahedron();
        mesh.clear();
        assert!(mesh.is_empty());
        assert!(mesh.positions.is_empty());
        assert!(mesh.normals.is_empty());
    }
}
