//! Three-dimensional scalar density field sampled on a regular grid.
//!
//! A `ScalarField` stores `resolution^3` f64 samples covering the normalized
//! unit cube `[0, 1]^3`. Grid point `(x, y, z)` sits at
//! `(x, y, z) / (resolution - 1)`, so the first and last samples on each axis
//! lie exactly on the cube faces. Layout is x-fastest, then y, then z.
//!
//! Metaball influences are injected with [`ScalarField::add_ball`]. The outer
//! shell of samples is never written, which keeps every extracted surface
//! closed against the cube boundary.

use glam::DVec3;

use crate::error::FerroError;

/// Keeps the inverse-square falloff finite at the ball centre.
const FALLOFF_EPSILON: f64 = 1e-6;

/// A dense 3D scalar field over the normalized unit cube.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    resolution: usize,
    data: Vec<f64>,
}

impl ScalarField {
    /// Creates a zero-filled field with `resolution` samples per axis.
    ///
    /// Returns `FerroError::InvalidResolution` if `resolution < 3` (no
    /// interior sample would exist) or if `resolution^3` overflows `usize`.
    pub fn new(resolution: usize) -> Result<Self, FerroError> {
        let len = Self::checked_len(resolution)?;
        Ok(Self {
            resolution,
            data: vec![0.0; len],
        })
    }

    fn checked_len(resolution: usize) -> Result<usize, FerroError> {
        if resolution < 3 {
            return Err(FerroError::InvalidResolution(resolution));
        }
        resolution
            .checked_mul(resolution)
            .and_then(|sq| sq.checked_mul(resolution))
            .ok_or(FerroError::InvalidResolution(resolution))
    }

    /// Samples per axis.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Distance between neighbouring samples in normalized units.
    pub fn spacing(&self) -> f64 {
        1.0 / (self.resolution - 1) as f64
    }

    /// Read-only access to the raw samples.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Flat index of grid point `(x, y, z)`. Callers guarantee bounds.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.resolution + y) * self.resolution + x
    }

    /// Sample at `(x, y, z)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        let r = self.resolution;
        if x >= r || y >= r || z >= r {
            return None;
        }
        Some(self.data[self.index(x, y, z)])
    }

    /// Writes the sample at `(x, y, z)`. Out-of-grid writes are ignored.
    #[cfg(test)]
    pub(crate) fn set(&mut self, x: usize, y: usize, z: usize, value: f64) {
        let r = self.resolution;
        if x < r && y < r && z < r {
            let idx = self.index(x, y, z);
            self.data[idx] = value;
        }
    }

    /// Zeroes every sample.
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Normalized coordinate of grid point `(x, y, z)`.
    pub fn point(&self, x: usize, y: usize, z: usize) -> DVec3 {
        DVec3::new(x as f64, y as f64, z as f64) * self.spacing()
    }

    /// Largest sample in the field.
    pub fn max_value(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Adds a metaball centred at the normalized coordinate `center`.
    ///
    /// Each interior sample within reach receives
    /// `strength / (eps + d^2) - subtract` when that value is positive, where
    /// `d` is the normalized distance to the centre. Influences sum. The reach
    /// is the radius at which the falloff crosses zero,
    /// `sqrt(|strength| / subtract)`. A negative `strength` carves the field.
    ///
    /// Returns the number of samples that received a contribution.
    pub fn add_ball(&mut self, center: DVec3, strength: f64, subtract: f64) -> usize {
        if strength == 0.0 || subtract <= 0.0 {
            return 0;
        }
        let sign = strength.signum();
        let magnitude = strength.abs();
        let radius = (magnitude / subtract).sqrt();
        let last = (self.resolution - 1) as f64;
        let inner_max = (self.resolution - 2) as i64;

        let span = |c: f64| -> (i64, i64) {
            let lo = ((c - radius) * last).floor() as i64;
            let hi = ((c + radius) * last).ceil() as i64;
            (lo.max(1), hi.min(inner_max))
        };
        let (x0, x1) = span(center.x);
        let (y0, y1) = span(center.y);
        let (z0, z1) = span(center.z);

        let spacing = self.spacing();
        let mut touched = 0;
        for z in z0..=z1 {
            let fz = z as f64 * spacing - center.z;
            let fz2 = fz * fz;
            for y in y0..=y1 {
                let fy = y as f64 * spacing - center.y;
                let fy2 = fy * fy;
                for x in x0..=x1 {
                    let fx = x as f64 * spacing - center.x;
                    let value = magnitude / (FALLOFF_EPSILON + fx * fx + fy2 + fz2) - subtract;
                    if value > 0.0 {
                        let idx = self.index(x as usize, y as usize, z as usize);
                        self.data[idx] += value * sign;
                        touched += 1;
                    }
                }
            }
        }
        touched
    }

    /// Central-difference gradient at grid point `(x, y, z)` in per-sample
    /// units. One-sided differences are used on the grid faces.
    pub fn gradient(&self, x: usize, y: usize, z: usize) -> DVec3 {
        let r = self.resolution;
        let axis = |i: usize| -> (usize, usize) {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(r - 1);
            (lo, hi)
        };
        let (xl, xh) = axis(x);
        let (yl, yh) = axis(y);
        let (zl, zh) = axis(z);
        let at = |x: usize, y: usize, z: usize| self.data[self.index(x, y, z)];
        DVec3::new(
            (at(xh, y, z) - at(xl, y, z)) / (xh - xl) as f64,
            (at(x, yh, z) - at(x, yl, z)) / (yh - yl) as f64,
            (at(x, y, zh) - at(x, y, zl)) / (zh - zl) as f64,
        )
    }

    /// Iterates over all samples yielding `(x, y, z, value)`, x fastest.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, f64)> + '_ {
        let r = self.resolution;
        self.data.iter().enumerate().map(move |(i, &v)| {
            let x = i % r;
            let y = (i / r) % r;
            let z = i / (r * r);
            (x, y, z, v)
        })
    }
}
