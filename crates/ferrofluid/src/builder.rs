//! Rebuilds the scalar field from the current world snapshot.
//!
//! World positions map into the unit cube with `n = p / world_scale + 0.5`.
//! A contributor whose normalized position leaves the open interval
//! `(margin, 1 - margin)` on any axis is skipped rather than clamped, so
//! balls never pile up against the grid faces. Influences sum.

use ferrofluid_core::{FerroError, ScalarField};
use glam::DVec3;
use tracing::trace;

use crate::config::FerrofluidConfig;

/// Grid centre in normalized coordinates, where the core ball sits.
pub const GRID_CENTER: DVec3 = DVec3::splat(0.5);

/// Maps a world position into the normalized unit cube.
pub fn normalize(position: DVec3, world_scale: f64) -> DVec3 {
    position / world_scale + GRID_CENTER
}

/// Inverse of [`normalize`].
pub fn denormalize(normalized: DVec3, world_scale: f64) -> DVec3 {
    (normalized - GRID_CENTER) * world_scale
}

/// True when every axis of `n` lies strictly inside `(margin, 1 - margin)`.
pub fn within_margin(n: DVec3, margin: f64) -> bool {
    n.to_array().iter().all(|&c| c > margin && c < 1.0 - margin)
}

/// Everything the builder reads from one world snapshot.
#[derive(Debug, Clone, Copy)]
pub struct FieldSources<'a> {
    pub core_scale: f64,
    /// Body positions in world space.
    pub bodies: &'a [DVec3],
    /// Probe position in world space when it contributes this frame.
    pub probe: Option<DVec3>,
}

/// Contributor counts of one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub injected: usize,
    pub excluded: usize,
}

/// Writes the metaball field for a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarFieldBuilder {
    resolution: usize,
    world_scale: f64,
    margin: f64,
    subtract: f64,
    core_strength: Option<f64>,
    body_strength: f64,
    probe_strength: f64,
}

impl ScalarFieldBuilder {
    pub fn from_config(config: &FerrofluidConfig) -> Self {
        Self {
            resolution: config.resolution,
            world_scale: config.world_scale,
            margin: config.margin,
            subtract: config.subtract,
            core_strength: config.core_strength,
            body_strength: config.body_strength,
            probe_strength: config.probe_strength,
        }
    }

    /// A zeroed field of the configured resolution.
    pub fn new_field(&self) -> Result<ScalarField, FerroError> {
        ScalarField::new(self.resolution)
    }

    /// Resets `field` and injects the core, the bodies and the probe.
    ///
    /// Inputs are checked before the field is touched: a non-finite
    /// contributor or a field of the wrong resolution leaves `field` as it
    /// was.
    pub fn build(&self, field: &mut ScalarField, sources: &FieldSources<'_>) -> Result<BuildStats, FerroError> {
        if field.resolution() != self.resolution {
            return Err(FerroError::DimensionMismatch {
                lhs: field.resolution(),
                rhs: self.resolution,
            });
        }
        if !sources.core_scale.is_finite() {
            return Err(non_finite("core".to_string()));
        }
        if let Some(i) = sources.bodies.iter().position(|p| !p.is_finite()) {
            return Err(non_finite(format!("body {i}")));
        }
        if sources.probe.is_some_and(|p| !p.is_finite()) {
            return Err(non_finite("probe".to_string()));
        }

        field.reset();
        let mut stats = BuildStats::default();

        if let Some(strength) = self.core_strength {
            field.add_ball(GRID_CENTER, strength * sources.core_scale, self.subtract);
            stats.injected += 1;
        }

        for &position in sources.bodies {
            self.inject(field, position, self.body_strength, &mut stats);
        }
        if let Some(position) = sources.probe {
            self.inject(field, position, self.probe_strength, &mut stats);
        }

        trace!(injected = stats.injected, excluded = stats.excluded, "field built");
        Ok(stats)
    }

    fn inject(&self, field: &mut ScalarField, position: DVec3, strength: f64, stats: &mut BuildStats) {
        let n = normalize(position, self.world_scale);
        if within_margin(n, self.margin) {
            field.add_ball(n, strength, self.subtract);
            stats.injected += 1;
        } else {
            stats.excluded += 1;
        }
    }
}

fn non_finite(source_name: String) -> FerroError {
    FerroError::NonFiniteContribution { source_name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use serde_json::json;

    fn small(preset: Preset) -> (ScalarFieldBuilder, ScalarField) {
        let config = FerrofluidConfig::from_json(preset, &json!({"resolution": 24})).unwrap();
        let builder = ScalarFieldBuilder::from_config(&config);
        let field = builder.new_field().unwrap();
        (builder, field)
    }

    fn sources(bodies: &[DVec3]) -> FieldSources<'_> {
        FieldSources {
            core_scale: 1.0,
            bodies,
            probe: None,
        }
    }

    #[test]
    fn normalize_maps_world_cube_to_unit_cube() {
        assert_eq!(normalize(DVec3::ZERO, 5.0), GRID_CENTER);
        assert_eq!(normalize(DVec3::splat(2.5), 5.0), DVec3::ONE);
        assert_eq!(normalize(DVec3::splat(-2.5), 5.0), DVec3::ZERO);
        let p = DVec3::new(1.0, -2.0, 0.25);
        assert!((denormalize(normalize(p, 10.0), 10.0) - p).length() < 1e-12);
    }

    #[test]
    fn margin_is_an_open_interval() {
        assert!(within_margin(DVec3::splat(0.5), 0.05));
        assert!(!within_margin(DVec3::new(0.05, 0.5, 0.5), 0.05));
        assert!(!within_margin(DVec3::new(0.5, 0.95, 0.5), 0.05));
        assert!(!within_margin(DVec3::new(0.5, 0.5, 1.2), 0.05));
        assert!(within_margin(DVec3::new(0.051, 0.5, 0.949), 0.05));
    }

    #[test]
    fn core_only_field_peaks_at_centre() {
        let (builder, mut field) = small(Preset::Core);
        let stats = builder.build(&mut field, &sources(&[])).unwrap();
        assert_eq!(stats, BuildStats { injected: 1, excluded: 0 });
        let mid = field.resolution() / 2;
        let centre = field.get(mid, mid, mid).unwrap();
        assert!(centre > 90.0);
        assert!(field.max_value() >= centre);
        assert_eq!(field.get(1, 1, 1), Some(0.0));
    }

    #[test]
    fn orbit_preset_leaves_core_out() {
        let (builder, mut field) = small(Preset::Orbit);
        let stats = builder.build(&mut field, &sources(&[])).unwrap();
        assert_eq!(stats.injected, 0);
        assert!(field.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn body_near_face_is_excluded() {
        let (builder, mut field) = small(Preset::Core);
        let mut reference = field.clone();
        builder.build(&mut reference, &sources(&[])).unwrap();

        // normalized (0.5, 0.5, 0.02) at world scale 5
        let body = denormalize(DVec3::new(0.5, 0.5, 0.02), 5.0);
        let stats = builder.build(&mut field, &sources(&[body])).unwrap();
        assert_eq!(stats, BuildStats { injected: 1, excluded: 1 });
        assert_eq!(field.data(), reference.data());
    }

    #[test]
    fn coincident_bodies_add_up() {
        let (builder, mut one) = small(Preset::Orbit);
        let mut two = one.clone();
        let p = DVec3::new(0.5, 0.0, -0.5);
        builder.build(&mut one, &sources(&[p])).unwrap();
        builder.build(&mut two, &sources(&[p, p])).unwrap();
        for (a, b) in one.data().iter().zip(two.data()) {
            assert_eq!(*b, a * 2.0);
        }
        assert!(one.max_value() > 0.0);
    }

    #[test]
    fn probe_contributes_like_a_body() {
        let (builder, mut field) = small(Preset::Orbit);
        let stats = builder
            .build(
                &mut field,
                &FieldSources {
                    core_scale: 1.0,
                    bodies: &[],
                    probe: Some(DVec3::new(1.0, 1.0, 0.0)),
                },
            )
            .unwrap();
        assert_eq!(stats.injected, 1);
        assert!(field.max_value() > 0.0);
    }

    #[test]
    fn core_strength_tracks_scale() {
        let (builder, mut small_core) = small(Preset::Core);
        let mut big_core = small_core.clone();
        let mut s = sources(&[]);
        s.core_scale = 0.2;
        builder.build(&mut small_core, &s).unwrap();
        s.core_scale = 1.4;
        builder.build(&mut big_core, &s).unwrap();
        let covered = |f: &ScalarField| f.data().iter().filter(|&&v| v > 90.0).count();
        assert!(covered(&big_core) > covered(&small_core));
    }

    #[test]
    fn non_finite_input_leaves_field_untouched() {
        let (builder, mut field) = small(Preset::Core);
        builder.build(&mut field, &sources(&[])).unwrap();
        let before = field.clone();

        let bad = [DVec3::ZERO, DVec3::new(f64::NAN, 0.0, 0.0)];
        let err = builder.build(&mut field, &sources(&bad)).unwrap_err();
        assert!(matches!(err, FerroError::NonFiniteContribution { ref source_name } if source_name == "body 1"));
        assert_eq!(field, before);

        let mut s = sources(&[]);
        s.probe = Some(DVec3::splat(f64::INFINITY));
        assert!(builder.build(&mut field, &s).is_err());
        s.probe = None;
        s.core_scale = f64::NAN;
        assert!(builder.build(&mut field, &s).is_err());
        assert_eq!(field, before);
    }

    #[test]
    fn wrong_resolution_is_rejected() {
        let (builder, _) = small(Preset::Core);
        let mut field = ScalarField::new(8).unwrap();
        assert!(matches!(
            builder.build(&mut field, &sources(&[])),
            Err(FerroError::DimensionMismatch { lhs: 8, rhs: 24 })
        ));
    }

    #[test]
    fn identical_snapshots_build_identical_grids() {
        let (builder, mut a) = small(Preset::Core);
        let mut b = a.clone();
        let bodies = [
            DVec3::new(0.3, -0.7, 1.1),
            DVec3::new(-1.2, 0.4, 0.0),
            DVec3::new(0.9, 0.9, -0.9),
        ];
        let s = FieldSources {
            core_scale: 1.13,
            bodies: &bodies,
            probe: Some(DVec3::new(0.0, 0.5, 1.0)),
        };
        builder.build(&mut a, &s).unwrap();
        builder.build(&mut b, &s).unwrap();
        let bits = |f: &ScalarField| f.data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn out_of_margin_positions_never_change_the_field(
                axis in 0_usize..3,
                low: bool,
                depth in 0.0_f64..0.05,
            ) {
                let (builder, mut with_body) = small(Preset::Core);
                let mut without = with_body.clone();
                let mut n = [0.5; 3];
                n[axis] = if low { depth } else { 1.0 - depth };
                let body = denormalize(DVec3::from_array(n), 5.0);
                prop_assume!(!within_margin(normalize(body, 5.0), 0.05));

                builder.build(&mut without, &sources(&[])).unwrap();
                let stats = builder.build(&mut with_body, &sources(&[body])).unwrap();
                prop_assert_eq!(stats.excluded, 1);
                prop_assert_eq!(with_body.data(), without.data());
            }
        }
    }
}
