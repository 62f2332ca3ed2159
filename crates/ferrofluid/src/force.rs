//! Attraction law pulling bodies towards the scene centre.
//!
//! The force depends only on a body's position and the current core scale.
//! It is accumulated onto the body's force buffer; integration happens in
//! the physics world.

use glam::DVec3;

use crate::config::ForceLaw;

/// Centre every body is attracted to.
pub const SCENE_CENTER: DVec3 = DVec3::ZERO;

/// Distance below which the core-coupled law repels, `None` for laws
/// without a threshold.
pub fn min_distance(law: &ForceLaw, core_scale: f64) -> Option<f64> {
    match *law {
        ForceLaw::ConstantPull { .. } => None,
        ForceLaw::CoreCoupled {
            min_distance_factor,
            ..
        } => Some(core_scale * min_distance_factor),
    }
}

/// Force on a body at `position` for the given core scale.
///
/// A body sitting exactly on the centre has no direction and receives a zero
/// force.
pub fn attraction_force(law: &ForceLaw, position: DVec3, core_scale: f64) -> DVec3 {
    let offset = position - SCENE_CENTER;
    let dir = offset.normalize_or_zero();
    match *law {
        ForceLaw::ConstantPull { pull } => dir * -pull,
        ForceLaw::CoreCoupled {
            base_attraction,
            core_influence,
            min_distance_factor,
            repulsion_factor,
        } => {
            let attraction = base_attraction + core_scale * core_influence;
            if offset.length() < core_scale * min_distance_factor {
                dir * attraction * repulsion_factor
            } else {
                dir * -attraction
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: ForceLaw = ForceLaw::CORE_COUPLED;
    const PULL: ForceLaw = ForceLaw::CONSTANT_PULL;

    #[test]
    fn body_at_centre_gets_zero_force() {
        for law in [CORE, PULL] {
            let f = attraction_force(&law, DVec3::ZERO, 1.0);
            assert_eq!(f, DVec3::ZERO);
            assert!(f.is_finite());
        }
    }

    #[test]
    fn core_coupled_pulls_outside_threshold() {
        // attraction = 1.5 + 1.0 * 2.0
        let f = attraction_force(&CORE, DVec3::new(3.0, 0.0, 0.0), 1.0);
        assert!((f - DVec3::new(-3.5, 0.0, 0.0)).length() < 1e-12, "{f}");
    }

    #[test]
    fn core_coupled_pushes_inside_threshold() {
        // body 0.5 from the centre with the core at its largest (1.4):
        // threshold 1.68, attraction 4.3, push 2.15
        let f = attraction_force(&CORE, DVec3::new(0.0, 0.5, 0.0), 1.4);
        assert!(f.y > 0.0, "{f} should point outwards");
        assert!((f.y - 2.15).abs() < 1e-12);
    }

    #[test]
    fn threshold_itself_pulls() {
        let d = min_distance(&CORE, 1.0).unwrap();
        let f = attraction_force(&CORE, DVec3::new(0.0, 0.0, d), 1.0);
        assert!(f.z < 0.0);
    }

    #[test]
    fn constant_pull_ignores_core_scale() {
        let p = DVec3::new(1.0, 2.0, 2.0);
        let a = attraction_force(&PULL, p, 0.2);
        let b = attraction_force(&PULL, p, 1.8);
        assert_eq!(a, b);
        assert!((a.length() - 0.5).abs() < 1e-12);
        assert!(min_distance(&PULL, 1.0).is_none());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn position() -> impl Strategy<Value = DVec3> {
            (-10.0_f64..10.0, -10.0_f64..10.0, -10.0_f64..10.0)
                .prop_map(|(x, y, z)| DVec3::new(x, y, z))
        }

        /// Unit vector, uniform over the sphere.
        fn direction() -> impl Strategy<Value = DVec3> {
            (0.0_f64..std::f64::consts::TAU, -1.0_f64..1.0).prop_map(|(theta, z)| {
                let r = (1.0 - z * z).sqrt();
                DVec3::new(r * theta.cos(), r * theta.sin(), z)
            })
        }

        proptest! {
            #[test]
            fn never_produces_nan(p in position(), scale in 0.0_f64..2.0) {
                for law in [CORE, PULL] {
                    prop_assert!(attraction_force(&law, p, scale).is_finite());
                }
            }

            #[test]
            fn pulls_inward_beyond_min_distance(p in position(), scale in 0.2_f64..1.4) {
                let threshold = min_distance(&CORE, scale).unwrap();
                prop_assume!(p.length() >= threshold);
                let f = attraction_force(&CORE, p, scale);
                prop_assert!(f.dot(p) <= 0.0, "force {f} at {p} points outwards");
            }

            #[test]
            fn pushes_outward_within_min_distance(
                dir in direction(),
                frac in 1e-6_f64..0.999,
                scale in 0.2_f64..1.4,
            ) {
                let threshold = min_distance(&CORE, scale).unwrap();
                let p = dir * threshold * frac;
                let f = attraction_force(&CORE, p, scale);
                prop_assert!(f.dot(p) > 0.0, "force {f} at {p} points inwards");
            }

            #[test]
            fn constant_pull_always_inward(p in position()) {
                prop_assert!(attraction_force(&PULL, p, 1.0).dot(p) <= 0.0);
            }
        }
    }
}
