//! Populates a physics world with the core, the probe and the bodies.

use ferrofluid_core::{FerroError, Xorshift64};
use glam::DVec3;
use tracing::debug;

use crate::config::FerrofluidConfig;
use crate::physics::{BodyHandle, BodyKind, ColliderHandle, ColliderShape, PhysicsWorld};

/// Core collider radius per unit of core size before the first tick
/// resizes it.
const INITIAL_CORE_RADIUS: f64 = 1.5;

/// Handles of everything the frame pipeline drives.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub bodies: Vec<BodyHandle>,
    pub core: BodyHandle,
    pub core_collider: ColliderHandle,
    pub probe: BodyHandle,
}

/// Creates the kinematic core and probe at the origin, then `population`
/// dynamic bodies at seeded random positions inside the spawn cube.
pub fn populate<W: PhysicsWorld>(world: &mut W, config: &FerrofluidConfig) -> Result<Scene, FerroError> {
    let core = world.create_body(BodyKind::Kinematic, DVec3::ZERO);
    let core_collider = world.create_collider(
        ColliderShape::Ball {
            radius: config.oscillator.core_size * INITIAL_CORE_RADIUS,
        },
        1.0,
        core,
    )?;

    let probe = world.create_body(BodyKind::Kinematic, DVec3::ZERO);
    world.create_collider(
        ColliderShape::Ball {
            radius: config.probe_radius,
        },
        1.0,
        probe,
    )?;

    let mut rng = Xorshift64::new(config.seed);
    let mut bodies = Vec::with_capacity(config.population);
    for _ in 0..config.population {
        let position = rng.next_in_cube(config.spawn_range);
        let body = world.create_body(BodyKind::Dynamic, position);
        world.set_damping(body, config.linear_damping, config.angular_damping)?;
        world.create_collider(
            ColliderShape::Ball {
                radius: config.body_radius,
            },
            config.body_density,
            body,
        )?;
        bodies.push(body);
    }
    debug!(bodies = bodies.len(), seed = config.seed, "scene populated");

    Ok(Scene {
        bodies,
        core,
        core_collider,
        probe,
    })
}
