//! Rigid-body physics behind the [`PhysicsWorld`] seam.
//!
//! The simulation only needs a narrow slice of a physics engine: spherical
//! colliders, force accumulation, kinematic bodies driven by position, contact
//! friction and a fixed-step integrator. [`RigidWorld`] provides exactly that; other
//! backends can be plugged in by implementing the trait.

use std::f64::consts::PI;

use ferrofluid_core::FerroError;
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Opaque reference to a body owned by a physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(usize);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Opaque reference to a collider owned by a physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(usize);

impl ColliderHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Moved by forces and contacts.
    Dynamic,
    /// Moved only by [`PhysicsWorld::set_position`]; never pushed by contacts.
    Kinematic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ColliderShape {
    Ball { radius: f64 },
}

impl ColliderShape {
    pub fn volume(&self) -> f64 {
        match *self {
            ColliderShape::Ball { radius } => 4.0 / 3.0 * PI * radius.powi(3),
        }
    }
}

/// World-space pose of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    pub orientation: DQuat,
}

/// Operations the frame pipeline needs from a physics engine.
pub trait PhysicsWorld {
    fn create_body(&mut self, kind: BodyKind, position: DVec3) -> BodyHandle;

    /// Sets velocity damping coefficients of `body`.
    fn set_damping(&mut self, body: BodyHandle, linear: f64, angular: f64) -> Result<(), FerroError>;

    /// Attaches a collider of the given density to `body`. Dynamic bodies
    /// derive their mass from their colliders.
    fn create_collider(
        &mut self,
        shape: ColliderShape,
        density: f64,
        body: BodyHandle,
    ) -> Result<ColliderHandle, FerroError>;

    fn set_collider_radius(&mut self, collider: ColliderHandle, radius: f64) -> Result<(), FerroError>;

    /// Accumulates `force` on `body` until the next [`Self::step`].
    fn apply_force(&mut self, body: BodyHandle, force: DVec3) -> Result<(), FerroError>;

    /// Discards the forces accumulated on `body`.
    fn reset_forces(&mut self, body: BodyHandle) -> Result<(), FerroError>;

    /// Moves a kinematic body. Fails with [`FerroError::NotKinematic`] for
    /// dynamic bodies.
    fn set_position(&mut self, body: BodyHandle, position: DVec3) -> Result<(), FerroError>;

    fn transform(&self, body: BodyHandle) -> Result<Transform, FerroError>;

    /// Advances by one fixed timestep: integrates, resolves contacts, then
    /// clears every accumulated force.
    fn step(&mut self);

    fn body_count(&self) -> usize;
}

/// Tuning of [`RigidWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Seconds per step.
    pub timestep: f64,
    pub gravity: DVec3,
    /// Contact passes per step.
    pub solver_iterations: usize,
    /// Penetration depth tolerated without correction.
    pub contact_slop: f64,
    /// Fraction of the remaining penetration corrected per pass.
    pub correction_percent: f64,
    /// Coulomb coefficient bounding the tangential contact impulse.
    pub friction: f64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            gravity: DVec3::ZERO,
            solver_iterations: 4,
            contact_slop: 0.001,
            correction_percent: 0.8,
            friction: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    kind: BodyKind,
    position: DVec3,
    orientation: DQuat,
    linvel: DVec3,
    angvel: DVec3,
    force: DVec3,
    inv_mass: f64,
    inv_inertia: f64,
    linear_damping: f64,
    angular_damping: f64,
}

impl Body {
    fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}

#[derive(Debug, Clone, Copy)]
struct Collider {
    body: usize,
    radius: f64,
    density: f64,
}

/// Small sphere-only rigid-body world with a fixed timestep.
///
/// Integration is semi-implicit Euler with damping applied as
/// `v *= 1 / (1 + dt * damping)`. Overlapping colliders are pushed apart by
/// inverse-mass weighted positional correction and lose their approaching
/// normal velocity. A friction impulse opposes the sliding velocity at the
/// contact point and spins both bodies. Kinematic bodies have zero inverse
/// mass and inertia.
#[derive(Debug, Clone)]
pub struct RigidWorld {
    settings: WorldSettings,
    bodies: Vec<Body>,
    colliders: Vec<Collider>,
}

impl RigidWorld {
    pub fn new(settings: WorldSettings) -> Result<Self, FerroError> {
        if !(settings.timestep.is_finite() && settings.timestep > 0.0) {
            return Err(FerroError::PhysicsInit(format!(
                "timestep must be positive and finite, got {}",
                settings.timestep
            )));
        }
        if !settings.gravity.is_finite() {
            return Err(FerroError::PhysicsInit("gravity must be finite".into()));
        }
        if settings.solver_iterations == 0 {
            return Err(FerroError::PhysicsInit("at least one solver iteration is required".into()));
        }
        if !(settings.correction_percent > 0.0 && settings.correction_percent <= 1.0) {
            return Err(FerroError::PhysicsInit(format!(
                "correction percent must lie in (0, 1], got {}",
                settings.correction_percent
            )));
        }
        if !(settings.friction.is_finite() && settings.friction >= 0.0) {
            return Err(FerroError::PhysicsInit(format!(
                "friction must be non-negative, got {}",
                settings.friction
            )));
        }
        Ok(Self {
            settings,
            bodies: Vec::new(),
            colliders: Vec::new(),
        })
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    #[cfg(test)]
    fn velocity(&self, body: BodyHandle) -> Result<DVec3, FerroError> {
        Ok(self.body(body)?.linvel)
    }

    #[cfg(test)]
    fn angular_velocity(&self, body: BodyHandle) -> Result<DVec3, FerroError> {
        Ok(self.body(body)?.angvel)
    }

    fn body(&self, handle: BodyHandle) -> Result<&Body, FerroError> {
        self.bodies
            .get(handle.0)
            .ok_or(FerroError::UnknownBody(handle.0))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body, FerroError> {
        self.bodies
            .get_mut(handle.0)
            .ok_or(FerroError::UnknownBody(handle.0))
    }

    /// Recomputes mass and the solid-sphere moment of inertia of `body`
    /// from its colliders.
    fn update_mass(&mut self, body: usize) {
        let (mass, inertia) = self
            .colliders
            .iter()
            .filter(|c| c.body == body)
            .fold((0.0_f64, 0.0_f64), |(mass, inertia), c| {
                let m = c.density * ColliderShape::Ball { radius: c.radius }.volume();
                (mass + m, inertia + 0.4 * m * c.radius * c.radius)
            });
        let b = &mut self.bodies[body];
        (b.inv_mass, b.inv_inertia) = match b.kind {
            BodyKind::Kinematic => (0.0, 0.0),
            BodyKind::Dynamic if mass > 0.0 && inertia > 0.0 => (1.0 / mass, 1.0 / inertia),
            BodyKind::Dynamic => (1.0, 1.0),
        };
    }

    fn integrate(&mut self) {
        let dt = self.settings.timestep;
        let gravity = self.settings.gravity;
        for body in self.bodies.iter_mut().filter(|b| b.is_dynamic()) {
            body.linvel += (gravity + body.force * body.inv_mass) * dt;
            body.linvel *= 1.0 / (1.0 + dt * body.linear_damping);
            body.angvel *= 1.0 / (1.0 + dt * body.angular_damping);
            body.position += body.linvel * dt;
            if body.angvel != DVec3::ZERO {
                body.orientation = (DQuat::from_scaled_axis(body.angvel * dt) * body.orientation).normalize();
            }
        }
    }

    fn resolve_contacts(&mut self) {
        let slop = self.settings.contact_slop;
        let percent = self.settings.correction_percent;
        let friction = self.settings.friction;
        let count = self.colliders.len();

        for _ in 0..self.settings.solver_iterations {
            for i in 0..count {
                for j in (i + 1)..count {
                    let ca = self.colliders[i];
                    let cb = self.colliders[j];
                    if ca.body == cb.body {
                        continue;
                    }
                    let mut a = self.bodies[ca.body];
                    let mut b = self.bodies[cb.body];
                    let inv_mass_sum = a.inv_mass + b.inv_mass;
                    if inv_mass_sum <= 0.0 {
                        continue;
                    }

                    let contact_dist = ca.radius + cb.radius;
                    let diff = b.position - a.position;
                    let dist_sq = diff.length_squared();
                    // NaN positions never count as touching
                    if !(dist_sq < contact_dist * contact_dist) {
                        continue;
                    }
                    let (normal, dist) = if dist_sq > 1.0e-12 {
                        let dist = dist_sq.sqrt();
                        (diff / dist, dist)
                    } else {
                        (DVec3::Y, 0.0)
                    };

                    let penetration = contact_dist - dist;
                    let correction_mag = (penetration - slop).max(0.0) * percent / inv_mass_sum;
                    if correction_mag > 0.0 {
                        let correction = normal * correction_mag;
                        a.position -= correction * a.inv_mass;
                        b.position += correction * b.inv_mass;
                    }

                    let approach = (b.linvel - a.linvel).dot(normal);
                    if approach < 0.0 {
                        let impulse = -approach / inv_mass_sum;
                        a.linvel -= normal * impulse * a.inv_mass;
                        b.linvel += normal * impulse * b.inv_mass;
                        apply_friction(&mut a, &mut b, normal, (ca.radius, cb.radius), friction * impulse);
                    }

                    self.bodies[ca.body] = a;
                    self.bodies[cb.body] = b;
                }
            }
        }
    }
}

/// Applies a tangential impulse of at most `max_impulse` that opposes the
/// sliding velocity at the contact point. `normal` points from `a` to `b`.
fn apply_friction(a: &mut Body, b: &mut Body, normal: DVec3, radii: (f64, f64), max_impulse: f64) {
    let ra = normal * radii.0;
    let rb = -normal * radii.1;
    let relative = (b.linvel + b.angvel.cross(rb)) - (a.linvel + a.angvel.cross(ra));
    let sliding = relative - normal * relative.dot(normal);
    let speed = sliding.length();
    if speed <= 1.0e-12 {
        return;
    }
    let effective = a.inv_mass + b.inv_mass + ra.length_squared() * a.inv_inertia + rb.length_squared() * b.inv_inertia;
    if effective <= 0.0 {
        return;
    }
    let magnitude = (speed / effective).min(max_impulse);
    let impulse = sliding * (-magnitude / speed);
    b.linvel += impulse * b.inv_mass;
    b.angvel += rb.cross(impulse) * b.inv_inertia;
    a.linvel -= impulse * a.inv_mass;
    a.angvel -= ra.cross(impulse) * a.inv_inertia;
}

impl PhysicsWorld for RigidWorld {
    fn create_body(&mut self, kind: BodyKind, position: DVec3) -> BodyHandle {
        self.bodies.push(Body {
            kind,
            position,
            orientation: DQuat::IDENTITY,
            linvel: DVec3::ZERO,
            angvel: DVec3::ZERO,
            force: DVec3::ZERO,
            inv_mass: match kind {
                BodyKind::Dynamic => 1.0,
                BodyKind::Kinematic => 0.0,
            },
            inv_inertia: match kind {
                BodyKind::Dynamic => 1.0,
                BodyKind::Kinematic => 0.0,
            },
            linear_damping: 0.0,
            angular_damping: 0.0,
        });
        BodyHandle(self.bodies.len() - 1)
    }

    fn set_damping(&mut self, body: BodyHandle, linear: f64, angular: f64) -> Result<(), FerroError> {
        let b = self.body_mut(body)?;
        b.linear_damping = linear.max(0.0);
        b.angular_damping = angular.max(0.0);
        Ok(())
    }

    fn create_collider(
        &mut self,
        shape: ColliderShape,
        density: f64,
        body: BodyHandle,
    ) -> Result<ColliderHandle, FerroError> {
        self.body(body)?;
        let ColliderShape::Ball { radius } = shape;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(FerroError::PhysicsInit(format!("collider radius must be positive, got {radius}")));
        }
        if !(density.is_finite() && density >= 0.0) {
            return Err(FerroError::PhysicsInit(format!("collider density must be non-negative, got {density}")));
        }
        self.colliders.push(Collider {
            body: body.0,
            radius,
            density,
        });
        self.update_mass(body.0);
        Ok(ColliderHandle(self.colliders.len() - 1))
    }

    fn set_collider_radius(&mut self, collider: ColliderHandle, radius: f64) -> Result<(), FerroError> {
        let c = self
            .colliders
            .get_mut(collider.0)
            .ok_or(FerroError::UnknownCollider(collider.0))?;
        c.radius = radius.max(0.0);
        let body = c.body;
        self.update_mass(body);
        Ok(())
    }

    fn apply_force(&mut self, body: BodyHandle, force: DVec3) -> Result<(), FerroError> {
        self.body_mut(body)?.force += force;
        Ok(())
    }

    fn reset_forces(&mut self, body: BodyHandle) -> Result<(), FerroError> {
        self.body_mut(body)?.force = DVec3::ZERO;
        Ok(())
    }

    fn set_position(&mut self, body: BodyHandle, position: DVec3) -> Result<(), FerroError> {
        let b = self.body_mut(body)?;
        if b.is_dynamic() {
            return Err(FerroError::NotKinematic(body.0));
        }
        b.position = position;
        Ok(())
    }

    fn transform(&self, body: BodyHandle) -> Result<Transform, FerroError> {
        let b = self.body(body)?;
        Ok(Transform {
            position: b.position,
            orientation: b.orientation,
        })
    }

    fn step(&mut self) {
        self.integrate();
        self.resolve_contacts();
        for body in &mut self.bodies {
            body.force = DVec3::ZERO;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
