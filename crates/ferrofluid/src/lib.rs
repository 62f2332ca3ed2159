#![deny(unsafe_code)]
//! Ferrofluid simulation.
//!
//! A population of rigid bodies is pulled towards a pulsing core. Every frame
//! the bodies, the core and an optional pointer probe are fused into a
//! metaball field over the unit cube, and the iso-surface of that field is
//! extracted as the fluid's mesh.
//!
//! One [`Engine::tick`] runs the whole pipeline in order:
//! 1. update the core oscillator from the frame time
//! 2. record the pointer sample
//! 3. pin the core at the origin, resize its collider, move the probe
//! 4. reset and accumulate the attraction force on every body
//! 5. step the physics world
//! 6. read back body transforms
//! 7. rebuild the scalar field
//! 8. extract the surface
//!
//! A frame whose field cannot be built is skipped and the previous surface
//! stays current.

pub mod builder;
pub mod config;
pub mod force;
pub mod oscillator;
pub mod physics;
pub mod probe;
pub mod scene;

use ferrofluid_core::{Engine, FerroError, FrameContext, IsoSurface, IsoSurfaceExtractor, ScalarField};
use glam::DVec3;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::builder::{FieldSources, ScalarFieldBuilder};
use crate::config::FerrofluidConfig;
use crate::force::attraction_force;
use crate::oscillator::CoreOscillator;
use crate::physics::{PhysicsWorld, RigidWorld, Transform, WorldSettings};
use crate::probe::PointerProbe;
use crate::scene::{populate, Scene};

pub use crate::config::{ForceLaw, Preset, ProbePolicy};

/// Counters describing the session so far and the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frames: u64,
    pub skipped_frames: u64,
    /// Contributors injected into the last built field.
    pub injected: usize,
    /// Contributors dropped by the margin test in the last built field.
    pub excluded: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// The ferrofluid engine, generic over its physics backend.
pub struct Ferrofluid<W: PhysicsWorld = RigidWorld> {
    config: FerrofluidConfig,
    world: W,
    scene: Scene,
    oscillator: CoreOscillator,
    probe: PointerProbe,
    builder: ScalarFieldBuilder,
    extractor: IsoSurfaceExtractor,
    field: ScalarField,
    surface: IsoSurface,
    scratch: IsoSurface,
    transforms: Vec<Transform>,
    positions: Vec<DVec3>,
    stats: FrameStats,
}

impl Ferrofluid<RigidWorld> {
    /// Builds a session on the built-in rigid-body world.
    pub fn new(config: FerrofluidConfig) -> Result<Self, FerroError> {
        config.validate()?;
        let world = RigidWorld::new(WorldSettings {
            timestep: config.timestep,
            ..WorldSettings::default()
        })?;
        Self::with_world(config, world)
    }

    /// Builds a session from a preset name and JSON overrides.
    pub fn from_preset(name: &str, params: &Value) -> Result<Self, FerroError> {
        Self::new(FerrofluidConfig::from_name(name, params)?)
    }
}

impl<W: PhysicsWorld> Ferrofluid<W> {
    /// Builds a session on a caller-supplied physics world. The world is
    /// populated with the core, the probe and the bodies.
    pub fn with_world(config: FerrofluidConfig, mut world: W) -> Result<Self, FerroError> {
        config.validate()?;
        let scene = populate(&mut world, &config)?;
        let builder = ScalarFieldBuilder::from_config(&config);
        let field = builder.new_field()?;
        let transforms = scene
            .bodies
            .iter()
            .map(|&body| world.transform(body))
            .collect::<Result<Vec<_>, _>>()?;
        let positions = transforms.iter().map(|t| t.position).collect();

        info!(
            preset = config.preset.name(),
            resolution = config.resolution,
            bodies = scene.bodies.len(),
            force_law = config.force_law.name(),
            "ferrofluid session created"
        );

        Ok(Self {
            oscillator: CoreOscillator::new(config.oscillator),
            probe: PointerProbe::new(),
            extractor: IsoSurfaceExtractor::new(config.isolation),
            surface: IsoSurface::new(),
            scratch: IsoSurface::new(),
            stats: FrameStats::default(),
            config,
            world,
            scene,
            builder,
            field,
            transforms,
            positions,
        })
    }

    pub fn config(&self) -> &FerrofluidConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// Body poses read back after the last step, in population order.
    pub fn body_transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Visual scale of the core for the last frame.
    pub fn core_scale(&self) -> f64 {
        self.oscillator.scale()
    }

    /// Last known pointer probe position.
    pub fn probe_position(&self) -> Option<DVec3> {
        self.probe.position()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    fn drive_world(&mut self, pointer: Option<DVec3>, core_scale: f64) -> Result<(), FerroError> {
        self.world.set_position(self.scene.core, DVec3::ZERO)?;
        self.world
            .set_collider_radius(self.scene.core_collider, self.oscillator.collider_radius())?;
        if let Some(point) = pointer {
            self.world.set_position(self.scene.probe, point)?;
        }

        for &body in &self.scene.bodies {
            self.world.reset_forces(body)?;
            let position = self.world.transform(body)?.position;
            let force = attraction_force(&self.config.force_law, position, core_scale);
            self.world.apply_force(body, force)?;
        }
        self.world.step();

        self.transforms.clear();
        self.positions.clear();
        for &body in &self.scene.bodies {
            let transform = self.world.transform(body)?;
            self.positions.push(transform.position);
            self.transforms.push(transform);
        }
        Ok(())
    }
}

impl<W: PhysicsWorld> Engine for Ferrofluid<W> {
    fn tick(&mut self, ctx: &FrameContext) -> Result<(), FerroError> {
        let core_scale = self.oscillator.update(ctx.elapsed_ms);
        // a non-finite hit counts as no hit
        let pointer = ctx.pointer.filter(|p| p.is_finite());
        if pointer.is_none() && ctx.pointer.is_some() {
            warn!(frame = self.stats.frames + 1, "ignoring non-finite pointer hit");
        }
        self.probe.observe(pointer);
        self.drive_world(pointer, core_scale)?;
        self.stats.frames += 1;

        let sources = FieldSources {
            core_scale,
            bodies: &self.positions,
            probe: self.probe.contribution(self.config.probe_policy),
        };
        match self.builder.build(&mut self.field, &sources) {
            Ok(built) => {
                self.extractor.extract_into(&self.field, &mut self.scratch);
                self.scratch.to_world(self.config.world_scale);
                std::mem::swap(&mut self.surface, &mut self.scratch);
                self.stats.injected = built.injected;
                self.stats.excluded = built.excluded;
                self.stats.vertices = self.surface.vertex_count();
                self.stats.triangles = self.surface.triangle_count();
            }
            Err(err) => {
                self.stats.skipped_frames += 1;
                warn!(frame = self.stats.frames, error = %err, "field rebuild failed, keeping previous surface");
            }
        }

        debug!(
            frame = self.stats.frames,
            elapsed_ms = ctx.elapsed_ms,
            core_scale,
            injected = self.stats.injected,
            excluded = self.stats.excluded,
            triangles = self.stats.triangles,
            "tick"
        );
        Ok(())
    }

    fn field(&self) -> &ScalarField {
        &self.field
    }

    fn surface(&self) -> &IsoSurface {
        &self.surface
    }

    fn params(&self) -> Value {
        self.config.to_json()
    }

    fn param_schema(&self) -> Value {
        self.config.schema()
    }
}
