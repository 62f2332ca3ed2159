//! Named presets and JSON overrides for the ferrofluid simulation.
//!
//! Two presets are supported:
//! - `orbit`: bodies drift under a constant pull and the core is not fused
//!   into the field (96^3 grid, world scale 10, isolation 800).
//! - `core`: the breathing core is fused into the field and modulates the
//!   attraction law (64^3 grid, world scale 5, isolation 90).
//!
//! Any field of [`FerrofluidConfig`] can be overridden from a flat JSON
//! object with the same key names; missing or mistyped keys keep the preset
//! value.

use ferrofluid_core::params::{param_f64, param_string, param_u64, param_usize};
use ferrofluid_core::FerroError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const PRESET_NAMES: &[&str] = &["core", "orbit"];

/// Selects one of the built-in parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Constant pull, no core ball in the field.
    Orbit,
    /// Core-coupled attraction with the core fused into the field.
    Core,
}

impl Preset {
    /// Looks a preset up by name. `duck` and `ferrofluid` are accepted as
    /// aliases of `orbit` and `core`.
    pub fn from_name(name: &str) -> Result<Self, FerroError> {
        match name {
            "orbit" | "duck" => Ok(Preset::Orbit),
            "core" | "ferrofluid" => Ok(Preset::Core),
            other => Err(FerroError::UnknownPreset(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Orbit => "orbit",
            Preset::Core => "core",
        }
    }

    pub fn list_names() -> &'static [&'static str] {
        PRESET_NAMES
    }
}

/// Force law pulling bodies towards the scene centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForceLaw {
    /// `dir * -pull`, independent of distance.
    ConstantPull { pull: f64 },
    /// Attraction grows with the core scale; bodies closer than
    /// `core_scale * min_distance_factor` are pushed out at
    /// `attraction * repulsion_factor`.
    CoreCoupled {
        base_attraction: f64,
        core_influence: f64,
        min_distance_factor: f64,
        repulsion_factor: f64,
    },
}

impl ForceLaw {
    pub const CONSTANT_PULL: ForceLaw = ForceLaw::ConstantPull { pull: 0.5 };
    pub const CORE_COUPLED: ForceLaw = ForceLaw::CoreCoupled {
        base_attraction: 1.5,
        core_influence: 2.0,
        min_distance_factor: 1.2,
        repulsion_factor: 0.5,
    };

    pub fn name(&self) -> &'static str {
        match self {
            ForceLaw::ConstantPull { .. } => "constant_pull",
            ForceLaw::CoreCoupled { .. } => "core_coupled",
        }
    }

    fn from_json(params: &Value, base: ForceLaw) -> Result<Self, FerroError> {
        let kind = param_string(params, "force_law", base.name());
        let template = match kind.as_str() {
            "constant_pull" if matches!(base, ForceLaw::ConstantPull { .. }) => base,
            "core_coupled" if matches!(base, ForceLaw::CoreCoupled { .. }) => base,
            "constant_pull" => Self::CONSTANT_PULL,
            "core_coupled" => Self::CORE_COUPLED,
            other => {
                return Err(FerroError::InvalidConfig {
                    name: "force_law".into(),
                    reason: format!("unknown force law '{other}'"),
                })
            }
        };
        Ok(match template {
            ForceLaw::ConstantPull { pull } => ForceLaw::ConstantPull {
                pull: param_f64(params, "pull", pull),
            },
            ForceLaw::CoreCoupled {
                base_attraction,
                core_influence,
                min_distance_factor,
                repulsion_factor,
            } => ForceLaw::CoreCoupled {
                base_attraction: param_f64(params, "base_attraction", base_attraction),
                core_influence: param_f64(params, "core_influence", core_influence),
                min_distance_factor: param_f64(params, "min_distance_factor", min_distance_factor),
                repulsion_factor: param_f64(params, "repulsion_factor", repulsion_factor),
            },
        })
    }
}

/// What the field does with the pointer probe on frames without a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbePolicy {
    /// The last known position keeps contributing.
    ReuseLast,
    /// The probe only contributes on frames with a fresh hit.
    Exclude,
}

impl ProbePolicy {
    pub fn name(self) -> &'static str {
        match self {
            ProbePolicy::ReuseLast => "reuse_last",
            ProbePolicy::Exclude => "exclude",
        }
    }

    fn from_name(name: &str) -> Result<Self, FerroError> {
        match name {
            "reuse_last" => Ok(ProbePolicy::ReuseLast),
            "exclude" => Ok(ProbePolicy::Exclude),
            other => Err(FerroError::InvalidConfig {
                name: "probe_policy".into(),
                reason: format!("expected 'reuse_last' or 'exclude', got '{other}'"),
            }),
        }
    }
}

/// Sinusoidal pulse of the core: `offset + sin(t * rate) * amplitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorConfig {
    pub offset: f64,
    /// Radians per millisecond.
    pub rate: f64,
    pub amplitude: f64,
    /// Unscaled core radius.
    pub core_size: f64,
    /// Collider radius multiplier applied on top of `core_size * scale`.
    pub collider_factor: f64,
}

/// Complete configuration of a ferrofluid session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FerrofluidConfig {
    pub preset: Preset,

    // field
    /// Samples per axis of the scalar field.
    pub resolution: usize,
    /// Side of the world-space cube covered by the field.
    pub world_scale: f64,
    pub isolation: f64,
    /// Normalized contributors must lie strictly inside `(margin, 1 - margin)`.
    pub margin: f64,
    pub subtract: f64,
    /// Core ball strength per unit of core scale; `None` keeps the core out
    /// of the field.
    pub core_strength: Option<f64>,
    pub body_strength: f64,
    pub probe_strength: f64,
    pub probe_policy: ProbePolicy,

    // dynamics
    pub force_law: ForceLaw,
    pub oscillator: OscillatorConfig,
    pub population: usize,
    /// Side of the origin-centred cube bodies spawn in.
    pub spawn_range: f64,
    pub seed: u64,
    pub body_radius: f64,
    pub body_density: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub probe_radius: f64,
    /// Physics timestep in seconds.
    pub timestep: f64,
}

impl FerrofluidConfig {
    /// The built-in parameters of `preset`.
    pub fn preset(preset: Preset) -> Self {
        let shared = Self {
            preset,
            resolution: 64,
            world_scale: 5.0,
            isolation: 90.0,
            margin: 0.05,
            subtract: 12.0,
            core_strength: Some(0.96),
            body_strength: 0.42,
            probe_strength: 0.6,
            probe_policy: ProbePolicy::ReuseLast,
            force_law: ForceLaw::CORE_COUPLED,
            oscillator: OscillatorConfig {
                offset: 0.8,
                rate: 0.002,
                amplitude: 0.6,
                core_size: 1.0,
                collider_factor: 1.1,
            },
            population: 100,
            spawn_range: 4.0,
            seed: 42,
            body_radius: 0.325,
            body_density: 0.5,
            linear_damping: 2.0,
            angular_damping: 1.0,
            probe_radius: 0.75,
            timestep: 1.0 / 60.0,
        };
        match preset {
            Preset::Core => shared,
            Preset::Orbit => Self {
                resolution: 96,
                world_scale: 10.0,
                isolation: 800.0,
                core_strength: None,
                body_strength: 0.5,
                probe_strength: 0.75,
                force_law: ForceLaw::CONSTANT_PULL,
                oscillator: OscillatorConfig {
                    // 0.8 +/- 0.2 keeps the pulse inside 0.6..1.0
                    amplitude: 0.2,
                    ..shared.oscillator
                },
                spawn_range: 8.0,
                ..shared
            },
        }
    }

    /// Preset `name` with the overrides in `params` applied, validated.
    pub fn from_name(name: &str, params: &Value) -> Result<Self, FerroError> {
        Self::from_json(Preset::from_name(name)?, params)
    }

    /// `preset` with the overrides in `params` applied, validated.
    pub fn from_json(preset: Preset, params: &Value) -> Result<Self, FerroError> {
        let base = Self::preset(preset);
        let core_strength = match params.get("core_strength") {
            Some(Value::Null) => None,
            Some(v) => v.as_f64().or(base.core_strength),
            None => base.core_strength,
        };
        let probe_policy = ProbePolicy::from_name(&param_string(
            params,
            "probe_policy",
            base.probe_policy.name(),
        ))?;
        let osc = base.oscillator;

        let config = Self {
            preset,
            resolution: param_usize(params, "resolution", base.resolution),
            world_scale: param_f64(params, "world_scale", base.world_scale),
            isolation: param_f64(params, "isolation", base.isolation),
            margin: param_f64(params, "margin", base.margin),
            subtract: param_f64(params, "subtract", base.subtract),
            core_strength,
            body_strength: param_f64(params, "body_strength", base.body_strength),
            probe_strength: param_f64(params, "probe_strength", base.probe_strength),
            probe_policy,
            force_law: ForceLaw::from_json(params, base.force_law)?,
            oscillator: OscillatorConfig {
                offset: param_f64(params, "oscillator_offset", osc.offset),
                rate: param_f64(params, "oscillator_rate", osc.rate),
                amplitude: param_f64(params, "oscillator_amplitude", osc.amplitude),
                core_size: param_f64(params, "core_size", osc.core_size),
                collider_factor: param_f64(params, "core_collider_factor", osc.collider_factor),
            },
            population: param_usize(params, "population", base.population),
            spawn_range: param_f64(params, "spawn_range", base.spawn_range),
            seed: param_u64(params, "seed", base.seed),
            body_radius: param_f64(params, "body_radius", base.body_radius),
            body_density: param_f64(params, "body_density", base.body_density),
            linear_damping: param_f64(params, "linear_damping", base.linear_damping),
            angular_damping: param_f64(params, "angular_damping", base.angular_damping),
            probe_radius: param_f64(params, "probe_radius", base.probe_radius),
            timestep: param_f64(params, "timestep", base.timestep),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), FerroError> {
        if self.resolution < 3 {
            return Err(FerroError::InvalidResolution(self.resolution));
        }
        positive("world_scale", self.world_scale)?;
        positive("isolation", self.isolation)?;
        positive("subtract", self.subtract)?;
        positive("body_radius", self.body_radius)?;
        positive("body_density", self.body_density)?;
        positive("probe_radius", self.probe_radius)?;
        positive("timestep", self.timestep)?;
        positive("core_size", self.oscillator.core_size)?;
        positive("core_collider_factor", self.oscillator.collider_factor)?;
        non_negative("body_strength", self.body_strength)?;
        non_negative("probe_strength", self.probe_strength)?;
        non_negative("spawn_range", self.spawn_range)?;
        non_negative("linear_damping", self.linear_damping)?;
        non_negative("angular_damping", self.angular_damping)?;
        if let Some(strength) = self.core_strength {
            non_negative("core_strength", strength)?;
        }
        if !(0.0..0.5).contains(&self.margin) {
            return Err(invalid("margin", "must lie in [0, 0.5)"));
        }
        let osc = &self.oscillator;
        if !(osc.offset.is_finite() && osc.rate.is_finite() && osc.amplitude.is_finite()) {
            return Err(invalid("oscillator", "every oscillator term must be finite"));
        }
        let (low, _) = self.scale_bounds();
        if !(low > 0.0) {
            return Err(invalid(
                "oscillator",
                &format!("core scale must stay positive, minimum is {low}"),
            ));
        }
        match self.force_law {
            ForceLaw::ConstantPull { pull } => non_negative("pull", pull)?,
            ForceLaw::CoreCoupled {
                base_attraction,
                core_influence,
                min_distance_factor,
                repulsion_factor,
            } => {
                non_negative("base_attraction", base_attraction)?;
                non_negative("core_influence", core_influence)?;
                non_negative("min_distance_factor", min_distance_factor)?;
                non_negative("repulsion_factor", repulsion_factor)?;
            }
        }
        Ok(())
    }

    /// Inclusive range the core scale sweeps through.
    pub fn scale_bounds(&self) -> (f64, f64) {
        let osc = &self.oscillator;
        (osc.offset - osc.amplitude.abs(), osc.offset + osc.amplitude.abs())
    }

    /// The configuration as a JSON object.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Schema of the flat override keys accepted by [`Self::from_json`].
    pub fn schema(&self) -> Value {
        json!({
            "resolution": {
                "type": "integer",
                "default": self.resolution,
                "min": 3,
                "description": "Samples per axis of the scalar field"
            },
            "world_scale": {
                "type": "number",
                "default": self.world_scale,
                "min": 0.0,
                "description": "Side of the world cube covered by the field"
            },
            "isolation": {
                "type": "number",
                "default": self.isolation,
                "min": 0.0,
                "description": "Field value at which the surface is extracted"
            },
            "margin": {
                "type": "number",
                "default": self.margin,
                "min": 0.0,
                "max": 0.5,
                "description": "Contributors must map strictly inside (margin, 1 - margin)"
            },
            "subtract": {
                "type": "number",
                "default": self.subtract,
                "min": 0.0,
                "description": "Falloff of every metaball; larger is sharper"
            },
            "core_strength": {
                "type": ["number", "null"],
                "default": self.core_strength,
                "description": "Core ball strength per unit of core scale, null to disable"
            },
            "body_strength": {
                "type": "number",
                "default": self.body_strength,
                "min": 0.0,
                "description": "Metaball strength of each body"
            },
            "probe_strength": {
                "type": "number",
                "default": self.probe_strength,
                "min": 0.0,
                "description": "Metaball strength of the pointer probe"
            },
            "probe_policy": {
                "type": "string",
                "default": self.probe_policy.name(),
                "enum": ["reuse_last", "exclude"],
                "description": "Whether the probe keeps contributing on frames without a hit"
            },
            "force_law": {
                "type": "string",
                "default": self.force_law.name(),
                "enum": ["constant_pull", "core_coupled"],
                "description": "Attraction law applied to every body"
            },
            "oscillator_offset": {
                "type": "number",
                "default": self.oscillator.offset,
                "description": "Centre of the core pulse"
            },
            "oscillator_rate": {
                "type": "number",
                "default": self.oscillator.rate,
                "description": "Angular rate of the core pulse in radians per millisecond"
            },
            "oscillator_amplitude": {
                "type": "number",
                "default": self.oscillator.amplitude,
                "description": "Amplitude of the core pulse"
            },
            "population": {
                "type": "integer",
                "default": self.population,
                "min": 0,
                "description": "Number of dynamic bodies"
            },
            "spawn_range": {
                "type": "number",
                "default": self.spawn_range,
                "min": 0.0,
                "description": "Side of the cube bodies spawn in"
            },
            "seed": {
                "type": "integer",
                "default": self.seed,
                "description": "Seed for body placement"
            }
        })
    }
}

fn invalid(name: &str, reason: &str) -> FerroError {
    FerroError::InvalidConfig {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(name: &str, value: f64) -> Result<(), FerroError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be positive and finite, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), FerroError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be non-negative and finite, got {value}")))
    }
}
