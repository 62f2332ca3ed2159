//! The breathing core.
//!
//! The core's scale is a pure function of elapsed time, so a session can be
//! replayed exactly from its frame timestamps. The scale is computed once per
//! frame and that single value feeds the collider radius, the attraction law
//! and the core's field contribution.

use std::f64::consts::TAU;

use crate::config::OscillatorConfig;

/// Kinematic core pinned at the origin whose scale pulses sinusoidally.
#[derive(Debug, Clone)]
pub struct CoreOscillator {
    config: OscillatorConfig,
    scale: f64,
}

impl CoreOscillator {
    /// Starts at `t = 0`, where the scale equals the configured offset.
    pub fn new(config: OscillatorConfig) -> Self {
        Self {
            config,
            scale: scale_at(&config, 0.0),
        }
    }

    /// Recomputes the scale for `elapsed_ms` and returns it.
    pub fn update(&mut self, elapsed_ms: f64) -> f64 {
        self.scale = scale_at(&self.config, elapsed_ms);
        self.scale
    }

    /// Scale from the last update.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Collider radius matching the current visual scale.
    pub fn collider_radius(&self) -> f64 {
        self.config.core_size * self.scale * self.config.collider_factor
    }

    /// Length of one full pulse in milliseconds, `None` for a static core.
    pub fn period_ms(&self) -> Option<f64> {
        (self.config.rate != 0.0).then(|| TAU / self.config.rate.abs())
    }
}

/// `offset + sin(t * rate) * amplitude` with `t` in milliseconds.
pub fn scale_at(config: &OscillatorConfig, elapsed_ms: f64) -> f64 {
    config.offset + (elapsed_ms * config.rate).sin() * config.amplitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FerrofluidConfig, Preset};

    fn core_config() -> OscillatorConfig {
        FerrofluidConfig::preset(Preset::Core).oscillator
    }

    #[test]
    fn starts_at_offset() {
        let osc = CoreOscillator::new(core_config());
        assert_eq!(osc.scale(), 0.8);
    }

    #[test]
    fn peaks_and_troughs_at_quarter_periods() {
        let mut osc = CoreOscillator::new(core_config());
        let period = osc.period_ms().unwrap();
        let peak = osc.update(period * 0.25);
        assert!((peak - 1.4).abs() < 1e-9, "peak {peak}");
        let trough = osc.update(period * 0.75);
        assert!((trough - 0.2).abs() < 1e-9, "trough {trough}");
    }

    #[test]
    fn collider_radius_follows_scale() {
        let mut osc = CoreOscillator::new(core_config());
        let period = osc.period_ms().unwrap();
        osc.update(period * 0.25);
        assert!((osc.collider_radius() - 1.4 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn update_is_replayable() {
        let mut a = CoreOscillator::new(core_config());
        let mut b = CoreOscillator::new(core_config());
        for t in [0.0, 16.7, 1000.0, 123_456.0] {
            assert_eq!(a.update(t).to_bits(), b.update(t).to_bits());
        }
        assert_eq!(a.update(500.0), scale_at(&core_config(), 500.0));
    }

    #[test]
    fn static_core_has_no_period() {
        let config = OscillatorConfig {
            rate: 0.0,
            ..core_config()
        };
        let mut osc = CoreOscillator::new(config);
        assert!(osc.period_ms().is_none());
        assert_eq!(osc.update(1e6), 0.8);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scale_stays_within_preset_bounds(t in 0.0_f64..1e7, orbit: bool) {
                let preset = if orbit { Preset::Orbit } else { Preset::Core };
                let config = FerrofluidConfig::preset(preset);
                let (lo, hi) = config.scale_bounds();
                let s = scale_at(&config.oscillator, t);
                prop_assert!(s >= lo - 1e-12 && s <= hi + 1e-12, "scale {s} outside [{lo}, {hi}]");
            }

            #[test]
            fn scale_is_periodic(t in 0.0_f64..1e5, cycles in 1_u32..5) {
                let config = core_config();
                let period = TAU / config.rate;
                let a = scale_at(&config, t);
                let b = scale_at(&config, t + period * f64::from(cycles));
                prop_assert!((a - b).abs() < 1e-6, "{a} vs {b}");
            }
        }
    }
}
