//! The per-frame `Engine` trait and the context value threaded through it.
//!
//! The trait is object-safe so a driver can hold `Box<dyn Engine>` and swap
//! simulations at runtime.

use glam::DVec3;
use serde_json::Value;

use crate::error::FerroError;
use crate::field::ScalarField;
use crate::mesh::IsoSurface;

/// Everything a tick needs from the outside world for one frame.
///
/// Replaces scene-wide mutable state: the driver builds one of these per
/// render-loop callback and passes it down the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameContext {
    /// Monotonic elapsed time in milliseconds.
    pub elapsed_ms: f64,
    /// Pointer projected onto the reference plane, `None` when the ray missed.
    pub pointer: Option<DVec3>,
}

impl FrameContext {
    /// A frame at `elapsed_ms` with no pointer hit.
    pub fn at(elapsed_ms: f64) -> Self {
        Self {
            elapsed_ms,
            pointer: None,
        }
    }

    /// Same frame with a pointer hit at `point`.
    pub fn with_pointer(self, point: DVec3) -> Self {
        Self {
            pointer: Some(point),
            ..self
        }
    }
}

/// A field-producing simulation advanced once per rendered frame.
pub trait Engine {
    /// Runs one full pipeline pass for the frame described by `ctx`.
    ///
    /// Errors are fatal to the session; recoverable per-frame failures are
    /// handled inside the engine by keeping the previous surface.
    fn tick(&mut self, ctx: &FrameContext) -> Result<(), FerroError>;

    /// Scalar field built during the last tick.
    fn field(&self) -> &ScalarField;

    /// Surface extracted during the last successful tick.
    fn surface(&self) -> &IsoSurface;

    /// Current configuration as a JSON object.
    fn params(&self) -> Value;

    /// Schema of every configurable parameter: type, default, range.
    fn param_schema(&self) -> Value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct CountingEngine {
        field: ScalarField,
        surface: IsoSurface,
        ticks: usize,
        last: FrameContext,
    }

    impl CountingEngine {
        fn new() -> Self {
            Self {
                field: ScalarField::new(4).unwrap(),
                surface: IsoSurface::new(),
                ticks: 0,
                last: FrameContext::default(),
            }
        }
    }

    impl Engine for CountingEngine {
        fn tick(&mut self, ctx: &FrameContext) -> Result<(), FerroError> {
            self.ticks += 1;
            self.last = *ctx;
            Ok(())
        }

        fn field(&self) -> &ScalarField {
            &self.field
        }

        fn surface(&self) -> &IsoSurface {
            &self.surface
        }

        fn params(&self) -> Value {
            json!({"ticks": self.ticks})
        }

        fn param_schema(&self) -> Value {
            json!({"ticks": {"type": "integer", "default": 0}})
        }
    }

    #[test]
    fn frame_context_defaults_to_no_pointer() {
        let ctx = FrameContext::at(16.0);
        assert_eq!(ctx.elapsed_ms, 16.0);
        assert!(ctx.pointer.is_none());
    }

    #[test]
    fn with_pointer_keeps_elapsed_time() {
        let ctx = FrameContext::at(33.0).with_pointer(DVec3::X);
        assert_eq!(ctx.elapsed_ms, 33.0);
        assert_eq!(ctx.pointer, Some(DVec3::X));
    }

    #[test]
    fn engine_trait_is_object_safe() {
        let mut engine: Box<dyn Engine> = Box::new(CountingEngine::new());
        engine.tick(&FrameContext::at(1.0)).unwrap();
        assert_eq!(engine.field().resolution(), 4);
        assert!(engine.surface().is_empty());
        assert_eq!(engine.params()["ticks"], 1);
    }

    #[test]
    fn tick_receives_context() {
        let mut engine = CountingEngine::new();
        let ctx = FrameContext::at(5.0).with_pointer(DVec3::Y);
        engine.tick(&ctx).unwrap();
        assert_eq!(engine.last, ctx);
    }

    #[test]
    fn schema_describes_params() {
        let engine = CountingEngine::new();
        assert_eq!(engine.param_schema()["ticks"]["type"], "integer");
    }
}
