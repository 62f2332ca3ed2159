//! Pointer probe: an extra field contributor following the user's pointer.

use glam::DVec3;

use crate::config::ProbePolicy;

/// Tracks the latest pointer hit and whether it came from the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerProbe {
    position: Option<DVec3>,
    fresh: bool,
}

impl PointerProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records this frame's pointer sample. A miss keeps the last known
    /// position but marks it stale.
    pub fn observe(&mut self, hit: Option<DVec3>) {
        match hit {
            Some(point) => {
                self.position = Some(point);
                self.fresh = true;
            }
            None => self.fresh = false,
        }
    }

    /// Last known position, `None` until the first hit.
    pub fn position(&self) -> Option<DVec3> {
        self.position
    }

    /// Whether the last observed sample was a hit.
    fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Position to inject into the field under `policy`.
    pub fn contribution(&self, policy: ProbePolicy) -> Option<DVec3> {
        match policy {
            ProbePolicy::ReuseLast => self.position,
            ProbePolicy::Exclude => self.position.filter(|_| self.is_fresh()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_hit_yet_contributes_nothing() {
        let mut probe = PointerProbe::new();
        probe.observe(None);
        assert_eq!(probe.contribution(ProbePolicy::ReuseLast), None);
        assert_eq!(probe.contribution(ProbePolicy::Exclude), None);
    }

    #[test]
    fn fresh_hit_contributes_under_both_policies() {
        let mut probe = PointerProbe::new();
        let p = DVec3::new(1.0, 0.0, -0.5);
        probe.observe(Some(p));
        assert!(probe.is_fresh());
        assert_eq!(probe.contribution(ProbePolicy::ReuseLast), Some(p));
        assert_eq!(probe.contribution(ProbePolicy::Exclude), Some(p));
    }

    #[test]
    fn stale_hit_depends_on_policy() {
        let mut probe = PointerProbe::new();
        let p = DVec3::new(0.2, 0.0, 0.3);
        probe.observe(Some(p));
        probe.observe(None);
        assert!(!probe.is_fresh());
        assert_eq!(probe.position(), Some(p));
        assert_eq!(probe.contribution(ProbePolicy::ReuseLast), Some(p));
        assert_eq!(probe.contribution(ProbePolicy::Exclude), None);
    }

    #[test]
    fn newer_hit_replaces_older() {
        let mut probe = PointerProbe::new();
        probe.observe(Some(DVec3::X));
        probe.observe(None);
        probe.observe(Some(DVec3::Z));
        assert_eq!(probe.contribution(ProbePolicy::Exclude), Some(DVec3::Z));
    }
}
