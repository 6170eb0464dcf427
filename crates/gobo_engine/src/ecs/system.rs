//! Behaviour trait for host-driven components

use bitflags::bitflags;

bitflags! {
    /// Attributes of a component that changed since the previous update
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangedFields: u32 {
        /// Texture source identifier
        const SRC = 1 << 0;
        /// Projected texture intensity
        const INTENSITY = 1 << 1;
    }
}

/// Lifecycle callbacks a host calls on a component.
///
/// `Ctx` is whatever per-scene state the component needs; it is passed in by
/// reference on every call instead of being looked up globally.
pub trait Behavior<Ctx> {
    /// Called once after the component is attached
    fn on_init(&mut self, _ctx: &mut Ctx) {}

    /// Called after one or more attributes changed
    fn on_update(&mut self, _ctx: &mut Ctx, _changed: ChangedFields) {}

    /// Called once per frame
    fn on_tick(&mut self, _ctx: &mut Ctx, _time: f32, _delta: f32) {}

    /// Called before the component is detached
    fn on_remove(&mut self, _ctx: &mut Ctx) {}
}
