//! Queued control input.
//!
//! Whatever reads the VR controllers pushes one [`ControlEvent`] per observed
//! control state into [`ControlInput`]. The
//! [`apply_control_input`](crate::systems::animation::apply_control_input)
//! system drains the queue each tick and feeds it to the animation engine,
//! which only reacts to press/release edges, so repeating the current state
//! every frame is fine.

use bevy_ecs::prelude::*;

/// Observed state of one control bound to one animation instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEvent {
    pub animation_id: String,
    pub control: String,
    pub pressed: bool,
}

#[derive(Resource, Debug, Default)]
pub struct ControlInput {
    events: Vec<ControlEvent>,
}

impl ControlInput {
    pub fn push(&mut self, animation_id: impl Into<String>, control: impl Into<String>, pressed: bool) {
        self.events.push(ControlEvent {
            animation_id: animation_id.into(),
            control: control.into(),
            pressed,
        });
    }

    /// Take every queued event in arrival order.
    pub fn drain(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
