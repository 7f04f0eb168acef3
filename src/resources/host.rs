//! Shared handle to the host engine.

use std::ops::Deref;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;

use crate::host::ObjectModel;

/// The [`ObjectModel`] every system talks to.
#[derive(Resource, Clone)]
pub struct Host(pub Arc<dyn ObjectModel>);

impl Host {
    pub fn new(host: Arc<dyn ObjectModel>) -> Self {
        Host(host)
    }
}

impl Deref for Host {
    type Target = dyn ObjectModel;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
