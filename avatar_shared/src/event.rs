//! Character notifications.
//!
//! A tick can produce several things worth reporting: a clip finished
//! loading, the state machine came up, the active state changed. The
//! character queues them here by type and the app drains each queue once
//! the tick is over, so logging never runs inside the simulation step.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use crate::fsm::{StateName, Transition};

type Queue = Box<dyn Any + Send + Sync>;

/// One FIFO queue per event type.
#[derive(Default)]
pub struct EventBus {
    queues: HashMap<TypeId, Queue>,
}

impl EventBus {
    fn queue<E: 'static + Send + Sync>(&self) -> Option<&Vec<E>> {
        self.queues.get(&TypeId::of::<E>())?.downcast_ref()
    }

    pub fn push<E: 'static + Send + Sync>(&mut self, e: E) {
        let slot = self
            .queues
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::<Vec<E>>::default());
        if let Some(events) = slot.downcast_mut::<Vec<E>>() {
            events.push(e);
        }
    }

    pub fn len<E: 'static + Send + Sync>(&self) -> usize {
        self.queue::<E>().map_or(0, Vec::len)
    }

    /// Takes every queued `E`, oldest first.
    pub fn drain<E: 'static + Send + Sync>(&mut self) -> Vec<E> {
        match self.queues.remove(&TypeId::of::<E>()) {
            Some(slot) => slot.downcast::<Vec<E>>().map_or_else(|_| Vec::new(), |events| *events),
            None => Vec::new(),
        }
    }
}

/// The active animation state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged(pub Transition);

/// A clip finished loading and was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRegistered {
    pub name: String,
}

/// All animations are present and the machine entered its first state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationsReady {
    pub initial: StateName,
}
