//! Deferred clip arrival.
//!
//! Stands in for the asynchronous asset loader: each configured clip becomes
//! available after its frame delay. Real file IO is out of scope; the feed
//! only models *when* clips show up.

use crate::{config::ClipSpec, mixer::Clip};

#[derive(Debug, Default)]
pub struct ClipFeed {
    pending: Vec<(u32, Clip)>,
    frame: u32,
}

impl ClipFeed {
    pub fn from_specs(specs: &[ClipSpec]) -> Self {
        let pending = specs
            .iter()
            .map(|s| (s.delay_frames, Clip::new(s.name.clone(), s.duration)))
            .collect();
        Self { pending, frame: 0 }
    }

    /// Advances one frame and returns the clips that became available.
    pub fn poll(&mut self) -> Vec<Clip> {
        self.frame = self.frame.saturating_add(1);
        let frame = self.frame;
        let (ready, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(delay, _)| *delay < frame);
        self.pending = waiting;
        ready.into_iter().map(|(_, clip)| clip).collect()
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }
}
