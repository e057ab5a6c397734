//! Deterministic echo classification.
//!
//! The relay replicates every accepted write to every peer, the writer
//! included. Without a guard, a client would see its own write come back,
//! treat it as a remote change, republish, and feed an unbounded update
//! storm between peers. The guard here is logical, not timing-based: each
//! outbound write carries the writer's id and a per-key sequence number,
//! and inbound updates are classified against the publish counter instead
//! of against a wall-clock suppression window that a slow relay could
//! outlive.

/// What an inbound update turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoClass {
    /// Someone else's write: reconcile it into the store.
    Foreign,
    /// The pure echo of our latest write: drop it.
    OwnEcho,
    /// Our own write delivered after a foreign one, meaning the relay
    /// settled a conflict in our favor. Apply it back to the store (the
    /// foreign value overwrote ours locally in the meantime) but never
    /// republish.
    OwnSettled,
    /// A reordered echo of an own write we have since superseded: drop it,
    /// the newer write is still in flight behind it.
    StaleOwn,
}

impl EchoClass {
    /// Whether the update's body should be applied to the store.
    pub fn applies(self) -> bool {
        matches!(self, EchoClass::Foreign | EchoClass::OwnSettled)
    }
}

/// Per-key echo state on the writing side.
#[derive(Debug, Default)]
pub struct EchoGate {
    publish_seq: u64,
    foreign_seen: bool,
}

impl EchoGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outbound write and return the sequence number to stamp
    /// on its envelope.
    pub fn published(&mut self) -> u64 {
        self.publish_seq += 1;
        self.foreign_seen = false;
        self.publish_seq
    }

    /// Classify an inbound envelope for the gated key.
    pub fn classify(&mut self, origin_is_local: bool, seq: u64) -> EchoClass {
        if !origin_is_local {
            self.foreign_seen = true;
            return EchoClass::Foreign;
        }
        if seq < self.publish_seq {
            return EchoClass::StaleOwn;
        }
        if self.foreign_seen {
            // A duplicate of the settled value must classify as a plain
            // echo next time around.
            self.foreign_seen = false;
            return EchoClass::OwnSettled;
        }
        EchoClass::OwnEcho
    }
}
