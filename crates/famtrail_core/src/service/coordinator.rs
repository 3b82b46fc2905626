//! Render pass serialization.
//!
//! Every pass takes a ticket before computing. Starting a newer pass
//! invalidates all older tickets, so a slow pass can never commit markers
//! after a newer one has started.

use std::sync::atomic::{AtomicU64, Ordering};

/// Proof that a render pass was started at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
}

impl RenderTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Generation counter shared between the session and event sources.
#[derive(Debug, Default)]
pub struct RenderCoordinator {
    generation: AtomicU64,
}

impl RenderCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new pass, superseding every earlier ticket.
    pub fn begin(&self) -> RenderTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        RenderTicket { generation }
    }

    /// Whether `ticket` still belongs to the newest pass.
    pub fn is_current(&self, ticket: &RenderTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.generation
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
