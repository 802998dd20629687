use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::core::game::TurnEvent;
use crate::core::ports::emitter::EmitterPort;

/// Forwards events to the single consumer of a run. A consumer that went
/// away is noted once; the run keeps going.
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<TurnEvent>,
    disconnected: AtomicBool,
}

impl ChannelEmitter {
    pub fn new(tx: mpsc::UnboundedSender<TurnEvent>) -> Self {
        Self {
            tx,
            disconnected: AtomicBool::new(false),
        }
    }
}

impl EmitterPort for ChannelEmitter {
    fn emit(&self, event: &TurnEvent) {
        if self.tx.send(event.clone()).is_err() && !self.disconnected.swap(true, Ordering::SeqCst)
        {
            log::debug!(
                "event consumer for game {} disconnected; continuing without it",
                event.run_id
            );
        }
    }
}
