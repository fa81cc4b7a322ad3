//! Message channel to the logic component
//!
//! Two one-way queues: frame-advance ticks out, raw state messages in. There
//! is no pairing between them. The logic component may answer a tick with
//! zero, one, or several messages, and may coalesce several ticks into one.

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::consts::TICK_BACKLOG;
use crate::snapshot::RawMessage;

/// Zero-payload frame-advance signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameAdvance;

/// Bridge side of the channel
#[derive(Debug)]
pub struct LogicChannel {
    ticks: Sender<FrameAdvance>,
    inbound: Receiver<RawMessage>,
}

/// Logic-component side of the channel
#[derive(Debug)]
pub struct LogicEndpoint {
    ticks: Receiver<FrameAdvance>,
    outbound: Sender<RawMessage>,
}

/// Cloneable handle for pushing state messages from host callbacks
#[derive(Debug, Clone)]
pub struct SnapshotPublisher(Sender<RawMessage>);

impl LogicChannel {
    /// Create a connected bridge/logic pair
    pub fn pair() -> (LogicChannel, LogicEndpoint) {
        let (tick_tx, tick_rx) = crossbeam_channel::bounded(TICK_BACKLOG);
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded();
        (
            LogicChannel {
                ticks: tick_tx,
                inbound: msg_rx,
            },
            LogicEndpoint {
                ticks: tick_rx,
                outbound: msg_tx,
            },
        )
    }

    /// Fire-and-forget tick. Never blocks; a full backlog or a departed
    /// logic component drops the tick silently.
    pub fn send_tick(&self) {
        match self.ticks.try_send(FrameAdvance) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::trace!("Tick backlog full, tick dropped"),
            Err(TrySendError::Disconnected(_)) => log::trace!("Logic endpoint gone, tick dropped"),
        }
    }

    /// Next inbound message, in arrival order
    pub fn try_next(&self) -> Option<RawMessage> {
        self.inbound.try_recv().ok()
    }

    /// Inbound messages waiting to be handled
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl LogicEndpoint {
    /// Consume every pending tick, returning how many there were
    pub fn drain_ticks(&self) -> usize {
        self.ticks.try_iter().count()
    }

    /// Push one state message. Returns false if the bridge is gone.
    pub fn publish(&self, msg: impl Into<RawMessage>) -> bool {
        self.outbound.send(msg.into()).is_ok()
    }

    pub fn publisher(&self) -> SnapshotPublisher {
        SnapshotPublisher(self.outbound.clone())
    }
}

impl SnapshotPublisher {
    /// Push one state message. Returns false if the bridge is gone.
    pub fn publish(&self, msg: impl Into<RawMessage>) -> bool {
        self.0.send(msg.into()).is_ok()
    }
}
