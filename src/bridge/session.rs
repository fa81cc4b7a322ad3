//! Bridge session
//!
//! Owns every piece of the bridge for the lifetime of the page: the clock,
//! the channel, the codec, the reconciler and the sink. All of it is driven
//! from one logical thread, so no reconciliation pass ever overlaps another
//! or a sink mutation.

use super::channel::{LogicChannel, LogicEndpoint};
use super::clock::{FrameClock, FrameTick};
use super::host::HostEnvironment;
use crate::error::{BridgeError, Result};
use crate::scene::{ReconcileReport, SceneReconciler, SceneSink};
use crate::settings::BridgeSettings;
use crate::snapshot::{RawMessage, RenderOffset, SnapshotCodec};

/// Running counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub frames: u64,
    pub ticks_sent: u64,
    pub messages: u64,
    /// Messages decoded and reconciled
    pub applied: u64,
    pub decode_errors: u64,
    pub sink_errors: u64,
    pub fps: u32,
}

type ErrorHook = Box<dyn FnMut(&BridgeError)>;

/// One live bridge between a logic component and a scene
pub struct Session<S: SceneSink> {
    clock: FrameClock,
    channel: LogicChannel,
    codec: SnapshotCodec,
    reconciler: SceneReconciler<S::Handle>,
    sink: S,
    offset: RenderOffset,
    stats: SessionStats,
    error_hook: Option<ErrorHook>,
}

impl<S: SceneSink> Session<S> {
    /// Bring a session up, in order: render surface, render offset, logic
    /// mount, clock. Any missing component aborts startup.
    ///
    /// Returns the session and the logic side of its channel, which the host
    /// wires to the logic component.
    pub fn start(
        settings: &BridgeSettings,
        host: &impl HostEnvironment,
        sink: S,
    ) -> Result<(Self, LogicEndpoint)> {
        let (width, height) = host.surface_size(&settings.render_mount).ok_or_else(|| {
            log::error!("Render surface {} not found", settings.render_mount);
            BridgeError::component_not_found(&settings.render_mount)
        })?;

        let offset = RenderOffset::from_surface(width, height);
        log::info!(
            "Surface {}x{}, render offset ({}, {})",
            width,
            height,
            offset.x(),
            offset.y()
        );

        if !host.has_mount(&settings.logic_mount) {
            log::error!("Logic mount {} not found", settings.logic_mount);
            return Err(BridgeError::component_not_found(&settings.logic_mount));
        }
        let (channel, endpoint) = LogicChannel::pair();
        log::info!(
            "Logic component mounted at {} ({:?} messages)",
            settings.logic_mount,
            settings.wire_shape
        );

        let mut clock = FrameClock::new();
        clock.start();

        let session = Self {
            clock,
            channel,
            codec: SnapshotCodec::new(settings.codec_config(), offset),
            reconciler: SceneReconciler::new(settings.reconciler_config(height)),
            sink,
            offset,
            stats: SessionStats::default(),
            error_hook: None,
        };

        Ok((session, endpoint))
    }

    /// Observe every non-fatal error (dropped messages, rejected operations)
    pub fn set_error_hook(&mut self, hook: impl FnMut(&BridgeError) + 'static) {
        self.error_hook = Some(Box::new(hook));
    }

    /// One frame: send a tick, then reconcile whatever has arrived
    pub fn frame(&mut self, time_ms: f64) -> Option<FrameTick> {
        let tick = self.clock.advance(time_ms)?;
        self.stats.frames = tick.frame;
        self.stats.fps = self.clock.fps();

        self.channel.send_tick();
        self.stats.ticks_sent += 1;

        self.pump();
        Some(tick)
    }

    /// Handle every pending inbound message, in arrival order
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(msg) = self.channel.try_next() {
            // Failures are already counted and reported
            let _ = self.handle_message(&msg);
            handled += 1;
        }
        handled
    }

    /// Decode and reconcile one message. A message that fails to decode
    /// changes nothing.
    pub fn handle_message(&mut self, raw: &RawMessage) -> Result<ReconcileReport> {
        self.stats.messages += 1;

        let snapshot = match self.codec.decode(raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.stats.decode_errors += 1;
                log::warn!("Dropping message: {}", e);
                self.notify(&e);
                return Err(e);
            }
        };

        let report = self.reconciler.reconcile(&snapshot, &mut self.sink);
        self.stats.applied += 1;

        for failure in &report.failures {
            self.stats.sink_errors += 1;
            if let Some(hook) = self.error_hook.as_mut() {
                hook(&BridgeError::Sink(failure.error.clone()));
            }
        }

        Ok(report)
    }

    fn notify(&mut self, err: &BridgeError) {
        if let Some(hook) = self.error_hook.as_mut() {
            hook(err);
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn offset(&self) -> RenderOffset {
        self.offset
    }

    pub fn reconciler(&self) -> &SceneReconciler<S::Handle> {
        &self.reconciler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }
}
