//! Snapshot-to-scene reconciliation
//!
//! The one tricky part of the bridge: keeping display objects in step with
//! snapshots that carry no entity IDs.
//!
//! Paddle and ball are single-instance, so identity is trivial. Bricks are
//! anonymous; a held brick and an incoming brick are the same entity exactly
//! when their render-space `(x, y)` compare equal at full wire precision (see
//! [`PositionKey`]). Bricks never move in this game, so exact equality holds
//! for every brick that survives a frame.
//!
//! Population policy: bricks are created only on the first snapshot that
//! carries any. After that the set only shrinks. A position that shows up
//! later with no held counterpart is ignored (it points at a producer bug,
//! not at something the scene should repair).
//!
//! A sturdier variant would hand out synthetic IDs at first sight and match
//! by ID from then on. Positional matching is kept because the producer has
//! no IDs to offer and the scene has nothing else to key on.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use glam::Vec2;

use super::sink::{EntityKind, SceneOp, SceneSink};
use crate::error::SinkError;
use crate::snapshot::{BrickState, PositionKey, Snapshot};

/// Reconciler configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcilerConfig {
    /// Paddle y (render-space) when the snapshot only carries x
    pub paddle_y: f32,
    /// Size passed to the sink when creating the paddle
    pub paddle_size: Option<Vec2>,
    /// Size passed to the sink when creating the ball
    pub ball_size: Option<Vec2>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            paddle_y: crate::consts::DEFAULT_PADDLE_Y,
            paddle_size: None,
            ball_size: None,
        }
    }
}

/// A live display object owned by the reconciler
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleObject<H> {
    pub handle: H,
    pub pos: Vec2,
    pub size: Option<Vec2>,
}

/// One rejected sink operation
#[derive(Debug, Clone, PartialEq)]
pub struct OpFailure {
    pub kind: EntityKind,
    pub op: SceneOp,
    pub error: SinkError,
}

/// What one reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub created: usize,
    pub moved: usize,
    pub resized: usize,
    pub destroyed: usize,
    /// Incoming brick positions with no held counterpart (after first population)
    pub ignored: usize,
    pub failures: Vec<OpFailure>,
}

impl ReconcileReport {
    /// True if every requested operation succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Creates plus destroys: the structural changes to the scene
    pub fn structural_changes(&self) -> usize {
        self.created + self.destroyed
    }

    fn fail(&mut self, kind: EntityKind, op: SceneOp, error: SinkError) {
        log::warn!("{} {:?} failed: {}", kind.as_str(), op, error);
        self.failures.push(OpFailure { kind, op, error });
    }
}

#[derive(Debug)]
struct HeldBrick<H> {
    key: PositionKey,
    visual: VisibleObject<H>,
}

/// Owns every visible object and diffs snapshots against them
#[derive(Debug)]
pub struct SceneReconciler<H> {
    config: ReconcilerConfig,
    paddle: Option<VisibleObject<H>>,
    ball: Option<VisibleObject<H>>,
    /// Held bricks, in first-population order
    bricks: Vec<HeldBrick<H>>,
}

impl<H: std::fmt::Debug> SceneReconciler<H> {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            paddle: None,
            ball: None,
            bricks: Vec::new(),
        }
    }

    pub fn paddle(&self) -> Option<&VisibleObject<H>> {
        self.paddle.as_ref()
    }

    pub fn ball(&self) -> Option<&VisibleObject<H>> {
        self.ball.as_ref()
    }

    /// Held bricks, in first-population order
    pub fn bricks(&self) -> impl Iterator<Item = &VisibleObject<H>> + '_ {
        self.bricks.iter().map(|b| &b.visual)
    }

    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }

    /// Apply one snapshot. Entities the snapshot does not carry are left alone.
    pub fn reconcile<S>(&mut self, snapshot: &Snapshot, sink: &mut S) -> ReconcileReport
    where
        S: SceneSink<Handle = H>,
    {
        let mut report = ReconcileReport::default();

        if let Some(paddle) = snapshot.paddle {
            let pos = Vec2::new(paddle.x, self.config.paddle_y);
            upsert(
                &mut self.paddle,
                EntityKind::Paddle,
                pos,
                self.config.paddle_size,
                sink,
                &mut report,
            );
        }

        if let Some(pos) = snapshot.ball {
            upsert(
                &mut self.ball,
                EntityKind::Ball,
                pos,
                self.config.ball_size,
                sink,
                &mut report,
            );
        }

        if let Some(incoming) = &snapshot.bricks {
            if self.bricks.is_empty() {
                self.populate_bricks(incoming, sink, &mut report);
            } else {
                self.retain_bricks(incoming, sink, &mut report);
            }
        }

        log::debug!(
            "reconciled {:?}: +{} ~{} -{} ({} bricks held, {} failures)",
            snapshot.shape,
            report.created,
            report.moved + report.resized,
            report.destroyed,
            self.bricks.len(),
            report.failures.len()
        );

        report
    }

    /// First sight: create one visual per distinct incoming position
    fn populate_bricks<S>(
        &mut self,
        incoming: &[BrickState],
        sink: &mut S,
        report: &mut ReconcileReport,
    ) where
        S: SceneSink<Handle = H>,
    {
        let mut seen = HashSet::with_capacity(incoming.len());
        for brick in incoming {
            if !seen.insert(brick.key) {
                continue;
            }
            match sink.create_visual(EntityKind::Brick, brick.pos, Some(brick.size)) {
                Ok(handle) => {
                    self.bricks.push(HeldBrick {
                        key: brick.key,
                        visual: VisibleObject {
                            handle,
                            pos: brick.pos,
                            size: Some(brick.size),
                        },
                    });
                    report.created += 1;
                }
                Err(e) => report.fail(EntityKind::Brick, SceneOp::Create, e),
            }
        }
    }

    /// Steady state: keep held bricks whose position is still reported,
    /// destroy the rest. Never creates.
    fn retain_bricks<S>(
        &mut self,
        incoming: &[BrickState],
        sink: &mut S,
        report: &mut ReconcileReport,
    ) where
        S: SceneSink<Handle = H>,
    {
        // First occurrence of a position wins; the flag marks it as matched
        let mut wanted: HashMap<PositionKey, (Vec2, bool)> = HashMap::with_capacity(incoming.len());
        for brick in incoming {
            if let Entry::Vacant(slot) = wanted.entry(brick.key) {
                slot.insert((brick.size, false));
            }
        }

        let held = std::mem::take(&mut self.bricks);
        let mut survivors = Vec::with_capacity(held.len());

        for mut brick in held {
            match wanted.get_mut(&brick.key) {
                Some((size, matched)) => {
                    *matched = true;
                    if brick.visual.size != Some(*size) {
                        match sink.set_size(&brick.visual.handle, *size) {
                            Ok(()) => {
                                brick.visual.size = Some(*size);
                                report.resized += 1;
                            }
                            Err(e) => report.fail(EntityKind::Brick, SceneOp::SetSize, e),
                        }
                    }
                    survivors.push(brick);
                }
                None => match sink.destroy_visual(&brick.visual.handle) {
                    Ok(()) => report.destroyed += 1,
                    // Already gone on the backend side: nothing left to orphan
                    Err(e @ SinkError::StaleHandle(_)) => {
                        report.fail(EntityKind::Brick, SceneOp::Destroy, e)
                    }
                    // Still displayed: hold on to it so the next snapshot retries
                    Err(e) => {
                        report.fail(EntityKind::Brick, SceneOp::Destroy, e);
                        survivors.push(brick);
                    }
                },
            }
        }

        report.ignored = wanted.values().filter(|(_, matched)| !matched).count();
        if report.ignored > 0 {
            log::debug!("ignoring {} unmatched brick positions", report.ignored);
        }

        self.bricks = survivors;
    }
}

/// Create a single-instance visual, or move the existing one
fn upsert<S: SceneSink>(
    slot: &mut Option<VisibleObject<S::Handle>>,
    kind: EntityKind,
    pos: Vec2,
    size: Option<Vec2>,
    sink: &mut S,
    report: &mut ReconcileReport,
) {
    if let Some(obj) = slot.as_mut() {
        match sink.set_position(&obj.handle, pos) {
            Ok(()) => {
                obj.pos = pos;
                report.moved += 1;
            }
            Err(e) => report.fail(kind, SceneOp::SetPosition, e),
        }
        return;
    }

    match sink.create_visual(kind, pos, size) {
        Ok(handle) => {
            *slot = Some(VisibleObject { handle, pos, size });
            report.created += 1;
        }
        Err(e) => report.fail(kind, SceneOp::Create, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::recording::{RecordingSink, SinkCall};
    use crate::snapshot::{PaddleState, WireShape};
    use glam::DVec2;

    fn bricks(positions: &[(f32, f32)]) -> Snapshot {
        Snapshot {
            shape: WireShape::G3,
            paddle: None,
            ball: None,
            bricks: Some(
                positions
                    .iter()
                    .map(|&(x, y)| BrickState::new(x, y, 10.0, 5.0))
                    .collect(),
            ),
        }
    }

    fn held_positions(r: &SceneReconciler<u32>) -> Vec<(f32, f32)> {
        r.bricks().map(|b| (b.pos.x, b.pos.y)).collect()
    }

    #[test]
    fn test_first_snapshot_creates_in_order() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());

        let report = r.reconcile(&bricks(&[(0.0, 0.0), (20.0, 0.0), (40.0, 0.0)]), &mut sink);
        assert_eq!(report.created, 3);
        assert_eq!(held_positions(&r), vec![(0.0, 0.0), (20.0, 0.0), (40.0, 0.0)]);
        assert_eq!(sink.live_count(EntityKind::Brick), 3);
    }

    #[test]
    fn test_removed_brick_is_destroyed_and_order_kept() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 0.0), (20.0, 0.0), (40.0, 0.0)]), &mut sink);
        sink.clear_calls();

        // Incoming order is irrelevant to held order
        let report = r.reconcile(&bricks(&[(40.0, 0.0), (0.0, 0.0)]), &mut sink);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.created, 0);
        assert_eq!(held_positions(&r), vec![(0.0, 0.0), (40.0, 0.0)]);
        assert_eq!(sink.calls().len(), 1);
        assert!(matches!(sink.calls()[0], SinkCall::Destroy { .. }));
    }

    #[test]
    fn test_new_positions_after_first_population_are_ignored() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 0.0)]), &mut sink);

        let report = r.reconcile(&bricks(&[(0.0, 0.0), (99.0, 99.0)]), &mut sink);
        assert_eq!(report.created, 0);
        assert_eq!(report.ignored, 1);
        assert_eq!(r.brick_count(), 1);
    }

    #[test]
    fn test_positional_match_is_exact() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(10.0, 10.0)]), &mut sink);

        let report = r.reconcile(&bricks(&[(10.0 + f32::EPSILON * 16.0, 10.0)]), &mut sink);
        assert_eq!(report.destroyed, 1);
        assert_eq!(r.brick_count(), 0);
    }

    #[test]
    fn test_match_uses_full_precision() {
        let exact = |x: f64| Snapshot {
            shape: WireShape::G3,
            bricks: Some(vec![BrickState::at(DVec2::new(x, 0.0), Vec2::new(10.0, 5.0))]),
            ..Default::default()
        };
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&exact(1.0), &mut sink);

        // Both draw at x = 1.0, but they are different positions
        let report = r.reconcile(&exact(1.000_000_01), &mut sink);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.ignored, 1);
        assert_eq!(r.brick_count(), 0);
    }

    #[test]
    fn test_bricks_sharing_an_f32_position_stay_distinct() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        let size = Vec2::new(10.0, 5.0);
        let snap = Snapshot {
            shape: WireShape::G3,
            bricks: Some(vec![
                BrickState::at(DVec2::new(16_777_216.0, 0.0), size),
                BrickState::at(DVec2::new(16_777_217.0, 0.0), size),
            ]),
            ..Default::default()
        };

        let report = r.reconcile(&snap, &mut sink);
        assert_eq!(report.created, 2);
        assert_eq!(sink.live_count(EntityKind::Brick), 2);

        // Dropping one destroys exactly that one
        let mut rest = snap.clone();
        rest.bricks.as_mut().unwrap().remove(0);
        let report = r.reconcile(&rest, &mut sink);
        assert_eq!(report.destroyed, 1);
        assert_eq!(r.brick_count(), 1);
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 5.0)]), &mut sink);

        let report = r.reconcile(&bricks(&[(-0.0, 5.0)]), &mut sink);
        assert_eq!(report.destroyed, 0);
        assert_eq!(r.brick_count(), 1);
    }

    #[test]
    fn test_duplicate_incoming_positions_collapse() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        let mut snap = bricks(&[(0.0, 0.0)]);
        snap.bricks
            .as_mut()
            .unwrap()
            .push(BrickState::new(0.0, 0.0, 30.0, 30.0));

        let report = r.reconcile(&snap, &mut sink);
        assert_eq!(report.created, 1);
        assert_eq!(r.bricks().next().unwrap().size, Some(Vec2::new(10.0, 5.0)));

        // Steady state: first occurrence's size wins, so no resize
        let report = r.reconcile(&snap, &mut sink);
        assert_eq!(report.resized, 0);
    }

    #[test]
    fn test_size_change_resizes_in_place() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 0.0)]), &mut sink);

        let mut snap = bricks(&[]);
        snap.bricks = Some(vec![BrickState::new(0.0, 0.0, 12.0, 6.0)]);
        let report = r.reconcile(&snap, &mut sink);
        assert_eq!(report.resized, 1);
        assert_eq!(report.structural_changes(), 0);
        assert_eq!(r.bricks().next().unwrap().size, Some(Vec2::new(12.0, 6.0)));
    }

    #[test]
    fn test_absent_bricks_leave_scene_untouched() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 0.0)]), &mut sink);
        sink.clear_calls();

        let snap = Snapshot {
            shape: WireShape::G1,
            paddle: Some(PaddleState { x: 5.0 }),
            ..Default::default()
        };
        r.reconcile(&snap, &mut sink);
        assert_eq!(r.brick_count(), 1);
        assert!(sink
            .calls()
            .iter()
            .all(|c| !matches!(c, SinkCall::Destroy { .. })));
    }

    #[test]
    fn test_empty_brick_list_clears_held_bricks() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 0.0), (1.0, 0.0)]), &mut sink);

        let report = r.reconcile(&bricks(&[]), &mut sink);
        assert_eq!(report.destroyed, 2);
        assert_eq!(sink.live_count(EntityKind::Brick), 0);
    }

    #[test]
    fn test_paddle_created_then_moved() {
        let mut sink = RecordingSink::new();
        let config = ReconcilerConfig {
            paddle_y: 550.0,
            paddle_size: Some(Vec2::new(80.0, 12.0)),
            ball_size: None,
        };
        let mut r = SceneReconciler::new(config);
        let snap = |x| Snapshot {
            shape: WireShape::G1,
            paddle: Some(PaddleState { x }),
            ..Default::default()
        };

        let report = r.reconcile(&snap(100.0), &mut sink);
        assert_eq!(report.created, 1);
        assert_eq!(
            sink.calls()[0],
            SinkCall::Create {
                handle: 0,
                kind: EntityKind::Paddle,
                pos: Vec2::new(100.0, 550.0),
                size: Some(Vec2::new(80.0, 12.0)),
            }
        );

        let report = r.reconcile(&snap(120.0), &mut sink);
        assert_eq!(report.created, 0);
        assert_eq!(report.moved, 1);
        assert_eq!(r.paddle().unwrap().pos, Vec2::new(120.0, 550.0));
    }

    #[test]
    fn test_failed_create_is_reported_and_batch_continues() {
        let mut sink = RecordingSink::new();
        sink.fail_nth_create(1);
        let mut r = SceneReconciler::new(ReconcilerConfig::default());

        let report = r.reconcile(&bricks(&[(0.0, 0.0), (20.0, 0.0), (40.0, 0.0)]), &mut sink);
        assert_eq!(report.created, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].op, SceneOp::Create);
        assert_eq!(held_positions(&r), vec![(0.0, 0.0), (40.0, 0.0)]);
    }

    #[test]
    fn test_failed_destroy_keeps_brick_for_retry() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 0.0), (20.0, 0.0)]), &mut sink);

        sink.fail_destroys(true);
        let report = r.reconcile(&bricks(&[(0.0, 0.0)]), &mut sink);
        assert!(!report.is_clean());
        assert_eq!(r.brick_count(), 2);

        sink.fail_destroys(false);
        let report = r.reconcile(&bricks(&[(0.0, 0.0)]), &mut sink);
        assert!(report.is_clean());
        assert_eq!(report.destroyed, 1);
        assert_eq!(r.brick_count(), 1);
    }

    #[test]
    fn test_destroy_of_vanished_visual_drops_brick() {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&bricks(&[(0.0, 0.0), (20.0, 0.0)]), &mut sink);

        // Backend dropped the visual on its own
        let gone = r.bricks().nth(1).unwrap().handle;
        sink.destroy_visual(&gone).unwrap();

        let report = r.reconcile(&bricks(&[(0.0, 0.0)]), &mut sink);
        assert_eq!(report.destroyed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].op, SceneOp::Destroy);
        assert_eq!(report.failures[0].error, SinkError::StaleHandle(gone.to_string()));
        assert_eq!(held_positions(&r), vec![(0.0, 0.0)]);

        // Not retried
        let report = r.reconcile(&bricks(&[(0.0, 0.0)]), &mut sink);
        assert!(report.is_clean());
    }
}
