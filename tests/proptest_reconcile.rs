//! Property tests for positional reconciliation.
//!
//! Random brick layouts and random shrinking sequences, checked against the
//! invariants the scene must keep: re-applying is a no-op, held bricks map
//! one-to-one onto live visuals, and the brick set only ever shrinks.

use std::collections::BTreeSet;

use breakout_bridge::scene::{EntityKind, ReconcilerConfig, RecordingSink, SceneReconciler};
use breakout_bridge::snapshot::{BrickState, PaddleState, Snapshot, WireShape};
use glam::Vec2;
use proptest::prelude::*;

type Cell = (u8, u8);

fn cell_pos((cx, cy): Cell) -> Vec2 {
    Vec2::new(cx as f32 * 64.0, cy as f32 * 24.0)
}

fn snapshot(cells: &[Cell], paddle_x: f32) -> Snapshot {
    Snapshot {
        shape: WireShape::G3,
        paddle: Some(PaddleState { x: paddle_x }),
        ball: Some(Vec2::new(paddle_x, 100.0)),
        bricks: Some(
            cells
                .iter()
                .map(|&c| {
                    let p = cell_pos(c);
                    BrickState::new(p.x, p.y, 60.0, 20.0)
                })
                .collect(),
        ),
    }
}

fn held(r: &SceneReconciler<u32>) -> BTreeSet<(u32, u32)> {
    r.bricks()
        .map(|b| (b.pos.x.to_bits(), b.pos.y.to_bits()))
        .collect()
}

fn live(sink: &RecordingSink) -> BTreeSet<(u32, u32)> {
    sink.live_positions(EntityKind::Brick)
        .iter()
        .map(|p| (p.x.to_bits(), p.y.to_bits()))
        .collect()
}

fn keys(cells: &[Cell]) -> BTreeSet<(u32, u32)> {
    cells
        .iter()
        .map(|&c| {
            let p = cell_pos(c);
            (p.x.to_bits(), p.y.to_bits())
        })
        .collect()
}

fn cells_strategy() -> impl Strategy<Value = Vec<Cell>> {
    prop::collection::vec((0u8..12, 0u8..8), 1..40)
}

proptest! {
    #[test]
    fn test_reapply_is_a_noop(cells in cells_strategy(), x in -300.0f32..300.0) {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        let snap = snapshot(&cells, x);

        r.reconcile(&snap, &mut sink);
        let before = live(&sink);

        let report = r.reconcile(&snap, &mut sink);
        prop_assert_eq!(report.structural_changes(), 0);
        prop_assert_eq!(report.ignored, 0);
        prop_assert_eq!(report.resized, 0);
        prop_assert_eq!(live(&sink), before);
        prop_assert_eq!(sink.live_count(EntityKind::Paddle), 1);
        prop_assert_eq!(sink.live_count(EntityKind::Ball), 1);
    }

    #[test]
    fn test_held_bricks_match_live_visuals(cells in cells_strategy()) {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&snapshot(&cells, 0.0), &mut sink);

        // Duplicated positions collapse to one visual
        prop_assert_eq!(held(&r), keys(&cells));
        prop_assert_eq!(r.brick_count(), keys(&cells).len());
        prop_assert_eq!(live(&sink), held(&r));
        prop_assert_eq!(sink.live_count(EntityKind::Brick), r.brick_count());
    }

    #[test]
    fn test_bricks_only_shrink(
        cells in cells_strategy(),
        rounds in prop::collection::vec(
            (
                prop::collection::vec(any::<bool>(), 40),
                prop::collection::vec((0u8..12, 8u8..10), 0..3),
            ),
            1..8,
        ),
    ) {
        let mut sink = RecordingSink::new();
        let mut r = SceneReconciler::new(ReconcilerConfig::default());
        r.reconcile(&snapshot(&cells, 0.0), &mut sink);
        let creates_after_first = sink.count_creates();

        for (mask, strays) in rounds {
            let before = held(&r);
            if before.is_empty() {
                break;
            }

            // Random subset of the first layout, plus positions never seen
            let mut incoming: Vec<Cell> = cells
                .iter()
                .zip(mask.iter())
                .filter(|(_, keep)| **keep)
                .map(|(c, _)| *c)
                .collect();
            incoming.extend(strays.iter().copied());

            let report = r.reconcile(&snapshot(&incoming, 0.0), &mut sink);

            let expected: BTreeSet<_> = before.intersection(&keys(&incoming)).copied().collect();
            prop_assert_eq!(held(&r), expected);
            prop_assert_eq!(report.created, 0);
            prop_assert_eq!(report.destroyed, before.len() - r.brick_count());
            prop_assert_eq!(live(&sink), held(&r));
        }

        // Paddle and ball were created on the first pass only
        prop_assert_eq!(sink.count_creates(), creates_after_first);
    }
}
