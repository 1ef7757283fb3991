//! Single-threaded board event loop.
//!
//! Pointer events and sync completions are both dispatched on one loop.
//! A commit ticket spawns its sync as a task (fire-and-observe) so pointer
//! input keeps flowing while the request is in flight; the settled outcome
//! re-enters the loop and is applied through [`DragController::settle`].

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::board::BoardStateStore;
use crate::drag::{
    CommitTicket, DragController, FloatingControl, FloatingEvent, FloatingGesture, PointerEvent,
    SettleReport,
};
use crate::geometry::{Position, Size};
use crate::sync::{PositionSync, SyncOutcome};

/// One input to the loop: board-item pointer input or floating control input.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoardInput {
    Board(PointerEvent),
    Floating(FloatingEvent),
}

impl From<PointerEvent> for BoardInput {
    fn from(event: PointerEvent) -> Self {
        BoardInput::Board(event)
    }
}

impl From<FloatingEvent> for BoardInput {
    fn from(event: FloatingEvent) -> Self {
        BoardInput::Floating(event)
    }
}

/// State handed back when the loop ends.
#[derive(Debug)]
pub struct RuntimeSummary {
    pub store: BoardStateStore,
    pub reports: Vec<SettleReport>,
    pub syncs_issued: usize,
    pub gestures: Vec<FloatingGesture>,
    /// Final floating control position, when one was attached.
    pub floating: Option<Position>,
}

pub struct BoardRuntime {
    store: BoardStateStore,
    controller: DragController,
    sync: Arc<dyn PositionSync>,
    floating: Option<FloatingControl>,
    notices: Option<mpsc::UnboundedSender<SettleReport>>,
}

impl BoardRuntime {
    pub fn new(store: BoardStateStore, controller: DragController, sync: Arc<dyn PositionSync>) -> Self {
        Self {
            store,
            controller,
            sync,
            floating: None,
            notices: None,
        }
    }

    pub fn with_floating(mut self, control: FloatingControl) -> Self {
        self.floating = Some(control);
        self
    }

    /// Forward every settle report to `tx` as it happens.
    pub fn with_notices(mut self, tx: mpsc::UnboundedSender<SettleReport>) -> Self {
        self.notices = Some(tx);
        self
    }

    pub fn store(&self) -> &BoardStateStore {
        &self.store
    }

    /// Run until `input` closes and every in-flight sync has settled.
    ///
    /// A session still open when input closes is abandoned: the item returns
    /// to its origin and nothing is synced.
    pub async fn run(mut self, mut input: mpsc::Receiver<BoardInput>) -> RuntimeSummary {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(CommitTicket, SyncOutcome)>();
        let mut input_open = true;
        let mut in_flight = 0usize;
        let mut syncs_issued = 0usize;
        let mut reports = Vec::new();
        let mut gestures = Vec::new();

        while input_open || in_flight > 0 {
            tokio::select! {
                event = input.recv(), if input_open => match event {
                    Some(BoardInput::Board(event)) => {
                        if let PointerEvent::Resize { width, height } = event {
                            if let Some(floating) = self.floating.as_mut() {
                                floating.resize_viewport(Size::new(width, height));
                            }
                        }
                        if let Some(ticket) = self.controller.handle(&mut self.store, event) {
                            self.spawn_sync(ticket, done_tx.clone());
                            in_flight += 1;
                            syncs_issued += 1;
                        }
                    }
                    Some(BoardInput::Floating(event)) => match self.floating.as_mut() {
                        Some(floating) => {
                            if let Some(gesture) = floating.handle(event) {
                                info!(?gesture, "floating control gesture");
                                gestures.push(gesture);
                            }
                        }
                        None => debug!(?event, "no floating control attached, event dropped"),
                    },
                    None => {
                        debug!("pointer input closed");
                        input_open = false;
                        self.controller.abandon(&mut self.store);
                    }
                },
                Some((ticket, outcome)) = done_rx.recv(), if in_flight > 0 => {
                    in_flight -= 1;
                    let report = self.controller.settle(&mut self.store, &ticket, &outcome);
                    info!(notice = %report.notice(), "sync settled");
                    if let Some(tx) = &self.notices {
                        if tx.send(report.clone()).is_err() {
                            debug!("notice receiver dropped");
                        }
                    }
                    reports.push(report);
                }
            }
        }

        RuntimeSummary {
            floating: self.floating.as_ref().map(FloatingControl::position),
            store: self.store,
            reports,
            syncs_issued,
            gestures,
        }
    }

    fn spawn_sync(&self, ticket: CommitTicket, done: mpsc::UnboundedSender<(CommitTicket, SyncOutcome)>) {
        info!(session = %ticket.session, item = %ticket.item_id, target = %ticket.target, "position sync issued");
        let sync = Arc::clone(&self.sync);
        tokio::spawn(async move {
            let outcome = sync
                .update_position(
                    ticket.item_id,
                    f64::from(ticket.target.x),
                    f64::from(ticket.target.y),
                )
                .await;
            let _ = done.send((ticket, outcome));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::board::{ItemId, MovableItem};
    use crate::config::FloatingSection;
    use crate::drag::NullSurface;
    use crate::errors::SyncError;
    use crate::geometry::{Position, Size};

    const ITEM: ItemId = ItemId(1);

    /// Answers calls from a queue of outcomes, `Synced` when exhausted.
    #[derive(Default)]
    struct ScriptedSync {
        outcomes: Mutex<VecDeque<SyncOutcome>>,
        calls: Mutex<Vec<(ItemId, f64, f64)>>,
    }

    #[async_trait]
    impl PositionSync for ScriptedSync {
        async fn update_position(&self, item_id: ItemId, x: f64, y: f64) -> SyncOutcome {
            self.calls.lock().unwrap().push((item_id, x, y));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(SyncOutcome::Synced)
        }
    }

    /// Each call waits for its outcome on a oneshot, in call order.
    struct GatedSync {
        gates: Mutex<VecDeque<oneshot::Receiver<SyncOutcome>>>,
    }

    #[async_trait]
    impl PositionSync for GatedSync {
        async fn update_position(&self, _item_id: ItemId, _x: f64, _y: f64) -> SyncOutcome {
            let gate = self.gates.lock().unwrap().pop_front();
            match gate {
                Some(rx) => rx.await.unwrap_or(SyncOutcome::Failed(SyncError::network("gate dropped"))),
                None => SyncOutcome::Synced,
            }
        }
    }

    fn runtime(sync: Arc<dyn PositionSync>) -> BoardRuntime {
        let store = BoardStateStore::from_items([MovableItem::new(
            ITEM,
            Position::new(100, 100),
            Size::new(256, 176),
        )]);
        let controller = DragController::for_store(&store, Size::new(1000, 800), 30, Arc::new(NullSurface));
        BoardRuntime::new(store, controller, sync)
    }

    fn drag_events(from: (f64, f64), to: (f64, f64)) -> Vec<PointerEvent> {
        vec![
            PointerEvent::Down { item: ITEM, x: from.0, y: from.1 },
            PointerEvent::Move { x: to.0, y: to.1, buttons: 1 },
            PointerEvent::Up,
        ]
    }

    async fn feed<E: Into<BoardInput>>(events: Vec<E>) -> mpsc::Receiver<BoardInput> {
        let (tx, rx) = mpsc::channel(64);
        for event in events {
            tx.send(event.into()).await.unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn test_drag_syncs_target_position() {
        let sync = Arc::new(ScriptedSync::default());
        let rx = feed(drag_events((110.0, 110.0), (300.0, 300.0))).await;

        let summary = runtime(sync.clone()).run(rx).await;

        assert_eq!(summary.syncs_issued, 1);
        assert_eq!(*sync.calls.lock().unwrap(), vec![(ITEM, 290.0, 290.0)]);
        assert_eq!(summary.store.position_of(ITEM), Some(Position::new(290, 290)));
        assert!(matches!(summary.reports[0], SettleReport::Committed { .. }));
    }

    #[tokio::test]
    async fn test_server_error_snaps_back() {
        let sync = Arc::new(ScriptedSync::default());
        sync.outcomes
            .lock()
            .unwrap()
            .push_back(SyncOutcome::Failed(SyncError::server("HTTP 500: boom")));
        let rx = feed(drag_events((110.0, 110.0), (300.0, 300.0))).await;

        let summary = runtime(sync).run(rx).await;

        assert_eq!(summary.store.position_of(ITEM), Some(Position::new(100, 100)));
        assert!(matches!(summary.reports[0], SettleReport::RolledBack { .. }));
    }

    #[tokio::test]
    async fn test_unchanged_drag_makes_no_call() {
        let sync = Arc::new(ScriptedSync::default());
        let rx = feed(drag_events((110.0, 110.0), (110.0, 110.0))).await;

        let summary = runtime(sync.clone()).run(rx).await;

        assert_eq!(summary.syncs_issued, 0);
        assert!(sync.calls.lock().unwrap().is_empty());
        assert!(summary.reports.is_empty());
    }

    #[tokio::test]
    async fn test_open_session_abandoned_when_input_closes() {
        let sync = Arc::new(ScriptedSync::default());
        let rx = feed(vec![
            PointerEvent::Down { item: ITEM, x: 110.0, y: 110.0 },
            PointerEvent::Move { x: 400.0, y: 400.0, buttons: 1 },
        ])
        .await;

        let summary = runtime(sync.clone()).run(rx).await;

        assert_eq!(summary.syncs_issued, 0);
        assert_eq!(summary.store.position_of(ITEM), Some(Position::new(100, 100)));
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_undo_newer_drag() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let sync = Arc::new(GatedSync {
            gates: Mutex::new(VecDeque::from([first_rx, second_rx])),
        });
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();

        let mut events = drag_events((110.0, 110.0), (300.0, 300.0));
        events.extend(drag_events((300.0, 300.0), (500.0, 400.0)));
        let rx = feed(events).await;
        let handle = tokio::spawn(runtime(sync).with_notices(notice_tx).run(rx));

        second_tx.send(SyncOutcome::Synced).unwrap();
        let first_notice = notice_rx.recv().await.unwrap();
        assert!(matches!(first_notice, SettleReport::Committed { position, .. } if position == Position::new(490, 390)));

        first_tx
            .send(SyncOutcome::Failed(SyncError::network("could not connect")))
            .unwrap();
        let summary = handle.await.unwrap();

        assert_eq!(summary.syncs_issued, 2);
        assert!(matches!(summary.reports[1], SettleReport::Superseded { .. }));
        assert_eq!(summary.store.position_of(ITEM), Some(Position::new(490, 390)));
    }

    #[tokio::test]
    async fn test_floating_events_reach_floating_control() {
        let sync = Arc::new(ScriptedSync::default());
        let floating = FloatingControl::from_config(&FloatingSection::default(), Size::new(1000, 800), Arc::new(NullSurface));
        let start = floating.position();
        let rx = feed(vec![
            BoardInput::Floating(FloatingEvent::FloatingDown { x: 900.0, y: 700.0 }),
            BoardInput::Floating(FloatingEvent::FloatingUp { x: 902.0, y: 701.0 }),
            BoardInput::Floating(FloatingEvent::FloatingDown { x: 900.0, y: 700.0 }),
            BoardInput::Floating(FloatingEvent::FloatingMove { x: 500.0, y: 400.0, buttons: 1 }),
            BoardInput::Floating(FloatingEvent::FloatingUp { x: 500.0, y: 400.0 }),
        ])
        .await;

        let summary = runtime(sync.clone()).with_floating(floating).run(rx).await;

        let moved_to = Position::new(start.x - 400, start.y - 300);
        assert_eq!(
            summary.gestures,
            vec![
                FloatingGesture::Click,
                FloatingGesture::Moved { from: start, to: moved_to },
            ]
        );
        assert_eq!(summary.floating, Some(moved_to));
        assert_eq!(summary.syncs_issued, 0);
        assert!(sync.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_notice_receiver_does_not_stop_loop() {
        let sync = Arc::new(ScriptedSync::default());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        drop(notice_rx);
        let rx = feed(drag_events((110.0, 110.0), (300.0, 300.0))).await;

        let summary = runtime(sync).with_notices(notice_tx).run(rx).await;

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.store.position_of(ITEM), Some(Position::new(290, 290)));
    }

    #[test]
    fn test_board_input_parses_both_event_kinds() {
        let events: Vec<BoardInput> = serde_json::from_str(
            r#"[{"type": "down", "item": 1, "x": 5, "y": 6}, {"type": "floating_up", "x": 1, "y": 2}]"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                BoardInput::Board(PointerEvent::Down { item: ITEM, x: 5.0, y: 6.0 }),
                BoardInput::Floating(FloatingEvent::FloatingUp { x: 1.0, y: 2.0 }),
            ]
        );
    }
}
