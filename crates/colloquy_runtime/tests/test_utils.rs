//! Shared test utilities for `colloquy_runtime` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities: not all items used in every test binary"
)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use colloquy_core::{Clock, ClockProvider, MockClock};
use colloquy_graph::graph::Graph;
use colloquy_graph::id::{ManagerId, ParticipantId, WorldId};
use colloquy_graph::node::{NodeId, NodeKind};
use colloquy_graph::row::{DialogueRow, DialogueTable, RowData, RowDurationMode, RowHandle};
use colloquy_runtime::context::DialogueContext;
use colloquy_runtime::hooks::{DialogueEvent, DialogueHooks, EventKind};
use colloquy_runtime::manager::DialogueManager;
use colloquy_runtime::participant::{Participant, SharedParticipant};
use colloquy_runtime::ui::{DialogueWidget, WidgetCommand, WidgetError};
use parking_lot::Mutex;

/// Seconds each line of the test table stays on screen.
pub const LINE_SECONDS: u64 = 2;

// ═══════════════════════════════════════════════════════════════════════════════
// ROWS
// ═══════════════════════════════════════════════════════════════════════════════

fn line(text: &str) -> RowData {
    RowData::new(text).with_duration(RowDurationMode::Duration, LINE_SECONDS as f32, 0.0)
}

/// A table with a two-line `greeting`, one-line `trade` and `farewell`
/// answers, and an empty `broken` row.
pub fn smithy_table() -> Arc<DialogueTable> {
    let table = DialogueTable::new("smithy")
        .with_row(
            "greeting",
            DialogueRow::new("Smith", "Greeting")
                .with_data(line("Need something forged?"))
                .with_data(line("Steel is cheap this week.")),
        )
        .with_row("trade", DialogueRow::new("Player", "Trade").with_data(line("Show me your wares.")))
        .with_row("farewell", DialogueRow::new("Player", "Farewell").with_data(line("Maybe later.")))
        .with_row("broken", DialogueRow::new("Smith", "Broken"));
    Arc::new(table)
}

pub fn row(name: &str) -> RowHandle {
    RowHandle::new(smithy_table(), name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// GRAPHS
// ═══════════════════════════════════════════════════════════════════════════════

/// Nodes of [`smithy_graph`].
#[derive(Debug, Clone, Copy)]
pub struct SmithyNodes {
    pub start: NodeId,
    pub greeting: NodeId,
    pub trade: NodeId,
    pub farewell: NodeId,
    pub trade_end: NodeId,
    pub farewell_end: NodeId,
}

/// Start -> Lead(greeting) -> [Answer(trade), Answer(farewell)], each
/// answer -> AutoComplete.
pub fn smithy_graph() -> (Graph, SmithyNodes) {
    let mut graph = Graph::new("smithy");
    let start = graph.start_node().expect("start node");
    let greeting = graph.add_node(NodeKind::lead(row("greeting")));
    let trade = graph.add_node(NodeKind::answer(row("trade")));
    let farewell = graph.add_node(NodeKind::answer(row("farewell")));
    let trade_end = graph.add_node(NodeKind::AutoComplete);
    let farewell_end = graph.add_node(NodeKind::AutoComplete);

    graph.connect(start, greeting).expect("start -> greeting");
    graph.connect(greeting, trade).expect("greeting -> trade");
    graph.connect(greeting, farewell).expect("greeting -> farewell");
    graph.connect(trade, trade_end).expect("trade -> end");
    graph.connect(farewell, farewell_end).expect("farewell -> end");

    (
        graph,
        SmithyNodes {
            start,
            greeting,
            trade,
            farewell,
            trade_end,
            farewell_end,
        },
    )
}

/// Start -> Lead(greeting), nothing after it.
pub fn single_lead_graph(row_name: &str) -> (Graph, NodeId) {
    let mut graph = Graph::new("single");
    let start = graph.start_node().expect("start node");
    let lead = graph.add_node(NodeKind::lead(row(row_name)));
    graph.connect(start, lead).expect("start -> lead");
    (graph, lead)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARTICIPANTS AND MANAGERS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn player() -> SharedParticipant {
    Participant::new(ParticipantId::new("player")).shared()
}

pub fn npc(graph: Graph) -> SharedParticipant {
    Participant::new(ParticipantId::new("smith"))
        .with_graph(graph)
        .shared()
}

/// A mock clock and the [`Clock`] reading it.
pub fn mock_clock() -> (Arc<MockClock>, Clock) {
    let mock = Arc::new(MockClock::new(Instant::now()));
    let provider: Arc<dyn ClockProvider> = Arc::<MockClock>::clone(&mock);
    (mock, Clock::with_provider(provider))
}

pub fn line_duration() -> Duration {
    Duration::from_secs(LINE_SECONDS)
}

/// A manager bound to a world, driven by a mock clock and a recording widget.
pub struct Harness {
    pub manager: DialogueManager,
    pub clock: Arc<MockClock>,
    pub widget: WidgetLog,
    pub events: EventLog,
}

impl Harness {
    pub fn new() -> Self {
        let (clock, reader) = mock_clock();
        let widget = WidgetLog::default();
        let manager = DialogueManager::new(ManagerId::new("smithy"))
            .with_world(WorldId::new("village"))
            .with_clock(reader)
            .with_widget(Box::new(widget.widget()));
        let events = EventLog::attach(manager.hooks());
        Self {
            manager,
            clock,
            widget,
            events,
        }
    }

    /// Advances the clock by `duration` and polls the manager once.
    pub fn tick(&mut self, duration: Duration) {
        self.clock.advance(duration);
        self.manager.update().expect("update should succeed");
    }

    /// Lets one line of the test table play out.
    pub fn finish_line(&mut self) {
        self.tick(line_duration());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Commands received by a [`RecordingWidget`].
#[derive(Debug, Clone, Default)]
pub struct WidgetLog {
    commands: Arc<Mutex<Vec<WidgetCommand>>>,
    refused: Arc<Mutex<Vec<WidgetCommand>>>,
}

impl WidgetLog {
    pub fn widget(&self) -> RecordingWidget {
        RecordingWidget { log: self.clone() }
    }

    /// Makes the widget refuse `command` from now on.
    pub fn refuse(&self, command: WidgetCommand) {
        self.refused.lock().push(command);
    }

    pub fn commands(&self) -> Vec<WidgetCommand> {
        self.commands.lock().clone()
    }

    pub fn count(&self, command: WidgetCommand) -> usize {
        self.commands.lock().iter().filter(|seen| **seen == command).count()
    }
}

/// A widget that records every command it accepts.
#[derive(Debug)]
pub struct RecordingWidget {
    log: WidgetLog,
}

impl DialogueWidget for RecordingWidget {
    fn refresh(
        &mut self,
        command: WidgetCommand,
        _context: Option<&DialogueContext>,
    ) -> Result<(), WidgetError> {
        if self.log.refused.lock().contains(&command) {
            return Err(WidgetError::Refused {
                command,
                reason: "test refusal".to_string(),
            });
        }
        self.log.commands.lock().push(command);
        Ok(())
    }
}

/// Events broadcast by a manager, in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    kinds: Arc<Mutex<Vec<EventKind>>>,
    failures: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn attach(hooks: &DialogueHooks) -> Self {
        let log = Self::default();
        let recorder = log.clone();
        hooks
            .register_observer_all(&EventKind::ALL, "event_log", move |event: &DialogueEvent<'_>| {
                recorder.kinds.lock().push(event.kind());
                if let DialogueEvent::Failed { reason } = event {
                    recorder.failures.lock().push((*reason).to_string());
                }
            })
            .expect("event log registration");
        log
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.kinds.lock().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds.lock().iter().filter(|seen| **seen == kind).count()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }

    /// Kinds recorded so far, without `UiChanged` and `StateChanged`.
    pub fn session_kinds(&self) -> Vec<EventKind> {
        self.kinds
            .lock()
            .iter()
            .copied()
            .filter(|kind| !matches!(kind, EventKind::UiChanged | EventKind::StateChanged))
            .collect()
    }

    pub fn clear(&self) {
        self.kinds.lock().clear();
        self.failures.lock().clear();
    }
}
