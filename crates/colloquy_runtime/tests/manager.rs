//! Tests for the dialogue manager state machine.
//!
//! These tests drive full conversations with a mock clock and verify:
//! - Start preconditions and the failures they broadcast
//! - Event and widget command order across rows, options and close
//! - Row and delay timers
//! - Decorators acting on participants across sessions

mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use colloquy_graph::decorator::DecoratorHandle;
use colloquy_graph::decorator::builtin::{Condition, OnlyFirstTime, SaveNodeAsStart, SendCommand};
use colloquy_graph::graph::Graph;
use colloquy_graph::id::{ManagerId, ParticipantId};
use colloquy_graph::node::NodeKind;
use colloquy_graph::row::{DialogueRow, DialogueTable, RowData, RowDurationMode, RowHandle};
use colloquy_runtime::hooks::EventKind;
use colloquy_runtime::manager::{DialogueError, DialogueManager, ManagerState};
use colloquy_runtime::participant::{Participant, ParticipantState, SharedParticipant};
use colloquy_runtime::ui::WidgetCommand;
use test_utils::{Harness, SmithyNodes, line_duration, npc, player, row, single_lead_graph, smithy_graph};

fn guid_of(npc: &SharedParticipant, node: colloquy_graph::node::NodeId) -> colloquy_graph::id::Guid {
    npc.read()
        .graph()
        .and_then(|graph| graph.node(node))
        .map(|node| node.guid.clone())
        .expect("node exists")
}

fn start_smithy(harness: &mut Harness) -> (SharedParticipant, SharedParticipant, SmithyNodes) {
    let (graph, nodes) = smithy_graph();
    let smith = npc(graph);
    let player = player();
    harness
        .manager
        .request_start_dialogue(&player, &[smith.clone()])
        .expect("dialogue should start");
    (player, smith, nodes)
}

// ═══════════════════════════════════════════════════════════════════════════════
// START PRECONDITIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn participant_without_graph_fails_to_start() {
    let mut harness = Harness::new();
    let player = player();
    let smith = Participant::new(ParticipantId::new("smith")).shared();

    assert!(!harness.manager.can_start_dialogue(&smith));
    let result = harness.manager.request_start_dialogue(&player, &[smith.clone()]);

    assert!(matches!(result, Err(DialogueError::MissingGraph(_))));
    assert_eq!(harness.events.count(EventKind::Failed), 1);
    assert_eq!(harness.events.count(EventKind::Started), 0);
    assert_eq!(harness.manager.state(), ManagerState::Default);
    assert!(harness.manager.context().is_none());
    assert_eq!(smith.read().state(), ParticipantState::Enabled);
}

#[test]
fn graph_without_children_cannot_start() {
    let mut harness = Harness::new();
    let smith = npc(Graph::new("empty"));

    assert!(!harness.manager.can_start_dialogue(&smith));
    let result = harness.manager.request_start_dialogue(&player(), &[smith]);
    assert!(matches!(result, Err(DialogueError::ParticipantCannotStart(_))));
    assert_eq!(harness.manager.state(), ManagerState::Default);
}

#[test]
fn manager_without_world_fails() {
    let mut manager = DialogueManager::new(ManagerId::new("lost"));
    let events = test_utils::EventLog::attach(manager.hooks());
    let (graph, _) = smithy_graph();

    let result = manager.request_start_dialogue(&player(), &[npc(graph)]);

    assert!(matches!(result, Err(DialogueError::MissingWorld)));
    assert_eq!(events.failures(), vec!["Cannot find World!".to_string()]);
}

#[test]
fn disabled_participants_are_skipped() {
    let mut harness = Harness::new();
    let (graph, _) = smithy_graph();
    let smith = npc(graph);
    smith.write().set_state(ParticipantState::Disabled);

    let result = harness.manager.request_start_dialogue(&player(), &[smith]);
    assert!(matches!(result, Err(DialogueError::NoParticipants)));
    assert_eq!(harness.events.failures(), vec!["No participant can join the dialogue!".to_string()]);
}

#[test]
fn initiator_is_not_counted_twice() {
    let mut harness = Harness::new();
    let (graph, _) = smithy_graph();
    let smith = npc(graph);
    let player = player();

    harness
        .manager
        .request_start_dialogue(&player, &[player.clone(), smith.clone(), smith.clone()])
        .expect("dialogue should start");

    let context = harness.manager.context().expect("context");
    assert!(context.participants().is_empty());
    assert!(std::sync::Arc::ptr_eq(context.dialogue_participant().expect("npc"), &smith));
}

#[test]
fn second_start_is_refused_without_aborting() {
    let mut harness = Harness::new();
    let (player, smith, _) = start_smithy(&mut harness);

    let result = harness.manager.request_start_dialogue(&player, &[smith]);

    assert!(matches!(result, Err(DialogueError::NotStartable(ManagerState::Active))));
    assert_eq!(harness.events.count(EventKind::Failed), 1);
    assert_eq!(harness.manager.state(), ManagerState::Active);
    assert!(harness.manager.context().is_some());
}

#[test]
fn invalid_graph_is_rejected() {
    let mut harness = Harness::new();
    let (mut graph, _) = smithy_graph();
    graph.add_node(NodeKind::delay());

    let result = harness.manager.request_start_dialogue(&player(), &[npc(graph)]);
    match result {
        Err(DialogueError::InvalidGraph { graph, errors }) => {
            assert_eq!(graph, "smithy");
            assert!(!errors.is_empty());
        }
        other => panic!("expected invalid graph, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FULL CONVERSATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn start_broadcasts_in_order() {
    let mut harness = Harness::new();
    let (player, smith, nodes) = start_smithy(&mut harness);

    assert_eq!(
        harness.events.session_kinds(),
        vec![
            EventKind::Initialized,
            EventKind::ContextUpdated,
            EventKind::Started,
            EventKind::NodeStarted,
            EventKind::ContextUpdated,
            EventKind::RowStarted,
        ]
    );
    assert_eq!(
        harness.widget.commands(),
        vec![WidgetCommand::CreateDialogueWidget, WidgetCommand::ShowDialogueRow]
    );

    let context = harness.manager.context().expect("context");
    assert_eq!(context.active_node(), Some(nodes.greeting));
    assert_eq!(context.allowed_children(), &[nodes.trade, nodes.farewell]);
    assert_eq!(harness.manager.state(), ManagerState::Active);
    assert_eq!(player.read().state(), ParticipantState::Active);
    assert_eq!(smith.read().state(), ParticipantState::Active);
}

#[test]
fn rows_advance_on_timer_then_offer_options() {
    let mut harness = Harness::new();
    let (_, _, _) = start_smithy(&mut harness);
    assert_eq!(harness.manager.row_time_remaining(), Some(line_duration()));

    harness.tick(Duration::from_secs(1));
    assert_eq!(
        harness.manager.context().map(|context| context.row_data_index()),
        Some(0),
        "line should still be showing"
    );

    harness.tick(Duration::from_secs(1));
    assert_eq!(harness.manager.context().map(|context| context.row_data_index()), Some(1));
    assert_eq!(harness.widget.count(WidgetCommand::UpdateDialogueRow), 1);

    harness.finish_line();
    assert!(harness.manager.has_options());
    assert_eq!(harness.manager.row_time_remaining(), None);
    assert_eq!(harness.events.count(EventKind::RowFinished), 2);
    assert_eq!(harness.events.count(EventKind::NodeFinished), 1);
    assert_eq!(
        &harness.widget.commands()[3..],
        &[WidgetCommand::HideDialogueRow, WidgetCommand::AddDialogueOptions]
    );
}

#[test]
fn selecting_an_answer_finishes_the_dialogue() {
    let mut harness = Harness::new();
    let (player, smith, nodes) = start_smithy(&mut harness);
    harness.finish_line();
    harness.finish_line();

    harness
        .manager
        .select_node(&guid_of(&smith, nodes.farewell))
        .expect("farewell is an option");
    assert!(!harness.manager.has_options());
    assert_eq!(
        harness.manager.context().and_then(|context| context.active_node()),
        Some(nodes.farewell)
    );

    harness.finish_line();

    assert_eq!(harness.manager.state(), ManagerState::Default);
    assert!(harness.manager.context().is_none());
    assert_eq!(harness.events.count(EventKind::Closed), 1);
    assert_eq!(harness.widget.count(WidgetCommand::RemoveDialogueOptions), 1);
    assert_eq!(
        harness.widget.commands().last(),
        Some(&WidgetCommand::CloseDialogueWidget)
    );
    assert_eq!(player.read().state(), ParticipantState::Enabled);
    assert_eq!(smith.read().state(), ParticipantState::Enabled);

    let smith = smith.read();
    let graph_guid = smith.graph().map(|graph| graph.guid.clone()).expect("graph");
    let greeting = smith.graph().and_then(|graph| graph.node(nodes.greeting)).expect("node").guid.clone();
    let trade = smith.graph().and_then(|graph| graph.node(nodes.trade)).expect("node").guid.clone();
    assert_eq!(smith.traversal_count(&graph_guid, &greeting), 1);
    assert_eq!(smith.traversal_count(&graph_guid, &trade), 0);
}

#[test]
fn selecting_a_node_that_is_not_an_option_is_rejected() {
    let mut harness = Harness::new();
    let (_, smith, nodes) = start_smithy(&mut harness);
    harness.finish_line();
    harness.finish_line();

    let result = harness.manager.select_node(&guid_of(&smith, nodes.trade_end));

    assert!(matches!(result, Err(DialogueError::InvalidSelection(_))));
    assert_eq!(harness.manager.state(), ManagerState::Active);
    assert!(harness.manager.has_options());
    assert_eq!(harness.events.count(EventKind::Failed), 0);
}

#[test]
fn skip_row_advances_immediately() {
    let mut harness = Harness::new();
    let _ = start_smithy(&mut harness);

    harness.manager.skip_row().expect("skip");
    assert_eq!(harness.manager.context().map(|context| context.row_data_index()), Some(1));

    harness.manager.skip_row().expect("skip");
    assert!(harness.manager.has_options());

    harness.manager.skip_row().expect("nothing to skip");
    assert_eq!(harness.events.count(EventKind::RowFinished), 2);
}

#[test]
fn lead_without_children_closes_after_its_row() {
    let mut harness = Harness::new();
    let (graph, _) = single_lead_graph("farewell");
    harness
        .manager
        .request_start_dialogue(&player(), &[npc(graph)])
        .expect("dialogue should start");

    harness.finish_line();

    assert_eq!(harness.manager.state(), ManagerState::Default);
    assert_eq!(harness.events.count(EventKind::Closed), 1);
}

#[test]
fn empty_row_aborts_the_session() {
    let mut harness = Harness::new();
    let (graph, _) = single_lead_graph("broken");
    let smith = npc(graph);

    let result = harness.manager.request_start_dialogue(&player(), &[smith.clone()]);

    assert!(matches!(result, Err(DialogueError::InvalidRows)));
    assert_eq!(
        harness.events.failures(),
        vec!["Dialogue Row data contain Invalid Rows!".to_string()]
    );
    assert_eq!(harness.events.count(EventKind::Closed), 0);
    assert_eq!(harness.manager.state(), ManagerState::Default);
    assert!(harness.manager.context().is_none());
    assert_eq!(smith.read().state(), ParticipantState::Enabled);
    assert_eq!(
        harness.widget.commands().last(),
        Some(&WidgetCommand::CloseDialogueWidget)
    );
}

#[test]
fn blocked_first_node_fails_to_start() {
    let mut harness = Harness::new();
    let (mut graph, lead) = single_lead_graph("greeting");
    graph
        .node_mut(lead)
        .expect("lead")
        .add_decorator(DecoratorHandle::new(Condition::constant("locked", false)));
    let smith = npc(graph);

    let result = harness.manager.request_start_dialogue(&player(), &[smith.clone()]);

    assert!(matches!(result, Err(DialogueError::NothingToStart(_))));
    assert_eq!(
        harness.events.failures(),
        vec!["Dialogue Graph single has only Start Node and no Nodes to start!".to_string()]
    );
    assert_eq!(harness.events.count(EventKind::Started), 0);
    assert_eq!(harness.manager.state(), ManagerState::Default);
    assert!(harness.manager.context().is_none());
    assert_eq!(smith.read().state(), ParticipantState::Enabled);
}

#[test]
fn oversized_row_duration_aborts_the_session() {
    let mut harness = Harness::new();
    let table = DialogueTable::new("endless").with_row(
        "speech",
        DialogueRow::new("Smith", "Speech")
            .with_data(RowData::new("...").with_duration(RowDurationMode::Duration, 1e20, 0.0)),
    );
    let mut graph = Graph::new("endless");
    let start = graph.start_node().expect("start");
    let lead = graph.add_node(NodeKind::lead(RowHandle::new(Arc::new(table), "speech")));
    graph.connect(start, lead).expect("start -> lead");

    let result = harness.manager.request_start_dialogue(&player(), &[npc(graph)]);

    assert!(matches!(result, Err(DialogueError::InvalidRows)));
    assert_eq!(harness.events.count(EventKind::Failed), 1);
    assert_eq!(harness.manager.state(), ManagerState::Default);
    assert_eq!(harness.manager.row_time_remaining(), None);
}

#[test]
fn refused_widget_commands_are_not_reported() {
    let mut harness = Harness::new();
    harness.widget.refuse(WidgetCommand::ShowDialogueRow);
    let _ = start_smithy(&mut harness);

    assert_eq!(harness.widget.commands(), vec![WidgetCommand::CreateDialogueWidget]);
    assert_eq!(harness.events.count(EventKind::UiChanged), 1);
    assert_eq!(harness.manager.state(), ManagerState::Active);
}

// ═══════════════════════════════════════════════════════════════════════════════
// DELAYS AND RETURNS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn delay_node_waits_before_continuing() {
    let mut harness = Harness::new();
    let mut graph = Graph::new("pause");
    let start = graph.start_node().expect("start");
    let lead = graph.add_node(NodeKind::lead(row("trade")));
    let delay = graph.add_node(NodeKind::Delay {
        duration: Duration::from_secs(1),
    });
    let end = graph.add_node(NodeKind::AutoComplete);
    graph.connect(start, lead).expect("start -> lead");
    graph.connect(lead, delay).expect("lead -> delay");
    graph.connect(delay, end).expect("delay -> end");

    harness
        .manager
        .request_start_dialogue(&player(), &[npc(graph)])
        .expect("dialogue should start");
    harness.finish_line();

    assert_eq!(
        harness.manager.context().and_then(|context| context.active_node()),
        Some(delay)
    );
    assert_eq!(harness.manager.delay_time_remaining(), Some(Duration::from_secs(1)));

    harness.tick(Duration::from_millis(500));
    assert!(harness.manager.is_active());

    harness.tick(Duration::from_millis(500));
    assert!(!harness.manager.is_active());
    assert_eq!(harness.events.count(EventKind::Closed), 1);
}

#[test]
fn unschedulable_delay_aborts_the_session() {
    let mut harness = Harness::new();
    let mut graph = Graph::new("forever");
    let start = graph.start_node().expect("start");
    let lead = graph.add_node(NodeKind::lead(row("trade")));
    let delay = graph.add_node(NodeKind::Delay {
        duration: Duration::MAX,
    });
    let end = graph.add_node(NodeKind::AutoComplete);
    graph.connect(start, lead).expect("start -> lead");
    graph.connect(lead, delay).expect("lead -> delay");
    graph.connect(delay, end).expect("delay -> end");

    harness
        .manager
        .request_start_dialogue(&player(), &[npc(graph)])
        .expect("dialogue should start");
    harness.clock.advance(line_duration());
    let result = harness.manager.update();

    assert!(matches!(result, Err(DialogueError::InvalidDelay(_))));
    assert_eq!(harness.events.count(EventKind::Failed), 1);
    assert_eq!(harness.events.count(EventKind::Closed), 0);
    assert!(!harness.manager.is_active());
    assert_eq!(harness.manager.delay_time_remaining(), None);
}

#[test]
fn return_node_jumps_back_to_its_target() {
    let mut harness = Harness::new();
    let mut graph = Graph::new("loop");
    let start = graph.start_node().expect("start");
    let greeting = graph.add_node(NodeKind::lead(row("greeting")));
    let trade = graph.add_node(NodeKind::answer(row("trade")));
    let back = graph.add_node(NodeKind::return_to(greeting));
    graph.connect(start, greeting).expect("start -> greeting");
    graph.connect(greeting, trade).expect("greeting -> trade");
    graph.connect(trade, back).expect("trade -> back");
    let smith = npc(graph);

    harness
        .manager
        .request_start_dialogue(&player(), &[smith.clone()])
        .expect("dialogue should start");
    harness.finish_line();
    harness.finish_line();
    harness
        .manager
        .select_node(&guid_of(&smith, trade))
        .expect("trade is an option");
    harness.finish_line();

    assert_eq!(
        harness.manager.context().and_then(|context| context.active_node()),
        Some(back)
    );
    harness.tick(Duration::from_millis(100));

    let context = harness.manager.context().expect("still running");
    assert_eq!(context.active_node(), Some(greeting));
    let greeting_guid = guid_of(&smith, greeting);
    let visits = context
        .traversed_path()
        .iter()
        .find(|entry| entry.node == greeting_guid)
        .map(|entry| entry.count);
    assert_eq!(visits, Some(2));
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn leaving_active_closes_the_dialogue() {
    let mut harness = Harness::new();
    let _ = start_smithy(&mut harness);

    assert!(harness.manager.set_state(ManagerState::Inactive));

    assert_eq!(harness.manager.state(), ManagerState::Inactive);
    assert!(harness.manager.context().is_none());
    assert_eq!(harness.events.count(EventKind::Closed), 1);
    assert_eq!(harness.manager.row_time_remaining(), None);
}

#[test]
fn close_is_idempotent() {
    let mut harness = Harness::new();
    let _ = start_smithy(&mut harness);

    harness.manager.close_dialogue();
    harness.manager.close_dialogue();

    assert_eq!(harness.events.count(EventKind::Closed), 1);
    assert_eq!(harness.manager.state(), ManagerState::Default);
}

#[test]
fn custom_default_state_is_restored_after_close() {
    let mut harness = Harness::new();
    let _ = start_smithy(&mut harness);
    assert!(harness.manager.set_default_state(ManagerState::Inactive));

    harness.manager.close_dialogue();

    assert_eq!(harness.manager.state(), ManagerState::Inactive);
    assert!(harness.manager.set_state(ManagerState::Default));
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECORATORS ACROSS SESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn only_first_time_hides_answers_already_taken() {
    let mut harness = Harness::new();
    let (mut graph, nodes) = smithy_graph();
    graph
        .node_mut(nodes.trade)
        .expect("trade")
        .add_decorator(DecoratorHandle::new(OnlyFirstTime));
    let smith = npc(graph);
    let player = player();

    harness
        .manager
        .request_start_dialogue(&player, &[smith.clone()])
        .expect("first dialogue");
    harness.finish_line();
    harness.finish_line();
    harness
        .manager
        .select_node(&guid_of(&smith, nodes.trade))
        .expect("trade is offered the first time");
    harness.finish_line();
    assert!(!harness.manager.is_active());

    harness
        .manager
        .request_start_dialogue(&player, &[smith.clone()])
        .expect("second dialogue");
    harness.finish_line();
    harness.finish_line();

    let context = harness.manager.context().expect("context");
    assert_eq!(context.allowed_children(), &[nodes.farewell]);
    assert!(matches!(
        harness.manager.select_node(&guid_of(&smith, nodes.trade)),
        Err(DialogueError::InvalidSelection(_))
    ));
}

#[test]
fn saved_node_starts_the_next_dialogue() {
    let mut harness = Harness::new();
    let (mut graph, nodes) = smithy_graph();
    graph
        .node_mut(nodes.farewell)
        .expect("farewell")
        .add_decorator(DecoratorHandle::new(SaveNodeAsStart));
    let smith = npc(graph);
    let player = player();

    harness
        .manager
        .request_start_dialogue(&player, &[smith.clone()])
        .expect("first dialogue");
    harness.manager.skip_row().expect("skip");
    harness.manager.skip_row().expect("skip");
    harness
        .manager
        .select_node(&guid_of(&smith, nodes.farewell))
        .expect("farewell");
    assert_eq!(smith.read().starting_node(), Some(nodes.farewell));
    harness.manager.skip_row().expect("skip");
    assert!(!harness.manager.is_active());

    harness
        .manager
        .request_start_dialogue(&player, &[smith.clone()])
        .expect("second dialogue");
    let context = harness.manager.context().expect("context");
    assert_eq!(context.active_node(), Some(nodes.farewell));
    assert_eq!(
        context.active_row().map(|row| row.row_name()),
        Some("farewell")
    );
}

#[test]
fn commands_reach_the_dialogue_participant() {
    let mut harness = Harness::new();
    let (mut graph, nodes) = smithy_graph();
    graph
        .node_mut(nodes.greeting)
        .expect("greeting")
        .add_decorator(DecoratorHandle::new(SendCommand::new("open_shop").with_payload("weapons")));
    let smith = npc(graph);

    harness
        .manager
        .request_start_dialogue(&player(), &[smith.clone()])
        .expect("dialogue should start");

    let smith = smith.read();
    let commands = smith.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].command, "open_shop");
    assert_eq!(commands[0].payload.as_deref(), Some("weapons"));
}
