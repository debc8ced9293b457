//! Tests for graph and node validation.
//!
//! These tests verify the `Graph::validate()` functionality:
//! - Structural checks (start node, isolation, inputs, cycles, reachability)
//! - Decorator slot checks (empty slots, duplicates, stackable decorators)
//! - Decorator messages folded into node output
//! - Node-kind specific checks (delay, return-to-node)
//! - Error display formatting


use core::time::Duration;

use colloquy_graph::decorator::builtin::{
    Condition, OnlyFirstTime, OverrideDialogue, SaveNodeAsStart, SendCommand,
};
use colloquy_graph::decorator::{Attachment, Decorator, DecoratorHandle};
use colloquy_graph::graph::{Graph, ValidationError};
use colloquy_graph::node::{NodeKind, ReturnToNodeData};
use test_utils::{bind, diamond_graph, row, single_lead_graph};

struct Unique;
impl Decorator for Unique {}

fn duplicates(errors: &[ValidationError]) -> Vec<&ValidationError> {
    errors
        .iter()
        .filter(|error| matches!(error, ValidationError::DuplicateDecorator { .. }))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Structure
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn well_formed_graph_is_valid() {
    let (graph, _) = diamond_graph();
    graph.validate().expect("diamond should be valid");
}

#[test]
fn empty_graph_has_no_start_node() {
    let graph = Graph::empty("nothing");
    let errors = graph.validate().expect_err("empty graph should fail");

    assert_eq!(
        errors,
        vec![ValidationError::NoStartNode {
            graph: "nothing".to_string()
        }]
    );
    assert_eq!(errors[0].to_string(), "nothing: Has no Start Node!");
}

#[test]
fn isolated_node_reports_every_violation() {
    let mut graph = Graph::new("lonely");
    let start = graph.start_node().expect("start node");
    let lead = graph.add_node(NodeKind::lead(row("greeting")));
    graph.connect(start, lead).expect("start -> lead");
    let stray = graph.add_node(NodeKind::Answer(Default::default()));

    let errors = graph.validate_node(stray).expect_err("stray node should fail");
    assert!(errors.contains(&ValidationError::IsolatedNode {
        node: stray,
        name: "Answer".to_string()
    }));
    assert!(errors.contains(&ValidationError::MissingInputs {
        node: stray,
        name: "Answer".to_string()
    }));
    assert_eq!(
        errors[0].to_string(),
        format!("Answer ({stray}): This Node has no Connections!")
    );
}

#[test]
fn start_node_never_requires_inputs() {
    let (graph, start, _) = single_lead_graph();
    graph.validate_node(start).expect("start should be valid");
}

#[test]
fn cycles_are_reported_once() {
    let mut graph = Graph::new("loop");
    let start = graph.start_node().expect("start node");
    let a = graph.add_node(NodeKind::delay());
    let b = graph.add_node(NodeKind::delay());
    graph.connect(start, a).expect("start -> a");
    graph.connect(a, b).expect("a -> b");
    graph.connect(b, a).expect("b -> a");

    let errors = graph.validate().expect_err("cycle should fail");
    let cycles: Vec<_> = errors
        .iter()
        .filter(|error| matches!(error, ValidationError::CyclicGraph { .. }))
        .collect();
    assert_eq!(cycles.len(), 1);
    assert!(matches!(cycles[0], ValidationError::CyclicGraph { node, .. } if *node == a));
}

#[test]
fn connected_island_is_unreachable() {
    let (mut graph, _, _) = single_lead_graph();
    let island = graph.add_node(NodeKind::delay());
    let island_child = graph.add_node(NodeKind::Complete);
    graph.connect(island, island_child).expect("island -> child");

    let errors = graph.validate().expect_err("island should fail");
    assert!(errors.iter().any(
        |error| matches!(error, ValidationError::UnreachableNode { node, .. } if *node == island)
    ));
    assert!(errors.iter().any(
        |error| matches!(error, ValidationError::UnreachableNode { node, .. } if *node == island_child)
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Decorator slots
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn stackable_decorators_may_repeat() {
    let (mut graph, _, lead) = single_lead_graph();
    let node = graph.node_mut(lead).expect("lead");
    node.add_decorator(DecoratorHandle::new(Condition::constant("gate", true).stackable()))
        .add_decorator(DecoratorHandle::new(Condition::constant("gate", true).stackable()));

    let errors = graph.validate().err().unwrap_or_default();
    assert!(duplicates(&errors).is_empty());
}

#[test]
fn non_stackable_duplicates_report_count_once() {
    let (mut graph, _, lead) = single_lead_graph();
    graph
        .node_mut(lead)
        .expect("lead")
        .add_decorator(DecoratorHandle::new(Unique))
        .add_decorator(DecoratorHandle::new(Unique));

    let errors = graph.validate_node(lead).expect_err("duplicates should fail");
    let found = duplicates(&errors);
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0],
        &ValidationError::DuplicateDecorator {
            attachment: Attachment::Node(lead),
            owner: "Lead".to_string(),
            decorator: "Unique".to_string(),
            count: 2,
        }
    );
    assert_eq!(
        found[0].to_string(),
        "Lead: has Decorator Unique 2x times! Please, avoid duplicates!"
    );
}

#[test]
fn empty_slot_reports_its_index() {
    let (mut graph, _, lead) = single_lead_graph();
    graph
        .node_mut(lead)
        .expect("lead")
        .add_decorator(DecoratorHandle::new(Unique))
        .add_decorator(DecoratorHandle::empty());

    let errors = graph.validate_node(lead).expect_err("empty slot should fail");
    assert!(errors.contains(&ValidationError::InvalidDecorator {
        attachment: Attachment::Node(lead),
        owner: "Lead".to_string(),
        index: 1,
    }));
}

#[test]
fn decorator_messages_are_prefixed_with_owner() {
    let (mut graph, _, lead) = single_lead_graph();
    graph
        .node_mut(lead)
        .expect("lead")
        .set_name("Elder greets")
        .add_decorator(DecoratorHandle::new(SendCommand::new("")));

    let errors = graph.validate().expect_err("empty command should fail");
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(messages.contains(
        &"Elder greets: Decorator SendCommand: StringCommand is empty! Sending Command would fail."
            .to_string()
    ));
}

#[test]
fn override_dialogue_reports_missing_table_and_row() {
    let (mut graph, _, lead) = single_lead_graph();
    graph
        .node_mut(lead)
        .expect("lead")
        .set_name("Elder greets")
        .add_decorator(DecoratorHandle::new(OverrideDialogue::unbound("")));

    let errors = graph.validate().expect_err("unbound override should fail");
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(messages.contains(&"Elder greets: OverrideDialogue has no Data Table!".to_string()));
    assert!(messages.contains(
        &"Elder greets: [OverrideDialogue Validation]: Invalid Row Name!".to_string()
    ));
}

#[test]
fn override_dialogue_with_unknown_row_fails() {
    let (mut graph, _, lead) = single_lead_graph();
    graph
        .node_mut(lead)
        .expect("lead")
        .add_decorator(DecoratorHandle::new(OverrideDialogue::new(row("missing"))));

    let errors = graph.validate().expect_err("unknown row should fail");
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(messages.iter().any(|message| message.ends_with("Invalid Row Name!")));
    assert!(!messages.iter().any(|message| message.ends_with("has no Data Table!")));
}

#[test]
fn node_only_decorator_on_graph_fails() {
    let (mut graph, _, _) = single_lead_graph();
    graph.add_graph_decorator(DecoratorHandle::new(SaveNodeAsStart));

    let errors = graph.validate().expect_err("graph attachment should fail");
    assert!(errors.iter().any(|error| matches!(
        error,
        ValidationError::Decorator { attachment: Attachment::Graph, message, .. }
            if message.starts_with("Decorator SaveNodeAsStart: is not allowed in Graph Decorators!")
    )));
}

#[test]
fn only_first_time_rejected_after_start() {
    let (mut graph, start, lead) = single_lead_graph();
    let answer = graph.add_node(NodeKind::answer(row("farewell")));
    graph.connect(lead, answer).expect("lead -> answer");

    graph
        .node_mut(start)
        .expect("start")
        .add_decorator(DecoratorHandle::new(OnlyFirstTime));
    graph
        .node_mut(lead)
        .expect("lead")
        .add_decorator(DecoratorHandle::new(OnlyFirstTime));
    graph
        .node_mut(answer)
        .expect("answer")
        .add_decorator(DecoratorHandle::new(OnlyFirstTime));

    let errors = graph.validate().expect_err("misplaced decorators should fail");
    let owners: Vec<Attachment> = errors
        .iter()
        .filter_map(|error| match error {
            ValidationError::Decorator { attachment, .. } => Some(*attachment),
            _ => None,
        })
        .collect();

    assert_eq!(owners, vec![Attachment::Node(start), Attachment::Node(lead)]);
}

#[test]
fn runtime_validation_requires_bound_decorators() {
    let (mut graph, _, lead) = single_lead_graph();
    graph
        .node_mut(lead)
        .expect("lead")
        .add_decorator(DecoratorHandle::new(Unique));

    graph.validate().expect("editor validation ignores bindings");
    let errors = graph.validate_runtime().expect_err("unbound decorator");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "Lead: [Unique]: No valid World!");

    bind(&graph);
    graph.validate_runtime().expect("bound decorator passes");
    assert!(graph.can_start());
}

// ─────────────────────────────────────────────────────────────────────────────
// Node kinds
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn zero_delay_is_invalid() {
    let (mut graph, _, lead) = single_lead_graph();
    let delay = graph.add_node(NodeKind::Delay {
        duration: Duration::ZERO,
    });
    graph.connect(lead, delay).expect("lead -> delay");

    let errors = graph.validate_node(delay).expect_err("zero delay should fail");
    assert!(matches!(errors[0], ValidationError::InvalidDelay { .. }));
}

#[test]
fn return_node_needs_target_and_single_branch_parent() {
    let (mut graph, _, lead) = single_lead_graph();
    let ret = graph.add_node(NodeKind::ReturnToNode(ReturnToNodeData::default()));
    let answer = graph.add_node(NodeKind::answer(row("farewell")));
    graph.connect(lead, ret).expect("lead -> return");
    graph.connect(lead, answer).expect("lead -> answer");

    let errors = graph.validate_node(ret).expect_err("return node should fail");
    assert!(errors.contains(&ValidationError::ReturnParentBranches {
        node: ret,
        name: "Return To Node".to_string(),
        parent: lead,
    }));
    assert!(errors.contains(&ValidationError::MissingReturnTarget {
        node: ret,
        name: "Return To Node".to_string(),
    }));
}

#[test]
fn return_node_with_target_and_lone_branch_is_valid() {
    let (mut graph, _, lead) = single_lead_graph();
    let answer = graph.add_node(NodeKind::answer(row("farewell")));
    let ret = graph.add_node(NodeKind::return_to(lead));
    graph.connect(lead, answer).expect("lead -> answer");
    graph.connect(answer, ret).expect("answer -> return");

    graph.validate_node(ret).expect("return node should be valid");
}

#[test]
fn validation_errors_are_std_errors() {
    let error: Box<dyn core::error::Error> = Box::new(ValidationError::NoStartNode {
        graph: "g".to_string(),
    });
    assert_eq!(error.to_string(), "g: Has no Start Node!");
}
