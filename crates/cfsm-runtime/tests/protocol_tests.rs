//! Transition protocol tests: descriptions are built into namespaces by the
//! real pipeline, then driven through the reference machine with hooks that
//! record every call.

use cfsm_compiler::build_namespace;
use cfsm_runtime::{
    CallbackOrder, HookCall, HookPhase, Hooks, Machine, MachineSpec, Request, RuntimeError,
    ScriptedHooks, Status,
};
use cfsm_types::Variant;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn spec(source: &str) -> MachineSpec {
    let ns = match build_namespace(source, "test.fsm") {
        Ok(ns) => ns,
        Err(errors) => panic!("description rejected:\n{errors}"),
    };
    MachineSpec::from_namespace(ns.root()).expect("namespace loads")
}

fn state(spec: &MachineSpec, name: &str) -> usize {
    spec.state_index(name).unwrap_or_else(|| panic!("no state {name}"))
}

fn to(spec: &MachineSpec, name: &str) -> Request {
    Request::Target(state(spec, name))
}

fn on(spec: &MachineSpec, event: &str) -> Request {
    Request::Event(spec.event_index(event).unwrap_or_else(|| panic!("no event {event}")))
}

/// Call counts of a state's `[entry_pre, exit_pre, exit, enter]` hooks.
fn visits(hooks: &ScriptedHooks, prefix: &str) -> [usize; 4] {
    ["entry_pre", "exit_pre", "exit", "enter"].map(|hook| hooks.count(&format!("{prefix}_{hook}")))
}

/// Every state carries all four hooks; T2 and T4 are not initial, T2 -> T4
/// is not an edge.
const T2: &str = r#"
state T1a initial {
    entry-precondition t1a_entry_pre; exit-precondition t1a_exit_pre;
    on-exit t1a_exit; on-enter t1a_enter;
    next-state T2;
}
state T1b initial {
    entry-precondition t1b_entry_pre; exit-precondition t1b_exit_pre;
    on-exit t1b_exit; on-enter t1b_enter;
    next-state T2;
}
state T2 {
    entry-precondition t2_entry_pre; exit-precondition t2_exit_pre;
    on-exit t2_exit; on-enter t2_enter;
    next-state T3;
}
state T3 {
    entry-precondition t3_entry_pre; exit-precondition t3_exit_pre;
    on-exit t3_exit; on-enter t3_enter;
    next-state T2, T3, T4;
}
state T4 {
    entry-precondition t4_entry_pre; exit-precondition t4_exit_pre;
    on-exit t4_exit; on-enter t4_enter;
}
"#;

const DOOR: &str = r#"
event open { precondition door_free; callback log_open; }
event close;
event lock { precondition has_key; callback log_lock; }

state CLOSED initial {
    on open -> OPEN { precondition not_blocked; }
    on lock -> LOCKED;
    on-exit leave_closed;
}
state OPEN {
    on close -> CLOSED;
    on-enter light_on;
}
state LOCKED {
    on-enter lock_light;
    exit-precondition key_turned;
}
"#;

// ─────────────────────────────────────────────────────────────────────
// Construction and names
// ─────────────────────────────────────────────────────────────────────

#[test]
fn initial_state_gate() {
    let spec = spec(T2);
    for name in ["T2", "T3", "T4"] {
        assert_eq!(
            Machine::new(&spec, state(&spec, name)).err(),
            Some(Status::ErrInvalidState),
            "{name}"
        );
    }
    for name in ["T1a", "T1b"] {
        let machine = Machine::new(&spec, state(&spec, name)).unwrap();
        assert_eq!(machine.current_state(), state(&spec, name));
        assert_eq!(machine.current_state_name(), name);
    }
}

#[test]
fn safe_name_lookup_never_fails() {
    let spec = spec(DOOR);
    let machine = Machine::new(&spec, 0).unwrap();
    assert_eq!(machine.state_name(2), Some("LOCKED"));
    assert_eq!(machine.state_name(3), None);
    assert_eq!(machine.state_name(-1), None);
    assert_eq!(machine.state_name_safe(3), "[INVALID]");
    assert_eq!(machine.state_name_safe(1), "OPEN");
    assert_eq!(machine.event_name(0), Some("open"));
    assert_eq!(machine.event_name(7), None);
    assert_eq!(machine.event_name_safe(7), "[INVALID]");
}

#[test]
fn sentinel_follows_option() {
    let spec = spec(&format!("option invalid-name \"?\";\n{DOOR}"));
    assert_eq!(spec.state_name_safe(42), "?");
}

// ─────────────────────────────────────────────────────────────────────
// Protocol
// ─────────────────────────────────────────────────────────────────────

#[test]
fn invalid_edge_runs_nothing() {
    let spec = spec(T2);
    let mut machine = Machine::new(&spec, state(&spec, "T1a")).unwrap();
    let mut hooks = ScriptedHooks::new();
    assert_eq!(
        machine.advance(to(&spec, "T4"), &(), &mut hooks),
        Status::ErrInvalidTransition
    );
    assert_eq!(machine.current_state_name(), "T1a");
    assert!(hooks.calls().is_empty());
}

#[test]
fn exit_guard_failure_short_circuits() {
    let spec = spec(
        "state A initial { exit-precondition a_exit; next-state B; on-exit a_leave; }\n\
         state B { entry-precondition b_entry; on-enter b_arrive; next-state A; }",
    );
    let mut machine = Machine::new(&spec, state(&spec, "A")).unwrap();
    let mut hooks = ScriptedHooks::new().always("a_exit", false);
    assert_eq!(
        machine.advance(to(&spec, "B"), &(), &mut hooks),
        Status::ErrPrecondition
    );
    assert_eq!(hooks.count("b_entry"), 0);
    assert_eq!(hooks.names(), vec!["a_exit"]);
    assert_eq!(machine.current_state_name(), "A");
}

#[test]
fn ordered_guard_chain() {
    let spec = spec(
        "state A initial { next-state B { precondition g1; precondition g2; } on-exit a_leave; }\n\
         state B { on-enter b_arrive; next-state A; }",
    );
    let mut machine = Machine::new(&spec, state(&spec, "A")).unwrap();
    let mut hooks = ScriptedHooks::new().then("g1", [false, true]);

    assert_eq!(
        machine.advance(to(&spec, "B"), &(), &mut hooks),
        Status::ErrPrecondition
    );
    assert_eq!(hooks.names(), vec!["g1"]);
    assert_eq!(hooks.count("g2"), 0);
    assert_eq!(machine.current_state_name(), "A");

    hooks.clear();
    assert_eq!(machine.advance(to(&spec, "B"), &(), &mut hooks), Status::Ok);
    assert_eq!(hooks.names(), vec!["g1", "g2", "a_leave", "b_arrive"]);
    assert_eq!(machine.current_state_name(), "B");
}

#[test]
fn guard_phases_run_in_protocol_order() {
    let spec = spec(DOOR);
    let mut machine = Machine::new(&spec, state(&spec, "CLOSED")).unwrap();
    let mut hooks = ScriptedHooks::new();
    assert_eq!(machine.advance(on(&spec, "open"), &(), &mut hooks), Status::Ok);
    assert_eq!(
        hooks.names(),
        vec!["door_free", "not_blocked", "leave_closed", "log_open", "light_on"]
    );
    let phases: Vec<HookPhase> = hooks.calls().iter().map(|c| c.call.phase).collect();
    assert_eq!(
        phases,
        vec![
            HookPhase::EventGuard,
            HookPhase::EdgeGuard,
            HookPhase::ExitCallback,
            HookPhase::EventCallback,
            HookPhase::EntryCallback,
        ]
    );
    assert!(phases[..2].iter().all(|p| p.is_guard()));
}

#[test]
fn event_guard_failure_skips_edge_guards() {
    let spec = spec(DOOR);
    let mut machine = Machine::new(&spec, state(&spec, "CLOSED")).unwrap();
    let mut hooks = ScriptedHooks::new().always("door_free", false);
    assert_eq!(
        machine.advance(on(&spec, "open"), &(), &mut hooks),
        Status::ErrPrecondition
    );
    assert_eq!(hooks.names(), vec!["door_free"]);
}

#[test]
fn hooks_receive_transition_arguments() {
    let spec = spec(DOOR);
    let mut machine = Machine::new(&spec, state(&spec, "CLOSED")).unwrap();
    let mut hooks = ScriptedHooks::new();
    machine.advance(on(&spec, "lock"), &(), &mut hooks);
    let call = hooks.calls()[0].call;
    assert_eq!(
        call,
        HookCall {
            phase: HookPhase::EventGuard,
            current: state(&spec, "CLOSED"),
            next: state(&spec, "LOCKED"),
            event: spec.event_index("lock"),
        }
    );
}

#[test]
fn callback_order_default_and_reordered() {
    assert_eq!(CallbackOrder::default(), CallbackOrder::DEFAULT);

    let default = spec(DOOR);
    let mut machine = Machine::new(&default, 0).unwrap();
    let mut hooks = ScriptedHooks::new();
    machine.advance(on(&default, "lock"), &(), &mut hooks);
    assert_eq!(
        hooks.names(),
        vec!["has_key", "leave_closed", "log_lock", "lock_light"]
    );

    let reordered = spec(&format!("option callback-order exit-entry-event;\n{DOOR}"));
    let mut machine = Machine::new(&reordered, 0).unwrap();
    let mut hooks = ScriptedHooks::new();
    machine.advance(on(&reordered, "lock"), &(), &mut hooks);
    assert_eq!(
        hooks.names(),
        vec!["has_key", "leave_closed", "lock_light", "log_lock"]
    );
}

#[test]
fn locked_door_needs_key_turned() {
    let spec = spec(DOOR);
    let mut machine = Machine::new(&spec, 0).unwrap();
    let mut hooks = ScriptedHooks::new().then("key_turned", [false]);
    assert_eq!(machine.advance(on(&spec, "lock"), &(), &mut hooks), Status::Ok);
    // LOCKED has no edge for close.
    assert_eq!(
        machine.advance(on(&spec, "close"), &(), &mut hooks),
        Status::ErrInvalidTransition
    );
    assert_eq!(machine.current_state_name(), "LOCKED");
    assert_eq!(hooks.count("key_turned"), 0);
}

// ─────────────────────────────────────────────────────────────────────
// Regression sequences
// ─────────────────────────────────────────────────────────────────────

#[test]
fn direct_transition_walk() {
    let spec = spec(
        "state T1 initial { next-state T2; }\n\
         state T2 { next-state T3; }\n\
         state T3 { next-state T2, T4; }\n\
         state T4;",
    );
    let mut machine = Machine::new(&spec, state(&spec, "T1")).unwrap();
    let mut hooks = ScriptedHooks::new();
    let steps = [
        ("T2", Status::Ok, "T2"),
        ("T3", Status::Ok, "T3"),
        ("T2", Status::Ok, "T2"),
        ("T4", Status::ErrInvalidTransition, "T2"),
        ("T3", Status::Ok, "T3"),
        ("T4", Status::Ok, "T4"),
        ("T1", Status::ErrInvalidTransition, "T4"),
    ];
    for (target, status, after) in steps {
        assert_eq!(machine.advance(to(&spec, target), &(), &mut hooks), status, "-> {target}");
        assert_eq!(machine.current_state_name(), after);
        assert_eq!(spec.state_name_safe(machine.current_state() as i64), after);
    }
}

#[test]
fn state_hook_visit_counts() {
    let spec = spec(T2);
    let mut hooks = ScriptedHooks::new()
        .always("t1a_entry_pre", false)
        .always("t1b_entry_pre", false)
        .always("t1b_exit_pre", false)
        .always("t4_entry_pre", false)
        .always("t4_exit_pre", false);

    // T1b -> T2: T1b's exit guard refuses.
    let mut machine = Machine::new(&spec, state(&spec, "T1b")).unwrap();
    assert_eq!(
        machine.advance(to(&spec, "T2"), &(), &mut hooks),
        Status::ErrPrecondition
    );
    assert_eq!(machine.current_state_name(), "T1b");
    assert_eq!(visits(&hooks, "t1b"), [0, 1, 0, 0]);
    assert_eq!(visits(&hooks, "t2"), [0, 0, 0, 0]);

    let mut machine = Machine::new(&spec, state(&spec, "T1a")).unwrap();
    assert_eq!(visits(&hooks, "t1a"), [0, 0, 0, 0]);

    assert_eq!(machine.advance(to(&spec, "T2"), &(), &mut hooks), Status::Ok);
    assert_eq!(visits(&hooks, "t1a"), [0, 1, 1, 0]);
    assert_eq!(visits(&hooks, "t2"), [1, 0, 0, 1]);

    assert_eq!(machine.advance(to(&spec, "T3"), &(), &mut hooks), Status::Ok);
    assert_eq!(visits(&hooks, "t2"), [1, 1, 1, 1]);
    assert_eq!(visits(&hooks, "t3"), [1, 0, 0, 1]);

    assert_eq!(machine.advance(to(&spec, "T2"), &(), &mut hooks), Status::Ok);
    assert_eq!(visits(&hooks, "t2"), [2, 1, 1, 2]);
    assert_eq!(visits(&hooks, "t3"), [1, 1, 1, 1]);

    assert_eq!(
        machine.advance(to(&spec, "T4"), &(), &mut hooks),
        Status::ErrInvalidTransition
    );
    assert_eq!(visits(&hooks, "t2"), [2, 1, 1, 2]);
    assert_eq!(machine.current_state_name(), "T2");

    assert_eq!(machine.advance(to(&spec, "T3"), &(), &mut hooks), Status::Ok);
    assert_eq!(visits(&hooks, "t2"), [2, 2, 2, 2]);
    assert_eq!(visits(&hooks, "t3"), [2, 1, 1, 2]);

    // T3 -> T4: T4's entry guard refuses after T3's exit guard passed.
    assert_eq!(
        machine.advance(to(&spec, "T4"), &(), &mut hooks),
        Status::ErrPrecondition
    );
    assert_eq!(machine.current_state_name(), "T3");
    assert_eq!(visits(&hooks, "t3"), [2, 2, 1, 2]);
    assert_eq!(visits(&hooks, "t4"), [1, 0, 0, 0]);

    // Self transition leaves and re-enters T3.
    assert_eq!(machine.advance(to(&spec, "T3"), &(), &mut hooks), Status::Ok);
    assert_eq!(visits(&hooks, "t3"), [3, 3, 2, 3]);
}

/// Hooks for the photon machine: counts calls, checks the arguments and
/// the per-advance context.
#[derive(Default)]
struct Photon {
    is_excited_calls: usize,
    ready_calls: usize,
    now_excited_calls: usize,
    ready_fails: bool,
    expected_ctx: u32,
}

impl Hooks<u32> for Photon {
    fn guard(&mut self, name: &str, call: &HookCall, ctx: &u32) -> bool {
        assert_eq!(*ctx, self.expected_ctx, "{name}");
        match name {
            "is_excited" => {
                assert_eq!(call.phase, HookPhase::EntryGuard);
                self.is_excited_calls += 1;
                self.is_excited_calls >= 3
            }
            "ready_to_emit_photon" => {
                assert_eq!(call.phase, HookPhase::ExitGuard);
                self.ready_calls += 1;
                !self.ready_fails
            }
            other => panic!("unexpected guard {other}"),
        }
    }

    fn callback(&mut self, name: &str, _call: &HookCall, _ctx: &u32) {
        match name {
            "now_excited" => self.now_excited_calls += 1,
            "absorb_a_photon" => {}
            other => panic!("unexpected callback {other}"),
        }
    }
}

#[test]
fn photon_sequence() {
    let spec = spec(
        "state INITIAL_1 initial { next-state EXCITED_STATE; }\n\
         state INITIAL_2 initial { next-state EXCITED_STATE; }\n\
         state EXCITED_STATE {\n\
             entry-precondition is_excited;\n\
             on-enter now_excited;\n\
             exit-precondition ready_to_emit_photon;\n\
             next-state GROUND_STATE;\n\
         }\n\
         state GROUND_STATE { on-enter absorb_a_photon; next-state EXCITED_STATE; }",
    );
    let excited = state(&spec, "EXCITED_STATE");
    let ground = state(&spec, "GROUND_STATE");

    assert!(Machine::new(&spec, excited).is_err());
    assert!(Machine::new(&spec, ground).is_err());
    let first = Machine::new(&spec, state(&spec, "INITIAL_1")).unwrap();
    assert_eq!(first.current_state_name(), "INITIAL_1");
    assert_eq!(spec.state_name_safe(first.current_state() as i64), "INITIAL_1");

    let mut machine = Machine::new(&spec, state(&spec, "INITIAL_2")).unwrap();
    let mut hooks = Photon {
        ready_fails: true,
        ..Photon::default()
    };
    for expected in 1..=2 {
        assert_eq!(
            machine.advance(Request::Target(excited), &0u32, &mut hooks),
            Status::ErrPrecondition
        );
        assert_eq!(hooks.is_excited_calls, expected);
    }
    assert_eq!(machine.advance(Request::Target(excited), &0u32, &mut hooks), Status::Ok);
    assert_eq!(machine.current_state(), excited);
    assert_eq!(hooks.is_excited_calls, 3);
    assert_eq!(hooks.now_excited_calls, 1);
    assert_eq!(hooks.ready_calls, 0);

    hooks.expected_ctx = 7;
    assert_eq!(
        machine.advance(Request::Target(ground), &7u32, &mut hooks),
        Status::ErrPrecondition
    );
    assert_eq!(machine.current_state(), excited);
    assert_eq!(hooks.ready_calls, 1);

    hooks.ready_fails = false;
    assert_eq!(machine.advance(Request::Target(ground), &7u32, &mut hooks), Status::Ok);
    assert_eq!(machine.current_state(), ground);
    assert_eq!(hooks.ready_calls, 2);
}

// ─────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────

#[test]
fn spec_mirrors_namespace() {
    let spec = spec(DOOR);
    assert!(spec.event_driven);
    assert_eq!(spec.initial, vec![0]);
    let closed = &spec.states[0];
    assert_eq!(closed.on_exit, vec!["leave_closed"]);
    assert_eq!(closed.edges.len(), 2);
    assert_eq!(closed.edges[0].key, "open");
    assert_eq!(closed.edges[0].preconds, vec!["not_blocked"]);
    assert_eq!(spec.events[2].callbacks, vec!["log_lock"]);
}

#[test]
fn direct_machine_edges_have_no_event() {
    let spec = spec("state A initial { next-state B; }\nstate B;");
    assert!(!spec.event_driven);
    assert!(spec.events.is_empty());
    assert_eq!(spec.states[0].edges[0].event, None);
    assert_eq!(spec.states[0].edges[0].key, "B");
}

#[test]
fn malformed_namespace_is_rejected() {
    assert!(matches!(
        MachineSpec::from_namespace(&Variant::new_map()),
        Err(RuntimeError::Variant(_))
    ));

    let mut root = build_namespace("state A initial { next-state B; }\nstate B;", "t.fsm")
        .unwrap()
        .into_inner();
    root.get_mut("transitions")
        .and_then(|t| t.get_mut("A"))
        .and_then(|a| a.get_mut("B"))
        .and_then(|edge| edge.insert("target_ordinal", Variant::Int(99)))
        .unwrap();
    match MachineSpec::from_namespace(&root) {
        Err(RuntimeError::MalformedNamespace(msg)) => assert!(msg.contains("99"), "{msg}"),
        other => panic!("expected an out-of-range target to be rejected, got {other:?}"),
    }
}

#[test]
fn hand_built_spec_with_bad_ordinals_does_not_panic() {
    let mut spec = spec("state A initial { next-state B; }\nstate B;");
    spec.states[0].edges[0].target = 99;
    let mut machine = Machine::new(&spec, 0).unwrap();
    let mut hooks = ScriptedHooks::new();
    assert_eq!(
        machine.advance(Request::Target(99), &(), &mut hooks),
        Status::ErrInvalidTransition
    );
    assert_eq!(machine.current_state(), 0);

    spec.initial.push(7);
    assert!(matches!(Machine::new(&spec, 7), Err(Status::ErrInvalidState)));
}
