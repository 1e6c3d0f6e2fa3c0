//! The model builder: declaration events to a finalized namespace.
//!
//! Each declaration is validated against what has been declared so far and
//! recorded in the matching namespace section. A rejected declaration
//! leaves the builder unchanged, so callers may keep applying later
//! declarations to collect further errors.

use cfsm_types::{Decl, DeclKind, HookTarget, OrderedMap, Variant};
use log::{debug, warn};

use crate::config;
use crate::error::{ModelError, ModelResult};
use crate::namespace::Namespace;

// ══════════════════════════════════════════════════════════════════════════════
// Hook Tables
// ══════════════════════════════════════════════════════════════════════════════

/// Which of the per-state hook sequences an attachment lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateHook {
    EntryCallback,
    ExitCallback,
    EntryPrecond,
    ExitPrecond,
}

impl StateHook {
    const ALL: [StateHook; 4] = [
        StateHook::EntryCallback,
        StateHook::ExitCallback,
        StateHook::EntryPrecond,
        StateHook::ExitPrecond,
    ];

    fn key(self) -> &'static str {
        match self {
            StateHook::EntryCallback => "transition_entry_callbacks",
            StateHook::ExitCallback => "transition_exit_callbacks",
            StateHook::EntryPrecond => "transition_entry_preconds",
            StateHook::ExitPrecond => "transition_exit_preconds",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Append `name` to the sequence stored under `key`.
fn append_hook(table: &mut OrderedMap, key: &str, name: &str) -> bool {
    match table.get_mut(key) {
        Some(Variant::Seq(items)) => {
            items.push(Variant::from(name));
            true
        }
        _ => false,
    }
}

/// Record `name` once, keeping first-reference order.
fn remember(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// ModelBuilder
// ══════════════════════════════════════════════════════════════════════════════

/// Accumulates declarations; [`ModelBuilder::finalize`] freezes the result.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    /// Configuration scalars, seeded with defaults.
    config: OrderedMap,
    states: OrderedMap,
    events: OrderedMap,
    initial_states: Vec<String>,
    event_callbacks: OrderedMap,
    event_preconds: OrderedMap,
    /// Indexed by [`StateHook::index`].
    state_hooks: [OrderedMap; 4],
    /// from-state → edge key → edge record
    transitions: OrderedMap,
    /// `None` until the first transition or event fixes the style.
    event_driven: Option<bool>,
    precondition_names: Vec<String>,
    callback_names: Vec<String>,
}

impl ModelBuilder {
    /// A builder seeded with configuration defaults. `input_path` names
    /// the description in generated comments.
    pub fn new(input_path: impl Into<String>) -> Self {
        let mut config = OrderedMap::new();
        for (key, value) in config::DEFAULTS {
            config.insert(*key, Variant::from(*value));
        }
        let input_path: String = input_path.into();
        config.insert("input_path", Variant::from(config::comment_safe(&input_path)));
        for (key, value) in config::status_scalars() {
            config.insert(key, value);
        }

        Self {
            config,
            states: OrderedMap::new(),
            events: OrderedMap::new(),
            initial_states: Vec::new(),
            event_callbacks: OrderedMap::new(),
            event_preconds: OrderedMap::new(),
            state_hooks: Default::default(),
            transitions: OrderedMap::new(),
            event_driven: None,
            precondition_names: Vec::new(),
            callback_names: Vec::new(),
        }
    }

    /// Apply one declaration event.
    pub fn apply(&mut self, decl: &Decl) -> ModelResult<()> {
        match &decl.kind {
            DeclKind::DeclareState { name } => self.declare_state(name),
            DeclKind::DeclareEvent { name } => self.declare_event(name),
            DeclKind::DeclareTransition { from, event, to } => {
                self.declare_transition(from, event.as_deref(), to)
            }
            DeclKind::DeclareInitial { state } => self.declare_initial(state),
            DeclKind::AttachPrecondition { target, name } => {
                self.attach_precondition(target, name)
            }
            DeclKind::AttachCallback { target, name } => self.attach_callback(target, name),
            DeclKind::SetConfig { key, value } => self.set_config(key, value),
        }
    }

    // ── Declarations ──────────────────────────────────────────────────────────

    pub fn declare_state(&mut self, name: &str) -> ModelResult<()> {
        if self.states.contains_key(name) {
            return Err(ModelError::DuplicateState(name.to_string()));
        }
        self.claim(name, "state")?;
        let ordinal = self.states.len() as i64;
        self.states.insert(name, Variant::Int(ordinal));
        for table in &mut self.state_hooks {
            table.insert(name, Variant::new_seq());
        }
        self.transitions.insert(name, Variant::new_map());
        debug!("state {name} = {ordinal}");
        Ok(())
    }

    pub fn declare_event(&mut self, name: &str) -> ModelResult<()> {
        if self.events.contains_key(name) {
            return Err(ModelError::DuplicateEvent(name.to_string()));
        }
        self.claim(name, "event")?;
        if self.event_driven == Some(false) {
            return Err(ModelError::MixedTransitions(format!(
                "event '{name}' declared in a machine with direct transitions"
            )));
        }
        let ordinal = self.events.len() as i64;
        self.events.insert(name, Variant::Int(ordinal));
        self.event_callbacks.insert(name, Variant::new_seq());
        self.event_preconds.insert(name, Variant::new_seq());
        self.event_driven = Some(true);
        debug!("event {name} = {ordinal}");
        Ok(())
    }

    pub fn declare_transition(
        &mut self,
        from: &str,
        event: Option<&str>,
        to: &str,
    ) -> ModelResult<()> {
        self.require_state(from)?;
        let target_ordinal = self.require_state(to)?;
        match event {
            Some(event) => {
                self.require_event(event)?;
            }
            None if !self.events.is_empty() => {
                return Err(ModelError::MixedTransitions(format!(
                    "direct transition '{from}' -> '{to}' in an event-driven machine"
                )));
            }
            None => {}
        }

        let via = event.unwrap_or(to);
        let Some(Variant::Map(edges)) = self.transitions.get_mut(from) else {
            return Err(ModelError::UnknownState(from.to_string()));
        };
        if edges.contains_key(via) {
            return Err(ModelError::DuplicateTransition {
                from: from.to_string(),
                via: via.to_string(),
            });
        }

        let mut record = OrderedMap::new();
        record.insert("target", Variant::from(to));
        record.insert("target_ordinal", Variant::Int(target_ordinal));
        if let Some(event) = event {
            record.insert("event", Variant::from(event));
        }
        record.insert("preconds", Variant::new_seq());
        edges.insert(via, Variant::Map(record));

        self.event_driven = Some(event.is_some());
        debug!("transition {from} -> {to} via {via}");
        Ok(())
    }

    pub fn declare_initial(&mut self, state: &str) -> ModelResult<()> {
        self.require_state(state)?;
        if self.initial_states.iter().any(|s| s == state) {
            return Err(ModelError::DuplicateInitial(state.to_string()));
        }
        self.initial_states.push(state.to_string());
        debug!("initial state {state}");
        Ok(())
    }

    pub fn attach_precondition(&mut self, target: &HookTarget, name: &str) -> ModelResult<()> {
        self.claim(name, "precondition")?;
        match target {
            HookTarget::StateEntry(state) => {
                self.attach_state_hook(StateHook::EntryPrecond, state, name)?;
            }
            HookTarget::StateExit(state) => {
                self.attach_state_hook(StateHook::ExitPrecond, state, name)?;
            }
            HookTarget::Event(event) => {
                self.require_event(event)?;
                append_hook(&mut self.event_preconds, event, name);
            }
            HookTarget::Transition { from, via } => {
                self.require_state(from)?;
                let attached = match self.transitions.get_mut(from) {
                    Some(Variant::Map(edges)) => match edges.get_mut(via) {
                        Some(Variant::Map(record)) => append_hook(record, "preconds", name),
                        _ => false,
                    },
                    _ => false,
                };
                if !attached {
                    return Err(ModelError::UnknownTransition {
                        from: from.clone(),
                        via: via.clone(),
                        hook: name.to_string(),
                    });
                }
            }
        }
        remember(&mut self.precondition_names, name);
        debug!("precondition {name} on {target}");
        Ok(())
    }

    pub fn attach_callback(&mut self, target: &HookTarget, name: &str) -> ModelResult<()> {
        self.claim(name, "callback")?;
        match target {
            HookTarget::StateEntry(state) => {
                self.attach_state_hook(StateHook::EntryCallback, state, name)?;
            }
            HookTarget::StateExit(state) => {
                self.attach_state_hook(StateHook::ExitCallback, state, name)?;
            }
            HookTarget::Event(event) => {
                self.require_event(event)?;
                append_hook(&mut self.event_callbacks, event, name);
            }
            HookTarget::Transition { from, via } => {
                return Err(ModelError::UnsupportedHook {
                    from: from.clone(),
                    via: via.clone(),
                });
            }
        }
        remember(&mut self.callback_names, name);
        debug!("callback {name} on {target}");
        Ok(())
    }

    pub fn set_config(&mut self, key: &str, value: &str) -> ModelResult<()> {
        let value = config::validate(key, value)?;
        debug!("option {key} = {value}");
        self.config.insert(key, value);
        Ok(())
    }

    // ── Lookups ───────────────────────────────────────────────────────────────

    /// What `name` already denotes in the generated C, if anything.
    fn existing_kind(&self, name: &str) -> Option<&'static str> {
        if self.states.contains_key(name) {
            Some("state")
        } else if self.events.contains_key(name) {
            Some("event")
        } else if self.precondition_names.iter().any(|n| n == name) {
            Some("precondition")
        } else if self.callback_names.iter().any(|n| n == name) {
            Some("callback")
        } else {
            None
        }
    }

    /// Check that `name` may denote a `kind`. Reusing a hook name for the
    /// same kind of hook is fine; state and event duplicates are caught
    /// before this runs.
    fn claim(&self, name: &str, kind: &'static str) -> ModelResult<()> {
        if config::is_reserved(name) {
            return Err(ModelError::ReservedName {
                name: name.to_string(),
                kind,
            });
        }
        match self.existing_kind(name) {
            None => Ok(()),
            Some(existing) if existing == kind => Ok(()),
            Some("precondition" | "callback") if matches!(kind, "precondition" | "callback") => {
                Err(ModelError::HookKindConflict(name.to_string()))
            }
            Some(existing) => Err(ModelError::NameConflict {
                name: name.to_string(),
                kind,
                existing,
            }),
        }
    }

    fn require_state(&self, name: &str) -> ModelResult<i64> {
        self.states
            .get(name)
            .and_then(|v| v.as_int().ok())
            .ok_or_else(|| ModelError::UnknownState(name.to_string()))
    }

    fn require_event(&self, name: &str) -> ModelResult<i64> {
        self.events
            .get(name)
            .and_then(|v| v.as_int().ok())
            .ok_or_else(|| ModelError::UnknownEvent(name.to_string()))
    }

    fn attach_state_hook(&mut self, hook: StateHook, state: &str, name: &str) -> ModelResult<()> {
        self.require_state(state)?;
        append_hook(&mut self.state_hooks[hook.index()], state, name);
        Ok(())
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Finalization
    // ══════════════════════════════════════════════════════════════════════════

    /// Validate the whole machine, derive the computed scalars and freeze.
    ///
    /// Checks run in order: no states, a single state, no initial state.
    pub fn finalize(self) -> ModelResult<Namespace> {
        match self.states.len() {
            0 => return Err(ModelError::NoStates),
            1 => return Err(ModelError::SingleState),
            _ => {}
        }
        if self.initial_states.is_empty() {
            return Err(ModelError::NoInitialState);
        }
        self.check_generated_names()?;
        self.warn_unreachable();

        let state_count = self.states.len() as i64;
        let event_count = self.events.len() as i64;
        let event_driven = self.event_driven == Some(true);
        let callback_order = self
            .config
            .get("callback_order")
            .and_then(|v| v.as_str().ok())
            .and_then(|s| s.parse::<cfsm_types::CallbackOrder>().ok())
            .unwrap_or_default();

        let mut root = self.config;

        let states_array: Vec<Variant> = self.states.values().cloned().collect();
        let min_state = states_array.first().map(Variant::deep_copy);
        let max_state = states_array.last().map(Variant::deep_copy);
        root.insert("states", Variant::Map(self.states));
        root.insert("states_array", Variant::Seq(states_array));

        let mut event_bounds = None;
        if !self.events.is_empty() {
            let events_array: Vec<Variant> = self.events.values().cloned().collect();
            event_bounds = events_array
                .first()
                .map(Variant::deep_copy)
                .zip(events_array.last().map(Variant::deep_copy));
            root.insert("events", Variant::Map(self.events));
            root.insert("events_array", Variant::Seq(events_array));
        }

        let multiple_start_states = self.initial_states.len() > 1;
        root.insert(
            "initial_states",
            Variant::Seq(self.initial_states.into_iter().map(Variant::from).collect()),
        );
        root.insert("event_callbacks", Variant::Map(self.event_callbacks));
        root.insert("event_preconds", Variant::Map(self.event_preconds));
        for (hook, table) in StateHook::ALL.into_iter().zip(self.state_hooks) {
            root.insert(hook.key(), Variant::Map(table));
        }
        root.insert("transitions", Variant::Map(self.transitions));

        if let (Some(min), Some(max)) = (min_state, max_state) {
            root.insert("min_state_valid", min);
            root.insert("max_state_valid", max);
        }
        if let Some((min, max)) = event_bounds {
            root.insert("min_event_valid", min);
            root.insert("max_event_valid", max);
        }
        root.insert("multiple_start_states", Variant::from(multiple_start_states));
        root.insert("event_driven", Variant::from(event_driven));
        root.insert("state_count", Variant::Int(state_count));
        root.insert("event_count", Variant::Int(event_count));
        root.insert(
            "event_callback_first",
            Variant::from(callback_order.event_first()),
        );
        root.insert(
            "precondition_names",
            Variant::Seq(self.precondition_names.into_iter().map(Variant::from).collect()),
        );
        root.insert(
            "callback_names",
            Variant::Seq(self.callback_names.into_iter().map(Variant::from).collect()),
        );

        debug!("finalized namespace: {state_count} states, {event_count} events");
        Ok(Namespace::new(Variant::Map(root)))
    }

    /// Functions, macros and tables the templates emit, named from the
    /// configuration as it stands now.
    fn generated_identifiers(&self) -> Vec<String> {
        let get = |key: &str| {
            self.config
                .get(key)
                .and_then(|v| v.as_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        let mut names: Vec<String> = config::ordinary_identifier_keys().map(get).collect();
        let fsm = get("fsm_struct");
        for helper in [
            "exit_preconds",
            "event_preconds",
            "edge_preconds",
            "entry_preconds",
            "exit_callbacks",
            "event_callbacks",
            "entry_callbacks",
        ] {
            names.push(format!("{fsm}_{helper}"));
        }
        names.push(format!("{}_names", get("state_enum")));
        names.push(format!("{}_names", get("event_enum")));
        names
    }

    fn check_generated_names(&self) -> ModelResult<()> {
        let generated = self.generated_identifiers();
        let declared = self
            .states
            .keys()
            .map(|n| (n, "state"))
            .chain(self.events.keys().map(|n| (n, "event")))
            .chain(self.precondition_names.iter().map(|n| (n.as_str(), "precondition")))
            .chain(self.callback_names.iter().map(|n| (n.as_str(), "callback")));
        for (name, kind) in declared {
            if generated.iter().any(|g| g == name) {
                return Err(ModelError::NameConflict {
                    name: name.to_string(),
                    kind,
                    existing: "generated identifier",
                });
            }
        }
        Ok(())
    }

    /// States that are neither initial nor the target of any edge.
    pub fn unreachable_states(&self) -> Vec<String> {
        let targets: Vec<&str> = self
            .transitions
            .values()
            .filter_map(|edges| edges.as_map().ok())
            .flat_map(|edges| edges.values())
            .filter_map(|record| record.get("target").ok()?.as_str().ok())
            .collect();
        self.states
            .keys()
            .filter(|s| !self.initial_states.iter().any(|i| i == s) && !targets.contains(s))
            .map(str::to_string)
            .collect()
    }

    fn warn_unreachable(&self) {
        for state in self.unreachable_states() {
            warn!("state '{state}' is unreachable: it is not initial and no transition targets it");
        }
    }
}
