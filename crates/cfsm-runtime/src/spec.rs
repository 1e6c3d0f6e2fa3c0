//! Machine definition loaded from a finalized namespace.

use cfsm_types::{CallbackOrder, Variant, VariantResult};

use crate::error::{RuntimeError, RuntimeResult};

/// One outgoing edge of a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSpec {
    /// Event name for event-driven machines, target name otherwise.
    pub key: String,
    pub target: usize,
    pub event: Option<usize>,
    /// Guards attached to this edge alone, in attachment order.
    pub preconds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSpec {
    pub name: String,
    pub entry_preconds: Vec<String>,
    pub exit_preconds: Vec<String>,
    pub on_enter: Vec<String>,
    pub on_exit: Vec<String>,
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    pub name: String,
    pub preconds: Vec<String>,
    pub callbacks: Vec<String>,
}

/// Everything the transition protocol needs, indexed by ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSpec {
    pub states: Vec<StateSpec>,
    pub events: Vec<EventSpec>,
    /// Ordinals of the states a machine may start in.
    pub initial: Vec<usize>,
    pub event_driven: bool,
    pub callback_order: CallbackOrder,
    /// Sentinel returned by the safe name lookups.
    pub invalid_name: String,
}

fn names(v: &Variant) -> VariantResult<Vec<String>> {
    v.as_seq()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// `ns[table][key]` as a list of hook names; a missing table entry is empty.
fn hooks_of(ns: &Variant, table: &str, key: &str) -> RuntimeResult<Vec<String>> {
    match ns.get(table)?.as_map()?.get(key) {
        Some(list) => Ok(names(list)?),
        None => Ok(Vec::new()),
    }
}

fn ordinal(v: &Variant) -> RuntimeResult<usize> {
    let n = v.as_int()?;
    usize::try_from(n).map_err(|_| RuntimeError::MalformedNamespace(format!("negative ordinal {n}")))
}

impl MachineSpec {
    /// Load from a finalized namespace root.
    pub fn from_namespace(ns: &Variant) -> RuntimeResult<Self> {
        let event_index = match ns.get("events") {
            Ok(events) => events.as_map()?.clone(),
            Err(_) => Default::default(),
        };

        let mut events = Vec::with_capacity(event_index.len());
        for name in event_index.keys() {
            events.push(EventSpec {
                name: name.to_string(),
                preconds: hooks_of(ns, "event_preconds", name)?,
                callbacks: hooks_of(ns, "event_callbacks", name)?,
            });
        }

        let transitions = ns.get("transitions")?.as_map()?;
        let mut states = Vec::new();
        for (position, (name, ord)) in ns.get("states")?.as_map()?.iter().enumerate() {
            if ordinal(ord)? != position {
                return Err(RuntimeError::MalformedNamespace(format!(
                    "state '{name}' has ordinal {ord}, expected {position}"
                )));
            }
            let mut edges = Vec::new();
            if let Some(out) = transitions.get(name) {
                for (key, record) in out.as_map()?.iter() {
                    let event = match record.get("event") {
                        Ok(ev) => {
                            let ev = ev.as_str()?;
                            Some(event_index.position(ev).ok_or_else(|| {
                                RuntimeError::MalformedNamespace(format!("unknown event '{ev}'"))
                            })?)
                        }
                        Err(_) => None,
                    };
                    edges.push(EdgeSpec {
                        key: key.to_string(),
                        target: ordinal(record.get("target_ordinal")?)?,
                        event,
                        preconds: names(record.get("preconds")?)?,
                    });
                }
            }
            states.push(StateSpec {
                name: name.to_string(),
                entry_preconds: hooks_of(ns, "transition_entry_preconds", name)?,
                exit_preconds: hooks_of(ns, "transition_exit_preconds", name)?,
                on_enter: hooks_of(ns, "transition_entry_callbacks", name)?,
                on_exit: hooks_of(ns, "transition_exit_callbacks", name)?,
                edges,
            });
        }

        for state in &states {
            if let Some(edge) = state.edges.iter().find(|e| e.target >= states.len()) {
                return Err(RuntimeError::MalformedNamespace(format!(
                    "edge '{}' -> '{}' targets ordinal {} of {} states",
                    state.name,
                    edge.key,
                    edge.target,
                    states.len()
                )));
            }
        }

        let state_ordinals = ns.get("states")?;
        let initial = ns
            .get("initial_states")?
            .as_seq()?
            .iter()
            .map(|s| ordinal(state_ordinals.get(s.as_str()?)?))
            .collect::<RuntimeResult<Vec<_>>>()?;
        if let Some(bad) = initial.iter().find(|&&i| i >= states.len()) {
            return Err(RuntimeError::MalformedNamespace(format!(
                "initial state ordinal {bad} of {} states",
                states.len()
            )));
        }

        let callback_order = ns
            .get("callback_order")?
            .as_str()?
            .parse()
            .map_err(RuntimeError::MalformedNamespace)?;

        Ok(Self {
            states,
            events,
            initial,
            event_driven: ns.get("event_driven")?.as_int()? != 0,
            callback_order,
            invalid_name: ns.get("invalid_name")?.as_str()?.to_string(),
        })
    }

    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }

    pub fn event_index(&self, name: &str) -> Option<usize> {
        self.events.iter().position(|e| e.name == name)
    }

    // ── Name lookups ──────────────────────────────────────────────────────────

    /// Declared name of a state ordinal; `None` outside the valid range.
    pub fn state_name(&self, ordinal: i64) -> Option<&str> {
        let i = usize::try_from(ordinal).ok()?;
        self.states.get(i).map(|s| s.name.as_str())
    }

    /// Like [`state_name`](Self::state_name) but never fails.
    pub fn state_name_safe(&self, ordinal: i64) -> &str {
        self.state_name(ordinal).unwrap_or(&self.invalid_name)
    }

    pub fn event_name(&self, ordinal: i64) -> Option<&str> {
        let i = usize::try_from(ordinal).ok()?;
        self.events.get(i).map(|e| e.name.as_str())
    }

    pub fn event_name_safe(&self, ordinal: i64) -> &str {
        self.event_name(ordinal).unwrap_or(&self.invalid_name)
    }
}
