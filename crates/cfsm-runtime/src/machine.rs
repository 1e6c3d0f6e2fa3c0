//! A running machine instance and the transition protocol.

use cfsm_types::Status;
use log::{debug, trace};

use crate::hooks::{HookCall, HookPhase, Hooks};
use crate::spec::{EdgeSpec, MachineSpec};

/// What an advance asks for: an event (event-driven machines) or a target
/// state (direct-transition machines).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Event(usize),
    Target(usize),
}

/// A machine instance: a spec plus the current state.
#[derive(Debug, Clone)]
pub struct Machine<'s> {
    spec: &'s MachineSpec,
    current: usize,
}

impl<'s> Machine<'s> {
    /// Start in `initial`, which must be a declared initial state.
    pub fn new(spec: &'s MachineSpec, initial: usize) -> Result<Self, Status> {
        if initial >= spec.states.len() || !spec.initial.contains(&initial) {
            debug!("rejected initial state {initial}");
            return Err(Status::ErrInvalidState);
        }
        Ok(Self {
            spec,
            current: initial,
        })
    }

    pub fn spec(&self) -> &'s MachineSpec {
        self.spec
    }

    pub fn current_state(&self) -> usize {
        self.current
    }

    pub fn current_state_name(&self) -> &'s str {
        let spec = self.spec;
        spec.states[self.current].name.as_str()
    }

    fn find_edge(&self, request: Request) -> Option<&'s EdgeSpec> {
        let spec = self.spec;
        let state = &spec.states[self.current];
        state.edges.iter().find(|edge| match request {
            Request::Event(ev) => edge.event == Some(ev),
            Request::Target(t) => edge.event.is_none() && edge.target == t,
        })
    }

    /// Attempt one transition.
    ///
    /// 1. no edge for the request: `ErrInvalidTransition`, nothing runs
    /// 2. exit guards of the current state
    /// 3. guards of the triggering event, then guards of the edge
    /// 4. entry guards of the target state
    /// 5. exit callbacks, then event and entry callbacks in the
    ///    configured order
    /// 6. the target becomes current: `Ok`
    ///
    /// The first failing guard returns `ErrPrecondition` and nothing after
    /// it runs. The state only changes at step 6.
    pub fn advance<C, H>(&mut self, request: Request, ctx: &C, hooks: &mut H) -> Status
    where
        C: ?Sized,
        H: Hooks<C> + ?Sized,
    {
        let Some(edge) = self.find_edge(request) else {
            debug!(
                "no transition from {} for {request:?}",
                self.current_state_name()
            );
            return Status::ErrInvalidTransition;
        };

        let spec = self.spec;
        let (Some(from), Some(to)) = (spec.states.get(self.current), spec.states.get(edge.target))
        else {
            return Status::ErrInvalidTransition;
        };
        let event = edge.event.and_then(|e| spec.events.get(e));
        let make_call = |phase| HookCall {
            phase,
            current: self.current,
            next: edge.target,
            event: edge.event,
        };

        let guards = [
            (HookPhase::ExitGuard, from.exit_preconds.as_slice()),
            (
                HookPhase::EventGuard,
                event.map_or(&[][..], |e| e.preconds.as_slice()),
            ),
            (HookPhase::EdgeGuard, edge.preconds.as_slice()),
            (HookPhase::EntryGuard, to.entry_preconds.as_slice()),
        ];
        for (phase, names) in guards {
            let call = make_call(phase);
            for name in names {
                trace!("guard {name} ({phase:?})");
                if !hooks.guard(name, &call, ctx) {
                    debug!("{} -> {}: guard {name} failed", from.name, to.name);
                    return Status::ErrPrecondition;
                }
            }
        }

        let event_callbacks = event.map_or(&[][..], |e| e.callbacks.as_slice());
        let mut callbacks = vec![(HookPhase::ExitCallback, from.on_exit.as_slice())];
        if spec.callback_order.event_first() {
            callbacks.push((HookPhase::EventCallback, event_callbacks));
            callbacks.push((HookPhase::EntryCallback, to.on_enter.as_slice()));
        } else {
            callbacks.push((HookPhase::EntryCallback, to.on_enter.as_slice()));
            callbacks.push((HookPhase::EventCallback, event_callbacks));
        }
        for (phase, names) in callbacks {
            let call = make_call(phase);
            for name in names {
                trace!("callback {name} ({phase:?})");
                hooks.callback(name, &call, ctx);
            }
        }

        debug!("{} -> {}", from.name, to.name);
        self.current = edge.target;
        Status::Ok
    }

    pub fn state_name(&self, ordinal: i64) -> Option<&'s str> {
        self.spec.state_name(ordinal)
    }

    pub fn state_name_safe(&self, ordinal: i64) -> &'s str {
        self.spec.state_name_safe(ordinal)
    }

    pub fn event_name(&self, ordinal: i64) -> Option<&'s str> {
        self.spec.event_name(ordinal)
    }

    pub fn event_name_safe(&self, ordinal: i64) -> &'s str {
        self.spec.event_name_safe(ordinal)
    }
}
