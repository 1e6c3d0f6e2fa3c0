//! Guard and callback dispatch.

use std::collections::{HashMap, VecDeque};

/// The protocol step a hook is invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    ExitGuard,
    EventGuard,
    EdgeGuard,
    EntryGuard,
    ExitCallback,
    EventCallback,
    EntryCallback,
}

impl HookPhase {
    pub fn is_guard(self) -> bool {
        matches!(
            self,
            HookPhase::ExitGuard | HookPhase::EventGuard | HookPhase::EdgeGuard | HookPhase::EntryGuard
        )
    }
}

/// Arguments passed to every hook: the state being left, the state being
/// entered and, for event-driven machines, the triggering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookCall {
    pub phase: HookPhase,
    pub current: usize,
    pub next: usize,
    pub event: Option<usize>,
}

/// Implementations of the named hooks a machine calls.
///
/// `C` is the caller's per-advance context.
pub trait Hooks<C: ?Sized = ()> {
    /// Run guard `name`; `true` lets the transition proceed.
    fn guard(&mut self, name: &str, call: &HookCall, ctx: &C) -> bool;

    fn callback(&mut self, name: &str, call: &HookCall, ctx: &C);
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub name: String,
    pub call: HookCall,
}

/// Test double: records every call and answers guards from a script.
///
/// A guard answers from its queued results first, then from its fixed
/// answer, and passes otherwise.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHooks {
    calls: Vec<RecordedCall>,
    queued: HashMap<String, VecDeque<bool>>,
    fixed: HashMap<String, bool>,
}

impl ScriptedHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard `name` always answers `result`.
    pub fn always(mut self, name: &str, result: bool) -> Self {
        self.fixed.insert(name.to_string(), result);
        self
    }

    /// Guard `name` answers `results` in order before falling back.
    pub fn then(mut self, name: &str, results: impl IntoIterator<Item = bool>) -> Self {
        self.queued
            .entry(name.to_string())
            .or_default()
            .extend(results);
        self
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Names of every hook invoked, in order.
    pub fn names(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.name == name).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl<C: ?Sized> Hooks<C> for ScriptedHooks {
    fn guard(&mut self, name: &str, call: &HookCall, _ctx: &C) -> bool {
        self.calls.push(RecordedCall {
            name: name.to_string(),
            call: *call,
        });
        if let Some(result) = self.queued.get_mut(name).and_then(VecDeque::pop_front) {
            return result;
        }
        self.fixed.get(name).copied().unwrap_or(true)
    }

    fn callback(&mut self, name: &str, call: &HookCall, _ctx: &C) {
        self.calls.push(RecordedCall {
            name: name.to_string(),
            call: *call,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> HookCall {
        HookCall {
            phase: HookPhase::EdgeGuard,
            current: 0,
            next: 1,
            event: None,
        }
    }

    #[test]
    fn scripted_answers_then_fixed_then_default() {
        let mut hooks = ScriptedHooks::new().then("g", [false, true]).always("g", false);
        let results: Vec<bool> = (0..3)
            .map(|_| Hooks::<()>::guard(&mut hooks, "g", &call(), &()))
            .collect();
        assert_eq!(results, vec![false, true, false]);
        assert!(Hooks::<()>::guard(&mut hooks, "other", &call(), &()));
        assert_eq!(hooks.count("g"), 3);
        assert_eq!(hooks.names().len(), 4);
    }

    #[test]
    fn phases_classify_guards() {
        assert!(HookPhase::EdgeGuard.is_guard());
        assert!(!HookPhase::EntryCallback.is_guard());
    }
}
