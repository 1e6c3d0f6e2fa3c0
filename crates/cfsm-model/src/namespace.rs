//! The finalized, read-only namespace handed to renderers.

use cfsm_types::{Variant, VariantResult};
use serde::Serialize;

/// A finalized namespace. Only shared access to the root is exposed, so
/// any number of render passes may read it concurrently.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Namespace {
    root: Variant,
}

impl Namespace {
    pub(crate) fn new(root: Variant) -> Self {
        Self { root }
    }

    /// The top-level mapping.
    pub fn root(&self) -> &Variant {
        &self.root
    }

    /// Top-level lookup.
    pub fn get(&self, key: &str) -> VariantResult<&Variant> {
        self.root.get(key)
    }

    /// Convenience for scalar string entries such as configuration keys.
    pub fn get_str(&self, key: &str) -> VariantResult<&str> {
        self.root.get(key)?.as_str()
    }

    pub fn get_int(&self, key: &str) -> VariantResult<i64> {
        self.root.get(key)?.as_int()
    }

    /// State names in ordinal order.
    pub fn state_names(&self) -> Vec<&str> {
        self.names_of("states")
    }

    /// Event names in ordinal order; empty for direct-transition machines.
    pub fn event_names(&self) -> Vec<&str> {
        self.names_of("events")
    }

    fn names_of(&self, key: &str) -> Vec<&str> {
        self.root
            .get(key)
            .and_then(Variant::as_map)
            .map(|m| m.keys().collect())
            .unwrap_or_default()
    }

    pub fn is_event_driven(&self) -> bool {
        self.get_int("event_driven").is_ok_and(|v| v != 0)
    }

    /// Take the root out, e.g. to serialize or hand to another owner.
    pub fn into_inner(self) -> Variant {
        self.root
    }
}
