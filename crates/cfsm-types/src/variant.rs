//! The variant store: a dynamically typed, ordered, deep-copyable value.
//!
//! [`Variant`] backs both the semantic model built from a description and
//! the namespace templates are rendered against. Mappings preserve
//! insertion order; iteration order and ordinal numbering depend on it.
//!
//! `Clone` on a [`Variant`] is a full deep copy. Nothing in this module
//! hands out shared ownership, so a copy can never observe later mutation
//! of its source. [`Variant::deep_copy`] names that operation explicitly
//! for call sites that snapshot live entries.

use std::collections::HashMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// The four value kinds a [`Variant`] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    String,
    Integer,
    Sequence,
    Mapping,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        })
    }
}

/// Failures of variant store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    #[error("key '{0}' not found")]
    NotFound(String),

    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("expected {expected}, found {found}")]
    KindMismatch {
        expected: VariantKind,
        found: VariantKind,
    },

    #[error("{0} has no length")]
    NotAContainer(VariantKind),
}

pub type VariantResult<T> = Result<T, VariantError>;

// ══════════════════════════════════════════════════════════════════════════════
// OrderedMap
// ══════════════════════════════════════════════════════════════════════════════

/// String-keyed mapping that iterates in insertion order.
///
/// Entries live in a vector; a hash index maps each key to its slot.
/// Overwriting an existing key keeps its slot.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap {
    entries: Vec<(String, Variant)>,
    index: HashMap<String, usize>,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. Returns the previous value when overwriting.
    pub fn insert(&mut self, key: impl Into<String>, value: Variant) -> Option<Variant> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Variant> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Variant> {
        match self.index.get(key) {
            Some(&slot) => Some(&mut self.entries[slot].1),
            None => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Zero-based insertion position of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Entry at an insertion position.
    pub fn entry_at(&self, position: usize) -> Option<(&str, &Variant)> {
        self.entries.get(position).map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Variant> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl PartialEq for OrderedMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for OrderedMap {}

impl<K: Into<String>> FromIterator<(K, Variant)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (K, Variant)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Variant
// ══════════════════════════════════════════════════════════════════════════════

/// A string, integer, sequence or insertion-ordered mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    Str(String),
    Int(i64),
    Seq(Vec<Variant>),
    Map(OrderedMap),
}

impl Variant {
    pub fn new_seq() -> Self {
        Variant::Seq(Vec::new())
    }

    pub fn new_map() -> Self {
        Variant::Map(OrderedMap::new())
    }

    pub fn kind(&self) -> VariantKind {
        match self {
            Variant::Str(_) => VariantKind::String,
            Variant::Int(_) => VariantKind::Integer,
            Variant::Seq(_) => VariantKind::Sequence,
            Variant::Map(_) => VariantKind::Mapping,
        }
    }

    /// Recursive copy sharing no mutable state with `self`.
    pub fn deep_copy(&self) -> Variant {
        self.clone()
    }

    fn mismatch(&self, expected: VariantKind) -> VariantError {
        VariantError::KindMismatch {
            expected,
            found: self.kind(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn as_str(&self) -> VariantResult<&str> {
        match self {
            Variant::Str(s) => Ok(s),
            other => Err(other.mismatch(VariantKind::String)),
        }
    }

    pub fn as_int(&self) -> VariantResult<i64> {
        match self {
            Variant::Int(n) => Ok(*n),
            other => Err(other.mismatch(VariantKind::Integer)),
        }
    }

    pub fn as_seq(&self) -> VariantResult<&[Variant]> {
        match self {
            Variant::Seq(items) => Ok(items),
            other => Err(other.mismatch(VariantKind::Sequence)),
        }
    }

    pub fn as_map(&self) -> VariantResult<&OrderedMap> {
        match self {
            Variant::Map(map) => Ok(map),
            other => Err(other.mismatch(VariantKind::Mapping)),
        }
    }

    pub fn as_map_mut(&mut self) -> VariantResult<&mut OrderedMap> {
        match self {
            Variant::Map(map) => Ok(map),
            other => Err(other.mismatch(VariantKind::Mapping)),
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Insert or overwrite a key of a mapping.
    pub fn insert(&mut self, key: impl Into<String>, value: Variant) -> VariantResult<()> {
        self.as_map_mut()?.insert(key, value);
        Ok(())
    }

    /// Append to a sequence.
    pub fn push(&mut self, value: Variant) -> VariantResult<()> {
        match self {
            Variant::Seq(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(other.mismatch(VariantKind::Sequence)),
        }
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    pub fn get(&self, key: &str) -> VariantResult<&Variant> {
        self.as_map()?
            .get(key)
            .ok_or_else(|| VariantError::NotFound(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> VariantResult<&mut Variant> {
        self.as_map_mut()?
            .get_mut(key)
            .ok_or_else(|| VariantError::NotFound(key.to_string()))
    }

    pub fn index(&self, index: usize) -> VariantResult<&Variant> {
        let items = self.as_seq()?;
        items.get(index).ok_or(VariantError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    /// Number of entries of a sequence or mapping.
    pub fn len(&self) -> VariantResult<usize> {
        match self {
            Variant::Seq(items) => Ok(items.len()),
            Variant::Map(map) => Ok(map.len()),
            other => Err(VariantError::NotAContainer(other.kind())),
        }
    }

    /// Template truthiness: zero, empty strings and empty containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Variant::Str(s) => !s.is_empty(),
            Variant::Int(n) => *n != 0,
            Variant::Seq(items) => !items.is_empty(),
            Variant::Map(map) => !map.is_empty(),
        }
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::Str(s.to_string())
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::Str(s)
    }
}

impl From<i64> for Variant {
    fn from(n: i64) -> Self {
        Variant::Int(n)
    }
}

impl From<bool> for Variant {
    fn from(b: bool) -> Self {
        Variant::Int(i64::from(b))
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(items: Vec<Variant>) -> Self {
        Variant::Seq(items)
    }
}

impl From<OrderedMap> for Variant {
    fn from(map: OrderedMap) -> Self {
        Variant::Map(map)
    }
}

/// Strings render literally and integers in decimal. Containers render as
/// a compact debug form; templates refuse to substitute them.
impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Str(s) => f.write_str(s),
            Variant::Int(n) => write!(f, "{n}"),
            Variant::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Variant::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Variant::Str(s) => serializer.serialize_str(s),
            Variant::Int(n) => serializer.serialize_i64(*n),
            Variant::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Variant::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}
