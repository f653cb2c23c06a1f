use std::collections::HashMap;
use std::fmt;

use crate::{FieldPath, Record, Value};

/// Field under which auto-assigned identity keys are attached to records.
pub const AUTO_KEY_FIELD: &str = "__rowid";

/// Stable identity of a record across pipeline transformations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowKey {
    /// Auto-assigned by the store on first ingestion.
    Auto(u64),
    /// Integral value of the configured key field.
    Int(i64),
    /// Any other value of the configured key field, in display form.
    Text(String),
}

impl RowKey {
    /// Derives a key from a configured key field value. Null and nested values have no key.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Map(_) => None,
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Some(Self::Int(*n as i64))
            }
            Value::Text(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Text(other.display_text())),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto(n) => write!(f, "#{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Owns the unmodified source collection and the identity key of every record.
///
/// Views never copy records; they hold store positions. The auto-key counter is
/// owned per store, so two grids never share identity sequences.
#[derive(Clone, Debug)]
pub struct RecordStore {
    records: Vec<Record>,
    keys: Vec<RowKey>,
    positions: HashMap<RowKey, usize>,
    key_field: Option<FieldPath>,
    auto_key_path: FieldPath,
    next_auto: u64,
}

impl RecordStore {
    /// Creates an empty store. `key_field` names the record field holding the
    /// identity; when `None` every record gets an auto key.
    pub fn new(key_field: Option<&str>) -> Self {
        Self {
            records: Vec::new(),
            keys: Vec::new(),
            positions: HashMap::new(),
            key_field: key_field.filter(|f| !f.is_empty()).map(FieldPath::parse),
            auto_key_path: FieldPath::parse(AUTO_KEY_FIELD),
            next_auto: 1,
        }
    }

    pub fn key_field(&self) -> Option<&FieldPath> {
        self.key_field.as_ref()
    }

    /// Replaces the source collection, assigning identity keys.
    ///
    /// Records that already carry an auto key (from an earlier ingestion) keep it.
    pub fn replace(&mut self, records: Vec<Record>) {
        self.keys.clear();
        self.positions.clear();
        self.keys.reserve_exact(records.len());
        self.records = records;

        for pos in 0..self.records.len() {
            let key = self.assign_key(pos);
            self.positions.insert(key.clone(), pos);
            self.keys.push(key);
        }
        gdebug!(
            records = self.records.len(),
            next_auto = self.next_auto,
            "RecordStore::replace"
        );
    }

    fn assign_key(&mut self, pos: usize) -> RowKey {
        if let Some(path) = &self.key_field {
            let configured = self.records[pos].get(path).and_then(RowKey::from_value);
            match configured {
                Some(key) if !self.positions.contains_key(&key) => return key,
                Some(_key) => {
                    gwarn!(key = %_key, pos, "duplicate identity key; assigning auto key");
                }
                None => {}
            }
        }

        let existing = self.records[pos]
            .get(&self.auto_key_path)
            .and_then(Value::as_f64)
            .filter(|n| *n >= 1.0 && n.fract() == 0.0)
            .map(|n| n as u64);
        if let Some(id) = existing {
            let key = RowKey::Auto(id);
            if !self.positions.contains_key(&key) {
                self.next_auto = self.next_auto.max(id.saturating_add(1));
                return key;
            }
        }

        let id = self.next_auto;
        self.next_auto = self.next_auto.saturating_add(1);
        self.records[pos].set(&self.auto_key_path, Value::from(id));
        RowKey::Auto(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn get(&self, pos: usize) -> Option<&Record> {
        self.records.get(pos)
    }

    /// Mutable access to a record. Identity was captured at ingestion; rewriting
    /// the key field does not re-key the record.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut Record> {
        self.records.get_mut(pos)
    }

    pub fn key_at(&self, pos: usize) -> Option<&RowKey> {
        self.keys.get(pos)
    }

    pub fn position_of(&self, key: &RowKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn get_by_key(&self, key: &RowKey) -> Option<&Record> {
        self.position_of(key).and_then(|pos| self.records.get(pos))
    }

    pub fn get_by_key_mut(&mut self, key: &RowKey) -> Option<&mut Record> {
        let pos = self.position_of(key)?;
        self.records.get_mut(pos)
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowKey, &Record)> {
        self.keys.iter().zip(self.records.iter())
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(None)
    }
}
