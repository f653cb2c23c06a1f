use std::collections::BTreeMap;
use std::fmt;

use crate::Value;

/// A parsed dotted field path such as `address.city`.
///
/// Parsing happens once (when a column or sort term is built) so the pipeline
/// does not re-split paths per record.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        let segments = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::to_string).collect()
        };
        Self {
            raw: path.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldPath").field(&self.raw).finish()
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// An open-ended mapping of field name to [`Value`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter; `path` may be dotted.
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.set(&FieldPath::parse(path), value.into());
        self
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reads the value at `path`. Missing levels (or non-map intermediates) yield `None`.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut cur = self.fields.get(first)?;
        for seg in rest {
            cur = cur.as_map()?.get(seg)?;
        }
        Some(cur)
    }

    pub fn get_field(&self, path: &str) -> Option<&Value> {
        self.get(&FieldPath::parse(path))
    }

    /// Writes `value` at `path`, creating (or replacing non-map) intermediate levels.
    ///
    /// Returns the previous value at the leaf, if any.
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Option<Value> {
        let (last, parents) = path.segments().split_last()?;
        let mut map = &mut self.fields;
        for seg in parents {
            let slot = map.entry(seg.clone()).or_insert(Value::Null);
            if !matches!(slot, Value::Map(_)) {
                *slot = Value::Map(BTreeMap::new());
            }
            let Value::Map(next) = slot else {
                return None;
            };
            map = next;
        }
        map.insert(last.clone(), value)
    }

    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Option<Value> {
        self.set(&FieldPath::parse(path), value.into())
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
