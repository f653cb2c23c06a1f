use std::collections::BTreeMap;

use serde_json::json;
use slotgrid::{QueryState, Record, SortDirection, SortTerm, Value};

/// Where the rows and total live inside a transport response.
///
/// Paths are dotted. An empty path addresses the response root.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaMapping {
    pub data: String,
    pub total: String,
}

impl Default for SchemaMapping {
    fn default() -> Self {
        Self {
            data: "items".to_string(),
            total: "total".to_string(),
        }
    }
}

impl SchemaMapping {
    pub fn new(data: impl Into<String>, total: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            total: total.into(),
        }
    }

    /// Pulls the page rows and total out of a response payload.
    ///
    /// A missing or null total defaults to the number of rows. Row entries that
    /// are not objects are skipped.
    pub fn extract(&self, payload: &serde_json::Value) -> Result<FetchedPage, FetchError> {
        let items = lookup(payload, &self.data).ok_or_else(|| FetchError::MissingField {
            path: self.data.clone(),
        })?;
        let items = items.as_array().ok_or_else(|| FetchError::NotAnArray {
            path: self.data.clone(),
        })?;

        let mut records = Vec::with_capacity(items.len());
        for (_i, item) in items.iter().enumerate() {
            match item {
                serde_json::Value::Object(map) => records.push(object_to_record(map)),
                _ => {
                    gwarn!(index = _i, "skipping non-object row in response");
                }
            }
        }

        let total = match lookup(payload, &self.total) {
            None | Some(serde_json::Value::Null) => items.len(),
            Some(raw) => parse_total(raw).ok_or_else(|| FetchError::InvalidTotal {
                path: self.total.clone(),
            })?,
        };
        Ok(FetchedPage { records, total })
    }
}

fn lookup<'a>(payload: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    if path.is_empty() {
        return Some(payload);
    }
    path.split('.').try_fold(payload, |cur, seg| cur.get(seg))
}

fn parse_total(raw: &serde_json::Value) -> Option<usize> {
    if let Some(n) = raw.as_u64() {
        return usize::try_from(n).ok();
    }
    let n = match raw {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        other => other.as_f64()?,
    };
    (n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64).then_some(n as usize)
}

fn object_to_record(map: &serde_json::Map<String, serde_json::Value>) -> Record {
    map.iter()
        .map(|(k, v)| (k.clone(), json_to_value(v)))
        .collect()
}

/// Converts a JSON value into a grid [`Value`]. Arrays are kept as their JSON text.
pub fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(_) => Value::Text(value.to_string()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// Remote data source configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataSource {
    pub schema: SchemaMapping,
}

impl DataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: SchemaMapping) -> Self {
        self.schema = schema;
        self
    }
}

/// Identifies one issued fetch. Only the latest ticket is accepted on resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchTicket(pub(crate) u64);

impl FetchTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FilterOp {
    Contains,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

/// Parameters handed to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub page: usize,
    pub page_size: usize,
    pub sort: Vec<SortTerm>,
    pub filter: Vec<FilterClause>,
}

impl FetchRequest {
    /// Composes a request from the query. Search text becomes a `*` contains filter.
    pub fn from_query(ticket: FetchTicket, query: &QueryState) -> Self {
        let filter = if query.search.is_empty() {
            Vec::new()
        } else {
            vec![FilterClause {
                field: "*".to_string(),
                op: FilterOp::Contains,
                value: query.search.clone(),
            }]
        };
        Self {
            ticket,
            page: query.page,
            page_size: query.page_size,
            sort: query.sort.clone(),
            filter,
        }
    }

    /// Wire form: `{page, pageSize, sort: [{field, dir}], filter: [{field, op, value}]}`.
    pub fn to_json(&self) -> serde_json::Value {
        let sort: Vec<serde_json::Value> = self
            .sort
            .iter()
            .map(|t| {
                let dir = match t.direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                };
                json!({ "field": t.field, "dir": dir })
            })
            .collect();
        let filter: Vec<serde_json::Value> = self
            .filter
            .iter()
            .map(|f| json!({ "field": f.field, "op": f.op.as_str(), "value": f.value }))
            .collect();
        json!({
            "page": self.page,
            "pageSize": self.page_size,
            "sort": sort,
            "filter": filter,
        })
    }
}

/// Rows and total extracted from a successful response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedPage {
    pub records: Vec<Record>,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("response has no field `{path}`")]
    MissingField { path: String },
    #[error("response field `{path}` is not an array")]
    NotAnArray { path: String },
    #[error("response field `{path}` is not a valid total")]
    InvalidTotal { path: String },
    #[error("fetch was superseded by a newer request")]
    Superseded,
}

/// Performs a fetch for the grid.
///
/// Implemented for any `FnMut(&FetchRequest) -> Result<serde_json::Value, FetchError>`.
pub trait Transport {
    fn read(&mut self, request: &FetchRequest) -> Result<serde_json::Value, FetchError>;
}

impl<F> Transport for F
where
    F: FnMut(&FetchRequest) -> Result<serde_json::Value, FetchError>,
{
    fn read(&mut self, request: &FetchRequest) -> Result<serde_json::Value, FetchError> {
        self(request)
    }
}
