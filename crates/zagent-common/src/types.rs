use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A metric value preserved verbatim from its source.
///
/// Values are never parsed for magnitude; they are forwarded as text exactly
/// as the source reported them.
///
/// # Examples
///
/// ```
/// use zagent_common::types::MetricValue;
///
/// let v = MetricValue::new("0.15");
/// assert_eq!(v.as_str(), "0.15");
/// assert_eq!(v.to_string(), "0.15");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricValue(String);

impl MetricValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Renders a JSON scalar as a metric value.
    ///
    /// Numbers keep their JSON text, strings are taken without quotes and
    /// booleans become `true`/`false`. `null`, arrays and objects have no
    /// scalar rendering and yield `None`.
    ///
    /// ```
    /// use serde_json::json;
    /// use zagent_common::types::MetricValue;
    ///
    /// assert_eq!(MetricValue::from_json(&json!(42)).unwrap().as_str(), "42");
    /// assert_eq!(MetricValue::from_json(&json!("max")).unwrap().as_str(), "max");
    /// assert!(MetricValue::from_json(&json!(null)).is_none());
    /// ```
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) => Some(Self(s.clone())),
            Value::Bool(b) => Some(Self(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The output of a single source reader, in the order the source produced it.
pub type MetricMap = Vec<(String, MetricValue)>;

/// The complete metric mapping of one collection cycle.
///
/// Entries iterate in first-insertion order. Inserting a name that already
/// exists replaces its value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<(String, MetricValue)>,
    index: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a metric, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) -> Option<MetricValue> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Merges a reader's output into the snapshot with last-write-wins.
    pub fn merge(&mut self, metrics: MetricMap) {
        for (name, value) in metrics {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Projects the snapshot into spool records tagged with `host`.
    pub fn spool_records<'a>(&'a self, host: &'a str) -> impl Iterator<Item = SpoolRecord<'a>> {
        self.iter().map(move |(name, value)| SpoolRecord { host, name, value })
    }
}

impl FromIterator<(String, MetricValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, MetricValue)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        snapshot.merge(iter.into_iter().collect());
        snapshot
    }
}

/// One line of the sender's input file: `<host> <name> <value>`.
///
/// The `Display` impl includes the trailing newline.
///
/// ```
/// use zagent_common::types::{MetricValue, SpoolRecord};
///
/// let value = MetricValue::new("3");
/// let rec = SpoolRecord { host: "app-ns.example.com", name: "ulimit.nproc", value: &value };
/// assert_eq!(rec.to_string(), "app-ns.example.com ulimit.nproc 3\n");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpoolRecord<'a> {
    pub host: &'a str,
    pub name: &'a str,
    pub value: &'a MetricValue,
}

impl fmt::Display for SpoolRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.host, self.name, self.value)
    }
}
