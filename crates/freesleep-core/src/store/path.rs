// ── Field paths ──
//
// Dotted names over the serialized merged view: `available`,
// `pod.led_brightness`, `left.schedule.monday.alarm.time`,
// `derived.left.today_alarm.enabled`. Objects are descended into; every
// other JSON value (arrays included) is a leaf.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Side;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `pod.{rest}`
    pub fn pod(rest: &str) -> Self {
        Self(format!("pod.{rest}"))
    }

    /// `{side}.{rest}`
    pub fn side(side: Side, rest: &str) -> Self {
        Self(format!("{}.{rest}", side.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segment-aware prefix test: `left.schedule` covers
    /// `left.schedule.monday.alarm.time` but not `left.scheduler`.
    pub fn is_under(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('.');
        self.0 == prefix
            || (self.0.starts_with(prefix) && self.0.as_bytes().get(prefix.len()) == Some(&b'.'))
    }

    /// RFC 6901 pointer for the same location (`/left/schedule/...`).
    pub fn to_pointer(&self) -> String {
        self.0
            .split('.')
            .fold(String::with_capacity(self.0.len() + 1), |mut acc, seg| {
                acc.push('/');
                acc.push_str(&seg.replace('~', "~0").replace('/', "~1"));
                acc
            })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Flatten a JSON view into `path -> leaf value`.
pub fn flatten(view: &Value) -> BTreeMap<FieldPath, Value> {
    let mut out = BTreeMap::new();
    if let Value::Object(map) = view {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut out);
        }
    }
    out
}

fn flatten_into(prefix: String, value: &Value, out: &mut BTreeMap<FieldPath, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(format!("{prefix}.{key}"), child, out);
            }
        }
        leaf => {
            out.insert(FieldPath(prefix), leaf.clone());
        }
    }
}
