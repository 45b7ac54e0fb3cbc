//! Metric identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Free-form diagnostic data attached to a key (e.g. a call-site backtrace)
pub type KeyExtra = BTreeMap<String, serde_json::Value>;

/// Identity of a metric bucket
///
/// Two keys are the same metric when `metric_name` and `scope` match;
/// `description` and `extra` ride along but take no part in equality or
/// hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricKey {
    /// Metric name, conventionally `Category/operation`
    pub metric_name: String,

    /// Name of the enclosing call, `None` for a transaction's root
    pub scope: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<KeyExtra>,
}

impl MetricKey {
    /// Unscoped key with no description
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
            scope: None,
            description: None,
            extra: None,
        }
    }

    /// Key scoped under an enclosing call
    pub fn scoped(metric_name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::new(metric_name).with_scope(Some(scope.into()))
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Attach one diagnostic entry under `name`
    pub fn with_extra(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra
            .get_or_insert_with(KeyExtra::new)
            .insert(name.into(), value);
        self
    }

    /// First path segment of the name (`"ActiveRecord"` for `"ActiveRecord/find"`)
    pub fn category(&self) -> &str {
        self.metric_name
            .split('/')
            .next()
            .unwrap_or(&self.metric_name)
    }

    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }
}

impl PartialEq for MetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.metric_name == other.metric_name && self.scope == other.scope
    }
}

impl Eq for MetricKey {}

impl Hash for MetricKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metric_name.hash(state);
        self.scope.hash(state);
    }
}
