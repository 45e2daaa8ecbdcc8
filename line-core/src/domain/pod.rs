//! Kubernetes pod types
//!
//! Only the fields the runner touches are typed. Everything else in a pod
//! template is carried through untouched via flattened maps so the template
//! reaches the API server exactly as configured.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Environment variable set on a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A container declared in a pod template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    /// Remaining container fields (args, command, resources, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pod specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,

    /// Remaining spec fields (volumes, restartPolicy, nodeSelector, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PodSpec {
    /// Appends the given variables to every container
    ///
    /// Existing variables are kept; the appended ones come last so they win
    /// when the kubelet resolves duplicate names.
    pub fn inject_env(&mut self, vars: &[EnvVar]) {
        for container in &mut self.containers {
            container.env.extend(vars.iter().cloned());
        }
    }
}

/// Object metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub labels: Map<String, Value>,
}

/// Pod lifecycle phase as reported by the API server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PodPhase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Also used for any phase string this crate does not recognise
    #[serde(other)]
    Unknown,
}

/// Observed pod status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub phase: PodPhase,
}

/// A pod object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: PodSpec,

    #[serde(default, skip_serializing)]
    pub status: PodStatus,
}
