//! Cost attribution
//!
//! Per-call attribution wins over configured defaults; an unset or empty value
//! falls through to the next source. Environment always resolves to something,
//! defaulting to [`DEFAULT_ENVIRONMENT`](crate::DEFAULT_ENVIRONMENT).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribution supplied with a single tracked call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Product feature the call belongs to (e.g. "chat")
    pub feature: Option<String>,
    /// Owning team
    pub team: Option<String>,
    /// Owning project
    pub project: Option<String>,
    /// Finance cost center
    pub cost_center: Option<String>,
    /// End user the call was made for
    pub user_id: Option<String>,
    /// Deployment environment
    pub environment: Option<String>,
    /// Free-form scalar metadata, kept in insertion order
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Attribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Add one metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge this call-level attribution with configured defaults
    pub fn resolve(&self, defaults: &AttributionDefaults) -> Attribution {
        Attribution {
            feature: pick(&self.feature, &defaults.feature),
            team: pick(&self.team, &defaults.team),
            project: pick(&self.project, &defaults.project),
            cost_center: pick(&self.cost_center, &defaults.cost_center),
            user_id: pick(&self.user_id, &None),
            environment: pick(&self.environment, &defaults.environment)
                .or_else(|| Some(crate::DEFAULT_ENVIRONMENT.to_string())),
            metadata: self.metadata.clone(),
        }
    }
}

/// Attribution values applied when a call does not supply its own
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionDefaults {
    pub feature: Option<String>,
    pub team: Option<String>,
    pub project: Option<String>,
    pub cost_center: Option<String>,
    pub environment: Option<String>,
}

fn pick(call: &Option<String>, default: &Option<String>) -> Option<String> {
    non_empty(call).or_else(|| non_empty(default))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}
