// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Setup-time errors.
//!
//! Everything that can be wrong with a scenario is caught once, before the
//! first step runs. The hot loop itself never fails: out-of-range values are
//! clamped and logged, missing stresses and flows read as zero.

/// Raised while resolving a scenario or building a model, never mid-run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown topology policy `{0}` (expected clustered, grid or random)")]
    UnknownTopology(String),

    #[error("node count must be positive")]
    EmptyNetwork,

    #[error("timestep must be positive, got {0}")]
    NonPositiveTimestep(f64),

    #[error("unknown stress kind `{0}`")]
    UnknownStress(String),

    #[error("stress `{kind}` on node {node} must lie in [0, 1], got {value}")]
    StressOutOfRange { node: u32, kind: String, value: f64 },

    #[error("stress schedule names node {node} but the network has {count} nodes")]
    UnknownNode { node: u32, count: u32 },

    #[error("unknown model preset `{0}` (expected federation, integrated or seeded)")]
    UnknownModel(String),

    #[error("model `{model}` is malformed: {reason}")]
    InvalidModel { model: String, reason: String },

    #[error("invalid scenario json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid_model(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidModel {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = ConfigError::UnknownTopology("ring".into());
        assert!(err.to_string().contains("ring"));

        let err = ConfigError::StressOutOfRange {
            node: 3,
            kind: "drought".into(),
            value: 1.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("drought") && msg.contains('3') && msg.contains("1.5"));
    }

    #[test]
    fn test_json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
