//! Typed configuration parsed from the init-time parameter blob.
//!
//! A small typed struct, a `thiserror` error enum distinguishing "missing"
//! from "invalid", parsed once at startup and never touched again.

use edc_protocol::WireFormat;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("could not decode config blob: {0}")]
    Decode(#[from] edc_protocol::CodecError),
}

/// Which of the three Budget Controller variants is active for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PolicyKind {
    PowerCap,
    EnergyBudget,
    #[serde(rename = "ReducePC")]
    ReducePC,
}

/// As-deserialized shape of the config blob; every field optional so that
/// `EngineConfig::from_slice` can supply spec-mandated defaults and report
/// precisely which *required* field (policy, p_idle, p_comp) was absent.
#[derive(Debug, Deserialize)]
struct RawConfig {
    policy: Option<PolicyKind>,
    budget_fraction: Option<f64>,
    period_length: Option<f64>,
    p_idle: Option<f64>,
    p_comp: Option<f64>,
}

/// Resolved, validated run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub policy: PolicyKind,
    pub budget_fraction: f64,
    pub period_length: f64,
    pub p_idle: f64,
    pub p_comp: f64,
}

impl EngineConfig {
    pub const DEFAULT_BUDGET_FRACTION: f64 = 1.0;
    pub const DEFAULT_PERIOD_LENGTH: f64 = 600.0;

    /// Parses and validates the init-time parameter blob under the wire
    /// format selected by the ABI's init flags.
    pub fn from_slice(bytes: &[u8], format: WireFormat) -> Result<Self, ConfigError> {
        let raw: RawConfig = match format {
            WireFormat::Json => serde_json::from_slice(bytes)
                .map_err(edc_protocol::CodecError::from)?,
            WireFormat::Binary => ciborium::de::from_reader(bytes)
                .map_err(edc_protocol::CodecError::from)?,
        };
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let policy = raw.policy.ok_or(ConfigError::MissingField("policy"))?;
        let p_idle = raw.p_idle.ok_or(ConfigError::MissingField("p_idle"))?;
        let p_comp = raw.p_comp.ok_or(ConfigError::MissingField("p_comp"))?;
        let budget_fraction = raw.budget_fraction.unwrap_or(Self::DEFAULT_BUDGET_FRACTION);
        let period_length = raw.period_length.unwrap_or(Self::DEFAULT_PERIOD_LENGTH);

        if !(budget_fraction > 0.0 && budget_fraction <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "budget_fraction",
                reason: format!("{budget_fraction} not in (0, 1]"),
            });
        }
        if period_length <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "period_length",
                reason: format!("{period_length} must be positive"),
            });
        }
        if p_idle < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "p_idle",
                reason: format!("{p_idle} must be non-negative"),
            });
        }
        if p_comp <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "p_comp",
                reason: format!("{p_comp} must be positive"),
            });
        }

        Ok(Self {
            policy,
            budget_fraction,
            period_length,
            p_idle,
            p_comp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(s: &str) -> Result<EngineConfig, ConfigError> {
        EngineConfig::from_slice(s.as_bytes(), WireFormat::Json)
    }

    #[test]
    fn defaults_apply_when_optional_fields_absent() {
        let cfg = json(r#"{"policy":"PowerCap","p_idle":100.0,"p_comp":200.0}"#).unwrap();
        assert_eq!(cfg.budget_fraction, EngineConfig::DEFAULT_BUDGET_FRACTION);
        assert_eq!(cfg.period_length, EngineConfig::DEFAULT_PERIOD_LENGTH);
    }

    #[test]
    fn missing_policy_is_an_error() {
        let err = json(r#"{"p_idle":100.0,"p_comp":200.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("policy")));
    }

    #[test]
    fn budget_fraction_out_of_range_is_rejected() {
        let err = json(
            r#"{"policy":"EnergyBudget","p_idle":100.0,"p_comp":200.0,"budget_fraction":1.5}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "budget_fraction",
                ..
            }
        ));
    }

    #[test]
    fn reduce_pc_tag_parses() {
        let cfg = json(r#"{"policy":"ReducePC","p_idle":100.0,"p_comp":200.0}"#).unwrap();
        assert_eq!(cfg.policy, PolicyKind::ReducePC);
    }

    #[test]
    fn non_positive_p_comp_is_rejected() {
        let err = json(r#"{"policy":"PowerCap","p_idle":100.0,"p_comp":0.0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "p_comp", .. }
        ));
    }
}
