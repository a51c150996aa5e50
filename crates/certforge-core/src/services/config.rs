/// Environment driven configuration of the Lambda functions
use crate::constants::{
    DEFAULT_PARAMETER_PREFIX, METRICS_NAMESPACE, POLL_INTERVAL_SECONDS, POLL_MAX_ROUNDS,
};
use crate::error::CertforgeError;
use crate::utils::poll::PollSettings;
use std::time::Duration;

/// Settings read once at process start
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Wait state machine; required by the dispatcher only
    pub state_machine_arn: Option<String>,
    pub parameter_prefix: String,
    /// When set, delivery tokens live in this DynamoDB table instead of SSM
    pub idempotency_table: Option<String>,
    pub metrics_namespace: String,
    pub metrics_enabled: bool,
    pub poll: PollSettings,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            state_machine_arn: None,
            parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
            idempotency_table: None,
            metrics_namespace: METRICS_NAMESPACE.to_string(),
            metrics_enabled: true,
            poll: PollSettings::default(),
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, CertforgeError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CertforgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let metrics_enabled = match get("METRICS_ENABLED") {
            Some(value) => parse_bool("METRICS_ENABLED", &value)?,
            None => true,
        };
        let max_rounds = match get("POLL_MAX_ROUNDS") {
            Some(value) => parse_number("POLL_MAX_ROUNDS", &value)?,
            None => POLL_MAX_ROUNDS,
        };
        if max_rounds == 0 {
            return Err(CertforgeError::Config(
                "POLL_MAX_ROUNDS must be at least 1".to_string(),
            ));
        }
        let interval = match get("POLL_INTERVAL_SECONDS") {
            Some(value) => parse_number("POLL_INTERVAL_SECONDS", &value)?,
            None => POLL_INTERVAL_SECONDS,
        };

        Ok(Self {
            state_machine_arn: get("STATE_MACHINE_ARN"),
            parameter_prefix: get("SSM_PARAMETER_PREFIX")
                .unwrap_or_else(|| DEFAULT_PARAMETER_PREFIX.to_string()),
            idempotency_table: get("IDEMPOTENCY_TABLE"),
            metrics_namespace: get("METRICS_NAMESPACE")
                .unwrap_or_else(|| METRICS_NAMESPACE.to_string()),
            metrics_enabled,
            poll: PollSettings::new(max_rounds, Duration::from_secs(interval)),
        })
    }

    pub fn require_state_machine_arn(&self) -> Result<&str, CertforgeError> {
        self.state_machine_arn
            .as_deref()
            .ok_or_else(|| CertforgeError::Config("STATE_MACHINE_ARN not set".to_string()))
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, CertforgeError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(CertforgeError::Config(format!(
            "{} must be a boolean, got {}",
            name, other
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, CertforgeError> {
    value.trim().parse().map_err(|_| {
        CertforgeError::Config(format!("{} must be a positive number, got {}", name, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ProviderConfig, CertforgeError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProviderConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert!(config.require_state_machine_arn().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("STATE_MACHINE_ARN", "arn:aws:states:eu-west-1:999999999999:stateMachine:wait"),
            ("SSM_PARAMETER_PREFIX", "/custom"),
            ("IDEMPOTENCY_TABLE", "tokens"),
            ("METRICS_ENABLED", "false"),
            ("POLL_MAX_ROUNDS", "5"),
            ("POLL_INTERVAL_SECONDS", "0"),
        ])
        .unwrap();

        assert_eq!(
            config.require_state_machine_arn().unwrap(),
            "arn:aws:states:eu-west-1:999999999999:stateMachine:wait"
        );
        assert_eq!(config.parameter_prefix, "/custom");
        assert_eq!(config.idempotency_table.as_deref(), Some("tokens"));
        assert!(!config.metrics_enabled);
        assert_eq!(config.poll, PollSettings::immediate(5));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("METRICS_ENABLED", "maybe")]),
            Err(CertforgeError::Config(_))
        ));
        assert!(matches!(
            config(&[("POLL_MAX_ROUNDS", "-1")]),
            Err(CertforgeError::Config(_))
        ));
    }

    #[test]
    fn test_zero_poll_rounds_rejected() {
        match config(&[("POLL_MAX_ROUNDS", "0")]) {
            Err(CertforgeError::Config(message)) => assert!(message.contains("POLL_MAX_ROUNDS")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(
            config(&[("POLL_MAX_ROUNDS", "1")]).unwrap().poll.max_rounds,
            1
        );
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config(&[("SSM_PARAMETER_PREFIX", " "), ("IDEMPOTENCY_TABLE", "")]).unwrap();
        assert_eq!(config.parameter_prefix, "/certforge");
        assert_eq!(config.idempotency_table, None);
    }
}
