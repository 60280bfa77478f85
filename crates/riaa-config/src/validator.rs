//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_bridge(config, &mut result);
        Self::validate_panel(config, &mut result);
        Self::validate_trust(config, &mut result);
        Self::validate_recommend(config, &mut result);
        Self::validate_server(config, &mut result);

        result
    }

    fn validate_bridge(config: &Config, result: &mut ValidationResult) {
        if config.bridge.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "bridge.poll_interval_ms",
                "poll interval must be greater than 0",
            ));
        }
        if config.bridge.poll_interval_ms < 250 {
            result.add_warning(ValidationWarning::new(
                "bridge.poll_interval_ms",
                "sub-250ms polling floods the host selection API",
            ));
        }
        if config.bridge.discovery_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "bridge.discovery_timeout_ms",
                "discovery timeout must be greater than 0",
            ));
        }
        if config.bridge.probe_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "bridge.probe_interval_ms",
                "probe interval must be greater than 0",
            ));
        }
        if config.bridge.probe_interval_ms > config.bridge.discovery_timeout_ms {
            result.add_warning(ValidationWarning::new(
                "bridge.probe_interval_ms",
                "probe interval exceeds the discovery timeout; only one probe will run",
            ));
        }
        if config.bridge.resize_max_attempts == 0 {
            result.add_error(ValidationError::new(
                "bridge.resize_max_attempts",
                "resize attempt cap must be greater than 0",
            ));
        }
    }

    fn validate_panel(config: &Config, result: &mut ValidationResult) {
        if config.panel.handshake_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "panel.handshake_interval_ms",
                "handshake interval must be greater than 0",
            ));
        }
        if config.panel.handshake_max_attempts == 0 {
            result.add_error(ValidationError::new(
                "panel.handshake_max_attempts",
                "handshake attempt cap must be greater than 0",
            ));
        }
        if config.panel.handshake_max_attempts > 120 {
            result.add_warning(ValidationWarning::new(
                "panel.handshake_max_attempts",
                "handshake cap above 120 keeps retrying for minutes against a dead host",
            ));
        }
    }

    fn validate_trust(config: &Config, result: &mut ValidationResult) {
        for host in &config.trust.allowed_hosts {
            if host.is_empty() {
                result.add_error(ValidationError::new(
                    "trust.allowed_hosts",
                    "allow-list entries cannot be empty",
                ));
            }
            if host.contains("://") || host.contains('/') {
                result.add_error(ValidationError::new(
                    "trust.allowed_hosts",
                    format!("'{host}' must be a bare domain, not a URL"),
                ));
            }
        }
        if config.trust.dev_override == Some(true) {
            result.add_warning(ValidationWarning::new(
                "trust.dev_override",
                "development mode is forced; every message origin will be accepted",
            ));
        }
    }

    fn validate_recommend(config: &Config, result: &mut ValidationResult) {
        match url::Url::parse(&config.recommend.endpoint) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    result.add_error(ValidationError::new(
                        "recommend.endpoint",
                        format!("unsupported scheme '{}'", parsed.scheme()),
                    ));
                }
            }
            Err(e) => {
                result.add_error(ValidationError::new(
                    "recommend.endpoint",
                    format!("not a valid URL: {e}"),
                ));
            }
        }
        if config.recommend.timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "recommend.timeout_ms",
                "timeout must be greater than 0",
            ));
        }
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "port cannot be 0"));
        }
        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "host cannot be empty"));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
