use std::collections::HashSet;
use std::path::Path;
use crate::errors::HyperMailError;
use super::types::HyperMailConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<HyperMailConfig, HyperMailError> {
    if !path.exists() {
        return Err(HyperMailError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(HyperMailError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse and validate configuration from YAML text.
pub fn parse_config_str(content: &str) -> Result<HyperMailConfig, HyperMailError> {
    // An empty file is a valid "all defaults" config
    if content.trim().is_empty() {
        return Ok(HyperMailConfig::default());
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    // JSON Schema validation
    validate_schema(&yaml)?;

    // Parse into typed config
    let config: HyperMailConfig = serde_yaml::from_value(yaml)?;

    // Semantic range checks
    validate_ranges(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), HyperMailError> {
    // Convert YAML value to JSON for schema validation
    let json_str = serde_json::to_string(yaml)
        .map_err(|e| HyperMailError::Config(format!("Config conversion error: {}", e)))?;
    let json_value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| HyperMailError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| HyperMailError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; validate_ranges rejects the values that matter
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Reject values the simulator or backend client cannot work with.
fn validate_ranges(config: &HyperMailConfig) -> Result<(), HyperMailError> {
    if let Some(backend) = &config.backend {
        if let Some(url) = &backend.base_url {
            if url.trim().is_empty() {
                return Err(HyperMailError::Config("backend.base_url must not be empty".into()));
            }
        }
        if backend.timeout_secs == Some(0) {
            return Err(HyperMailError::Config("backend.timeout_secs must be at least 1".into()));
        }
    }

    if let Some(sim) = &config.simulator {
        if sim.tick_count == Some(0) {
            return Err(HyperMailError::Config("simulator.tick_count must be at least 1".into()));
        }
        if let Some(jitter) = sim.jitter {
            if !(0.0..1.0).contains(&jitter) {
                return Err(HyperMailError::Config(format!(
                    "simulator.jitter must be in [0, 1), got {}",
                    jitter
                )));
            }
        }
        if let Some(range) = &sim.complexity {
            if range.min <= 0.0 || range.max <= 0.0 || range.min > range.max {
                return Err(HyperMailError::Config(format!(
                    "simulator.complexity must satisfy 0 < min <= max, got {}..{}",
                    range.min, range.max
                )));
            }
        }
        if let Some(range) = &sim.inter_stage_delay_ms {
            if range.min > range.max {
                return Err(HyperMailError::Config(format!(
                    "simulator.inter_stage_delay_ms min ({}) exceeds max ({})",
                    range.min, range.max
                )));
            }
        }
        if let Some(stages) = &sim.stages {
            if stages.is_empty() {
                return Err(HyperMailError::Config("simulator.stages must not be empty".into()));
            }
            let mut seen = HashSet::new();
            for stage in stages {
                if !seen.insert(stage.id.as_str()) {
                    return Err(HyperMailError::Config(format!(
                        "Duplicate stage id: {}",
                        stage.id
                    )));
                }
                if stage.estimated_duration_secs <= 0.0 {
                    return Err(HyperMailError::Config(format!(
                        "Stage '{}' needs a positive estimated_duration_secs",
                        stage.id
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FactorRange, FailurePolicy, SimulatorConfig, StageConfig};
    use std::io::Write;

    fn stage(id: &str) -> StageConfig {
        StageConfig {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            estimated_duration_secs: 1.0,
            messages: vec![],
        }
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
backend:
  base_url: "http://10.0.0.5:8000"
  timeout_secs: 30
simulator:
  tick_count: 10
  jitter: 0.1
  complexity: { min: 0.9, max: 1.1 }
  inter_stage_delay_ms: { min: 100, max: 300 }
  fast_forward_interval_ms: 50
  seed: 42
  failure_policy: freeze
sender:
  cc: "team@example.com"
"#;
        let config = parse_config_str(yaml).unwrap();
        assert_eq!(config.base_url(), "http://10.0.0.5:8000");
        let sim = config.simulator.unwrap();
        assert_eq!(sim.tick_count, Some(10));
        assert_eq!(sim.seed, Some(42));
        assert_eq!(sim.failure_policy, Some(FailurePolicy::Freeze));
        assert_eq!(config.sender.unwrap().cc.as_deref(), Some("team@example.com"));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config_str("  \n").unwrap();
        assert!(config.simulator.is_none());
    }

    #[test]
    fn test_zero_ticks_rejected() {
        assert!(parse_config_str("simulator:\n  tick_count: 0\n").is_err());
    }

    #[test]
    fn test_inverted_complexity_rejected() {
        let config = HyperMailConfig {
            simulator: Some(SimulatorConfig {
                complexity: Some(FactorRange { min: 1.5, max: 1.0 }),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_ranges(&config).is_err());
    }

    #[test]
    fn test_jitter_out_of_range_rejected() {
        assert!(parse_config_str("simulator:\n  jitter: 1.0\n").is_err());
    }

    #[test]
    fn test_duplicate_stage_ids_rejected() {
        let config = HyperMailConfig {
            simulator: Some(SimulatorConfig {
                stages: Some(vec![stage("a"), stage("a")]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = validate_ranges(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate stage id"));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(parse_config_str("backend:\n  base_url: \"\"\n").is_err());
    }

    #[tokio::test]
    async fn test_parse_config_missing_file() {
        let err = parse_config(Path::new("/nonexistent/hypermail.yaml")).await.unwrap_err();
        assert!(matches!(err, HyperMailError::Config(_)));
    }

    #[tokio::test]
    async fn test_parse_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend:\n  base_url: \"http://127.0.0.1:9000\"").unwrap();
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }
}
