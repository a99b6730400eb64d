use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_addr: String,
}

/// Knobs for the benchmark computation itself.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    /// Minimum peer sample size before a comparison is disclosed.
    #[serde(default = "default_sample_threshold")]
    pub sample_threshold: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            sample_threshold: default_sample_threshold(),
        }
    }
}

fn default_sample_threshold() -> usize {
    10
}

/// Batch/retry settings for the backfill sink.
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_batch_size() -> usize {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub backfill: BackfillConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("BENCHMARK_CONFIG").unwrap_or_else(|_| "benchmark-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_applies_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            uri = "postgres://localhost/benchmark"
            max_connections = 4

            [api]
            bind_addr = "127.0.0.1:8080"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.benchmark.sample_threshold, 10);
        assert_eq!(cfg.backfill.batch_size, 500);
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn explicit_threshold_overrides_default() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            uri = "postgres://localhost/benchmark"
            max_connections = 4

            [api]
            bind_addr = "127.0.0.1:8080"

            [benchmark]
            sample_threshold = 5

            [metrics]
            bind_addr = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.benchmark.sample_threshold, 5);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "127.0.0.1:9000");
    }
}
