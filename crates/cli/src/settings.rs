//! Configuration layering for the CLI.
//!
//! Lowest to highest precedence: built-in defaults, the config file,
//! `COMPBENCH_*` environment variables, command-line flags.

use anyhow::Context;
use compbench_core::{HarnessConfig, HarnessError, HarnessOverrides};
use std::path::Path;

/// Prefix of environment variables read as configuration.
pub const ENV_PREFIX: &str = "COMPBENCH";

/// Load the file and environment override layer.
///
/// A missing `--config` means only the environment is consulted. An explicit
/// path that does not exist is an error.
pub fn load_overrides(config_file: Option<&Path>) -> anyhow::Result<HarnessOverrides> {
    let mut builder = config::Config::builder();
    if let Some(path) = config_file {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .ignore_empty(true),
    );

    let overrides = builder
        .build()
        .and_then(|settings| settings.try_deserialize::<HarnessOverrides>())
        .map_err(|e| HarnessError::config(e.to_string()));

    overrides.with_context(|| match config_file {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "failed to load configuration from the environment".to_string(),
    })
}

/// Resolve the effective configuration from defaults, file/env and flags.
pub fn resolve(
    config_file: Option<&Path>,
    flags: HarnessOverrides,
) -> anyhow::Result<HarnessConfig> {
    let file_and_env = load_overrides(config_file)?;
    Ok(HarnessConfig::default().apply(file_and_env).apply(flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use compbench_core::WorkloadSize;
    use std::time::Duration;

    #[test]
    fn test_file_layer_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compbench.toml");
        std::fs::write(
            &path,
            r#"
workload_count = 8
workload_size = "medium"
target_timeout_ms = 30000

[[targets]]
name = "tsc"
command = "npx"
args = ["tsc", "--noEmit"]

[[targets]]
name = "swc"
command = "npx"
args = ["swc", "src"]
"#,
        )
        .unwrap();

        let flags = HarnessOverrides {
            workload_count: Some(3),
            ..Default::default()
        };
        let config = resolve(Some(&path), flags).unwrap();

        assert_eq!(config.workload_count, 3);
        assert_eq!(config.workload_size, WorkloadSize::Medium);
        assert_eq!(config.target_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].args(), ["tsc", "--noEmit"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(
            Some(&dir.path().join("absent.toml")),
            HarnessOverrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_unknown_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compbench.toml");
        std::fs::write(&path, "workload_size = \"enormous\"\n").unwrap();

        let err = resolve(Some(&path), HarnessOverrides::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Config(_))
        ));
    }
}
