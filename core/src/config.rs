use std::env::{self, VarError};

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result, SinkError};
use crate::sink::file::{stage, FileSinkBuilder};
use crate::sink::{FileSink, SinkDefaults};

pub const CONFIG_ENV_VAR: &str = "TUPLE_SINK_CONFIG";

/// File sink settings as read from YAML. Every field is optional; missing
/// values take the builder defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SinkSettings {
    pub path: Option<String>,
    pub filename: Option<String>,
    pub separator: Option<String>,
    pub buffer_size: Option<i64>,
    #[serde(default)]
    pub create_dirs: bool,
}

/// Loads settings from `config_path`, or from the environment when no path is given.
/// Falls back to the defaults if neither source is present.
pub fn load_config(config_path: Option<&str>) -> Result<SinkSettings> {
    match config_path {
        Some(path) => SinkSettings::from_file(path),
        None if env::var_os(CONFIG_ENV_VAR).is_some() => SinkSettings::from_env(),
        None => Ok(SinkSettings::default()),
    }
}

impl SinkSettings {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            origin: path.to_string(),
            error: Box::new(e),
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_env_var(CONFIG_ENV_VAR)
    }

    fn from_env_var(name: &str) -> Result<Self> {
        let config_str = env::var(name).map_err(|e| match e {
            VarError::NotPresent => ConfigError::MissingField {
                field: name.to_string(),
            },
            VarError::NotUnicode(_) => ConfigError::LoadFailed {
                origin: format!("environment variable {}", name),
                error: Box::new(e),
            },
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: SinkSettings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Strict check of the settings. The builder silently replaces these
    /// values with defaults; this rejects them instead.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_deref() == Some("") {
            return Err(validation_failed("path cannot be empty"));
        }
        if self.filename.as_deref() == Some("") {
            return Err(validation_failed("filename cannot be empty"));
        }
        if self.separator.as_deref() == Some("") {
            return Err(validation_failed("separator cannot be empty"));
        }
        if let Some(size) = self.buffer_size {
            if size <= 0 {
                return Err(validation_failed(&format!(
                    "buffer_size must be positive, got {}",
                    size
                )));
            }
        }
        Ok(())
    }

    pub fn into_builder(self) -> FileSinkBuilder<stage::Optionals> {
        self.into_builder_with(SinkDefaults::default())
    }

    pub fn into_builder_with(self, defaults: SinkDefaults) -> FileSinkBuilder<stage::Optionals> {
        let builder = FileSinkBuilder::new(defaults)
            .path(self.path.as_deref())
            .filename(self.filename.as_deref())
            .with_separator(self.separator.as_deref())
            .create_dirs(self.create_dirs);
        match self.buffer_size {
            Some(size) => builder.buffer_size(size),
            None => builder,
        }
    }

    pub fn build_sink(self) -> FileSink {
        self.into_builder().create()
    }
}

fn validation_failed(reason: &str) -> SinkError {
    SinkError::Config(ConfigError::ValidationFailed {
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SerializationError;
    use crate::sink::file::{DEFAULT_BUFFER_SIZE, DEFAULT_SEPARATOR};
    use std::path::Path;

    #[test]
    fn test_parse_yaml_settings() {
        let settings = SinkSettings::from_yaml(
            r#"
path: /var/spool
filename: events.psv
separator: ","
buffer_size: 4096
create_dirs: true
"#,
        )
        .unwrap();

        assert_eq!(settings.path.as_deref(), Some("/var/spool"));
        assert_eq!(settings.buffer_size, Some(4096));
        assert!(settings.create_dirs);
        settings.validate().unwrap();

        let config = settings.into_builder().config();
        assert_eq!(config.location, Path::new("/var/spool").join("events.psv"));
        assert_eq!(config.separator, ",");
        assert_eq!(config.buffer_size, 4096);
        assert!(config.create_dirs);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = SinkSettings::from_yaml("filename: only-name\n").unwrap();
        let config = settings.into_builder().config();

        assert_eq!(config.separator, DEFAULT_SEPARATOR);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(!config.create_dirs);
    }

    #[test]
    fn test_validate_rejects_lenient_inputs() {
        let cases = [
            SinkSettings {
                path: Some(String::new()),
                ..Default::default()
            },
            SinkSettings {
                filename: Some(String::new()),
                ..Default::default()
            },
            SinkSettings {
                separator: Some(String::new()),
                ..Default::default()
            },
            SinkSettings {
                buffer_size: Some(-5),
                ..Default::default()
            },
        ];

        for settings in cases {
            let err = settings.validate().unwrap_err();
            assert!(matches!(
                err,
                SinkError::Config(ConfigError::ValidationFailed { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = SinkSettings::from_yaml("seperator: \",\"\n").unwrap_err();
        assert!(matches!(
            err,
            SinkError::Serialization(SerializationError::Yaml { .. })
        ));
    }

    #[test]
    fn test_missing_file_reports_load_failure() {
        let err = SinkSettings::from_file("/nonexistent/sink.yaml").unwrap_err();
        assert!(matches!(
            err,
            SinkError::Config(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_unset_env_var_reports_missing_field() {
        let err = SinkSettings::from_env_var("TUPLE_SINK_CONFIG_UNSET_IN_TESTS").unwrap_err();
        assert!(matches!(
            err,
            SinkError::Config(ConfigError::MissingField { ref field })
                if field == "TUPLE_SINK_CONFIG_UNSET_IN_TESTS"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_env_var_reports_load_failure() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let name = "TUPLE_SINK_CONFIG_NOT_UNICODE_IN_TESTS";
        // Only this test touches this variable.
        unsafe { env::set_var(name, OsString::from_vec(vec![b'p', 0xff, b'x'])) };

        let err = SinkSettings::from_env_var(name).unwrap_err();
        assert!(matches!(
            err,
            SinkError::Config(ConfigError::LoadFailed { .. })
        ));
        assert!(err.to_string().contains(name));
    }
}
