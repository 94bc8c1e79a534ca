//! Configuration loading traits and types.
//!
//! Every hoist process reads the same optional TOML file. Each section and
//! field has a default matching [`crate::consts`], so an absent file or an
//! empty table reproduces the reference behavior.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "hoist-bench-01"
//!
//! [axis.z]
//! upper = 9.9
//! step = 0.01
//!
//! [console]
//! tick_ms = 15
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::consts::*;
use crate::motion::{Axis, AxisLimits};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across all hoist processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "hoist".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// FIFO paths of every channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkPaths {
    pub command_x: PathBuf,
    pub command_z: PathBuf,
    pub position_x: PathBuf,
    pub position_z: PathBuf,
    pub issuer_pid: PathBuf,
}

impl Default for LinkPaths {
    fn default() -> Self {
        Self {
            command_x: PathBuf::from(FIFO_COMMAND_X),
            command_z: PathBuf::from(FIFO_COMMAND_Z),
            position_x: PathBuf::from(FIFO_POSITION_X),
            position_z: PathBuf::from(FIFO_POSITION_Z),
            issuer_pid: PathBuf::from(FIFO_ISSUER_PID),
        }
    }
}

impl LinkPaths {
    /// CommandLink of `axis`.
    pub fn command(&self, axis: Axis) -> &Path {
        match axis {
            Axis::X => &self.command_x,
            Axis::Z => &self.command_z,
        }
    }

    /// PositionLink of `axis`.
    pub fn position(&self, axis: Axis) -> &Path {
        match axis {
            Axis::X => &self.position_x,
            Axis::Z => &self.position_z,
        }
    }
}

/// Motion parameters of one axis.
///
/// Read from TOML through [`AxisOverrides`], so a section may name any
/// subset of fields and the rest come from [`AxisConfig::for_axis`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct AxisConfig {
    /// Lower travel bound (reset target).
    pub lower: f64,
    /// Upper travel bound.
    pub upper: f64,
    /// Distance moved per tick.
    pub step: f64,
    /// Half-width of the uniform estimate noise.
    pub noise_amplitude: f64,
}

impl AxisConfig {
    /// Reference parameters for `axis`.
    pub const fn for_axis(axis: Axis) -> Self {
        let limits = axis.default_limits();
        Self {
            lower: limits.lower,
            upper: limits.upper,
            step: AXIS_STEP,
            noise_amplitude: NOISE_AMPLITUDE,
        }
    }

    pub const fn limits(&self) -> AxisLimits {
        AxisLimits {
            lower: self.lower,
            upper: self.upper,
        }
    }

    /// Validate envelope, step and noise.
    ///
    /// Every field must be finite; the noise range is built from
    /// `noise_amplitude` and would not accept an infinite width.
    pub fn validate(&self, axis: Axis) -> Result<(), ConfigError> {
        for (name, value) in [
            ("lower", self.lower),
            ("upper", self.upper),
            ("step", self.step),
            ("noise_amplitude", self.noise_amplitude),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "axis {axis}: {name} must be finite, got {value}"
                )));
            }
        }
        if !(self.lower < self.upper) {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: lower ({}) must be below upper ({})",
                self.lower, self.upper
            )));
        }
        if !(self.step > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: step must be positive, got {}",
                self.step
            )));
        }
        if !(self.noise_amplitude >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "axis {axis}: noise_amplitude must be non-negative, got {}",
                self.noise_amplitude
            )));
        }
        Ok(())
    }
}

/// Fields present in one `[axis.*]` table.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AxisOverrides {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub step: Option<f64>,
    pub noise_amplitude: Option<f64>,
}

impl AxisOverrides {
    /// Apply the overrides on top of the reference parameters of `axis`.
    pub fn resolve(self, axis: Axis) -> AxisConfig {
        let reference = AxisConfig::for_axis(axis);
        AxisConfig {
            lower: self.lower.unwrap_or(reference.lower),
            upper: self.upper.unwrap_or(reference.upper),
            step: self.step.unwrap_or(reference.step),
            noise_amplitude: self.noise_amplitude.unwrap_or(reference.noise_amplitude),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AxesOverrides {
    x: AxisOverrides,
    z: AxisOverrides,
}

impl From<AxesOverrides> for AxesConfig {
    fn from(raw: AxesOverrides) -> Self {
        Self {
            x: raw.x.resolve(Axis::X),
            z: raw.z.resolve(Axis::Z),
        }
    }
}

/// Per-axis sections (`[axis.x]`, `[axis.z]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "AxesOverrides")]
pub struct AxesConfig {
    pub x: AxisConfig,
    pub z: AxisConfig,
}

impl Default for AxesConfig {
    fn default() -> Self {
        AxesOverrides::default().into()
    }
}

impl AxesConfig {
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Z => &self.z,
        }
    }
}

/// Motor controller loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotorConfig {
    /// Tick period [ms].
    pub tick_ms: u64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            tick_ms: MOTOR_TICK_MS,
        }
    }
}

impl MotorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Inspection console loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Tick period [ms].
    pub tick_ms: u64,
    /// Magnitude below which both estimates count as "at zero".
    pub reset_epsilon: f64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            tick_ms: CONSOLE_TICK_MS,
            reset_epsilon: RESET_EPSILON,
        }
    }
}

impl ConsoleConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Append-only log file shared by all processes.
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Complete configuration read by every hoist process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoistConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub links: LinkPaths,
    #[serde(default)]
    pub axis: AxesConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl HoistConfig {
    /// Load from `path`, or use defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        for axis in Axis::ALL {
            self.axis.get(axis).validate(axis)?;
        }
        if self.motor.tick_ms == 0 {
            return Err(ConfigError::ValidationError(
                "motor.tick_ms must be positive".to_string(),
            ));
        }
        if self.console.tick_ms == 0 {
            return Err(ConfigError::ValidationError(
                "console.tick_ms must be positive".to_string(),
            ));
        }
        if !(self.console.reset_epsilon > 0.0 && self.console.reset_epsilon.is_finite()) {
            return Err(ConfigError::ValidationError(
                "console.reset_epsilon must be positive and finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
            assert_eq!(level.as_directive(), text);
        }
    }

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = HoistConfig::default();
        config.validate().unwrap();
        assert_eq!(config.axis.z.upper, 9.9);
        assert_eq!(config.axis.z.step, 0.01);
        assert_eq!(config.motor.tick_ms, 20);
        assert_eq!(config.console.tick_ms, 15);
        assert_eq!(config.console.reset_epsilon, 0.001);
        assert_eq!(config.links.position(Axis::Z), Path::new(FIFO_POSITION_Z));
        assert_eq!(config.links.command(Axis::X), Path::new(FIFO_COMMAND_X));
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = HoistConfig::load(Path::new("/nonexistent/path/hoist.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = HoistConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"

[axis.z]
lower = 0.0
upper = 5.0

[console]
tick_ms = 30
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = HoistConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "hoist");
        assert_eq!(config.axis.z.upper, 5.0);
        assert_eq!(config.axis.z.step, AXIS_STEP);
        assert_eq!(config.axis.x, AxisConfig::for_axis(Axis::X));
        assert_eq!(config.console.tick_ms, 30);
        assert_eq!(config.console.reset_epsilon, RESET_EPSILON);
        assert_eq!(config.motor.tick_ms, MOTOR_TICK_MS);
    }

    #[test]
    fn test_inverted_envelope_rejected() {
        let mut config = HoistConfig::default();
        config.axis.x.lower = 3.0;
        config.axis.x.upper = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("axis x")
        ));
    }

    fn load_text(text: &str) -> Result<HoistConfig, ConfigError> {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{text}").unwrap();
        file.flush().unwrap();
        HoistConfig::load_or_default(Some(file.path()))
    }

    #[test]
    fn test_module_doc_example_loads() {
        let config = load_text(
            r#"[shared]
log_level = "debug"
service_name = "hoist-bench-01"

[axis.z]
upper = 9.9
step = 0.01

[console]
tick_ms = 15
"#,
        )
        .unwrap();
        assert_eq!(config.shared.service_name, "hoist-bench-01");
        assert_eq!(config.axis.z, AxisConfig::for_axis(Axis::Z));
        assert_eq!(config.axis.x, AxisConfig::for_axis(Axis::X));
        assert_eq!(config.console.tick_ms, 15);
    }

    #[test]
    fn test_single_field_axis_section_uses_axis_reference() {
        let config = load_text("[axis.x]\nupper = 6.5\n\n[axis.z]\nnoise_amplitude = 0.0\n").unwrap();
        let x_ref = AxisConfig::for_axis(Axis::X);
        assert_eq!(config.axis.x.upper, 6.5);
        assert_eq!(config.axis.x.lower, x_ref.lower);
        assert_eq!(config.axis.x.step, x_ref.step);

        let z_ref = AxisConfig::for_axis(Axis::Z);
        assert_eq!(config.axis.z.noise_amplitude, 0.0);
        assert_eq!(config.axis.z.limits(), z_ref.limits());
    }

    #[test]
    fn test_non_finite_axis_values_rejected() {
        for text in [
            "[axis.z]\nnoise_amplitude = inf\n",
            "[axis.x]\nstep = inf\n",
            "[axis.x]\nlower = -inf\n",
            "[axis.z]\nupper = inf\n",
            "[axis.z]\nstep = nan\n",
        ] {
            assert!(
                matches!(
                    load_text(text),
                    Err(ConfigError::ValidationError(msg)) if msg.contains("must be finite")
                ),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn test_infinite_reset_epsilon_rejected() {
        let mut config = HoistConfig::default();
        config.console.reset_epsilon = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut config = HoistConfig::default();
        config.motor.tick_ms = 0;
        assert!(config.validate().is_err());
    }
}
