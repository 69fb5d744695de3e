//! Configuration module for lesionscan.

use crate::error::{LesionError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

/// Longest accepted `auth.token_ttl`.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

/// Class labels in the order the output layer was trained with.
pub const DEFAULT_LABELS: [&str; 2] = ["benign", "malignant"];

/// Main configuration for a lesionscan server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LesionConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Model configuration.
    #[serde(default)]
    pub model: ModelConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Static frontend configuration.
    #[serde(default)]
    pub frontend: FrontendConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl LesionConfig {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LesionError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LesionError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port must be non-zero"));
        }

        self.auth.validate()?;
        self.model.validate()?;

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> LesionError {
    LesionError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: IpAddr,
    /// Port to bind.
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Socket address the server listens on.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Compute device preference for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Use an accelerator when the backend has one, otherwise the CPU.
    #[default]
    Auto,
    /// Always run on the CPU.
    Cpu,
}

impl Device {
    /// Resolve the preference to the device inference will actually run on.
    ///
    /// The ONNX runtime backend executes on the CPU only.
    pub fn resolve(self) -> Device {
        Device::Cpu
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,
    /// Ordered class labels.
    pub labels: Vec<String>,
    /// Compute device preference.
    pub device: Device,
    /// Input preprocessing.
    pub preprocess: PreprocessConfig,
}

impl ModelConfig {
    fn validate(&self) -> Result<()> {
        if self.labels.len() < 2 {
            return Err(invalid("model.labels", "At least two labels are required"));
        }
        for (i, label) in self.labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(invalid("model.labels", "Labels must not be empty"));
            }
            if self.labels[..i].contains(label) {
                return Err(invalid("model.labels", "Labels must be unique"));
            }
        }
        self.preprocess.validate()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("saved_models/1.onnx"),
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            device: Device::Auto,
            preprocess: PreprocessConfig::default(),
        }
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Side length of the square network input.
    pub image_size: u32,
    /// Per-channel mean (RGB) applied after scaling to [0, 1].
    pub mean: [f32; 3],
    /// Per-channel standard deviation (RGB).
    pub std: [f32; 3],
}

impl PreprocessConfig {
    fn validate(&self) -> Result<()> {
        if self.image_size == 0 {
            return Err(invalid("model.preprocess.image_size", "Image size must be non-zero"));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(invalid("model.preprocess.mean", "Mean values must be finite"));
        }
        if self.std.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(invalid(
                "model.preprocess.std",
                "Standard deviations must be finite and non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        // ImageNet statistics
        Self {
            image_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

/// Authentication configuration.
///
/// There are no defaults for the secrets: they must come from the config
/// file, the command line, or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC key used to sign access tokens.
    #[serde(default)]
    pub signing_key: String,
    /// The single admin account.
    #[serde(default)]
    pub admin_username: String,
    /// Lowercase hex SHA-256 of the admin password.
    #[serde(default)]
    pub admin_password_hash: String,
    /// Token lifetime. Tokens never expire when unset.
    #[serde(default, with = "humantime_serde::option")]
    pub token_ttl: Option<Duration>,
}

impl AuthConfig {
    fn validate(&self) -> Result<()> {
        if self.signing_key.is_empty() {
            return Err(invalid("auth.signing_key", "Signing key must be set"));
        }
        if self.admin_username.is_empty() {
            return Err(invalid("auth.admin_username", "Admin username must be set"));
        }
        let hash = &self.admin_password_hash;
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid(
                "auth.admin_password_hash",
                "Expected 64 hex characters (SHA-256)",
            ));
        }
        match self.token_ttl {
            Some(ttl) if ttl.is_zero() => {
                return Err(invalid("auth.token_ttl", "Token lifetime must be non-zero"));
            }
            Some(ttl) if ttl > MAX_TOKEN_TTL => {
                return Err(invalid(
                    "auth.token_ttl",
                    &format!("Token lifetime must be at most {}s", MAX_TOKEN_TTL.as_secs()),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Static frontend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Directory holding the prebuilt bundle (`index.html` plus assets).
    pub dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dist"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level.
    pub log_level: String,
    /// Enable JSON logging.
    pub json_logs: bool,
    /// Expose Prometheus metrics on `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

/// Serde helper for Duration using humantime format.
pub mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Same format for `Option<Duration>`; `null` or a missing field is `None`.
    pub mod option {
        use super::parse_duration;
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }

    pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| e.to_string())
        } else if let Some(s_val) = s.strip_suffix('s') {
            s_val
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| e.to_string())
        } else if let Some(m) = s.strip_suffix('m') {
            scaled_secs(m, 60)
        } else if let Some(h) = s.strip_suffix('h') {
            scaled_secs(h, 3600)
        } else {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| e.to_string())
        }
    }

    fn scaled_secs(value: &str, unit: u64) -> Result<Duration, String> {
        let value = value.parse::<u64>().map_err(|e| e.to_string())?;
        value
            .checked_mul(unit)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration {value} x {unit}s overflows"))
    }
}
