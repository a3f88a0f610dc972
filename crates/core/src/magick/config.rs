//! Configuration for the ImageMagick processor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use super::types::{VariantKind, VariantSettings};

/// Configuration for locating and running the ImageMagick binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagickConfig {
    /// Path or bare name of the convert binary.
    #[serde(default = "default_convert_path")]
    pub convert_path: PathBuf,

    /// Path or bare name of the identify binary.
    #[serde(default = "default_identify_path")]
    pub identify_path: PathBuf,

    /// Timeout for a single invocation in seconds. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_convert_path() -> PathBuf {
    PathBuf::from("convert")
}

fn default_identify_path() -> PathBuf {
    PathBuf::from("identify")
}

impl Default for MagickConfig {
    fn default() -> Self {
        Self {
            convert_path: default_convert_path(),
            identify_path: default_identify_path(),
            timeout_secs: None,
        }
    }
}

impl MagickConfig {
    /// Creates a new config with custom convert/identify paths.
    pub fn with_paths(convert_path: PathBuf, identify_path: PathBuf) -> Self {
        Self {
            convert_path,
            identify_path,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }
}

/// A quality setting in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    /// Returns a quality when `value` lies in `0..=100`.
    pub fn new(value: i64) -> Option<Self> {
        if (0..=100).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Interprets a loosely typed option value.
    ///
    /// Integers and integral numeric strings are accepted. Anything else,
    /// including values out of range, yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral))
                .and_then(Self::new),
            Value::String(s) => parse_integral(s).and_then(Self::new),
            _ => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target colorspace for processed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Colorspace {
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "sRGB")]
    Srgb,
    #[serde(rename = "GRAY")]
    Gray,
}

impl Colorspace {
    /// Value passed to `-colorspace`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Srgb => "sRGB",
            Self::Gray => "GRAY",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Some(Self::Rgb),
            "srgb" => Some(Self::Srgb),
            "gray" | "grey" => Some(Self::Gray),
            _ => None,
        }
    }
}

/// Options of a single ImageMagick processor.
///
/// Values are parsed leniently since they usually come from form input:
/// numbers may arrive as strings, flags as `0`/`1`, and `0`, `""`,
/// `false` or `null` switch an option off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Primary output quality. Omitted from the command when absent.
    #[serde(default = "default_quality", deserialize_with = "lenient::quality")]
    pub quality: Option<Quality>,

    /// Extra arguments, tokenized with shell quoting rules.
    #[serde(default = "default_exec", deserialize_with = "lenient::exec")]
    pub exec: String,

    /// Resample density in pixels per inch. Disabled when absent.
    #[serde(default = "default_density", deserialize_with = "lenient::density")]
    pub density: Option<u32>,

    /// Colorspace conversion. Original colorspace when absent.
    #[serde(
        default = "default_colorspace",
        deserialize_with = "lenient::colorspace"
    )]
    pub colorspace: Option<Colorspace>,

    #[serde(default = "default_true", deserialize_with = "lenient::flag")]
    pub webp_enable: bool,

    #[serde(default = "default_webp_quality", deserialize_with = "lenient::quality")]
    pub webp_quality: Option<Quality>,

    #[serde(default = "default_true", deserialize_with = "lenient::flag")]
    pub avif_enable: bool,

    #[serde(default = "default_avif_quality", deserialize_with = "lenient::quality")]
    pub avif_quality: Option<Quality>,
}

fn default_quality() -> Option<Quality> {
    Quality::new(70)
}

fn default_exec() -> String {
    "-sampling-factor 4:2:0".to_string()
}

fn default_density() -> Option<u32> {
    Some(DEFAULT_DENSITY)
}

fn default_colorspace() -> Option<Colorspace> {
    Some(Colorspace::Srgb)
}

fn default_true() -> bool {
    true
}

fn default_webp_quality() -> Option<Quality> {
    Quality::new(60)
}

fn default_avif_quality() -> Option<Quality> {
    Quality::new(40)
}

/// Density used when the option is a plain "on" switch.
const DEFAULT_DENSITY: u32 = 72;

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            exec: default_exec(),
            density: default_density(),
            colorspace: default_colorspace(),
            webp_enable: true,
            webp_quality: default_webp_quality(),
            avif_enable: true,
            avif_quality: default_avif_quality(),
        }
    }
}

impl ProcessorConfig {
    /// Builds a config from named options, falling back to defaults for
    /// missing keys.
    pub fn from_options(options: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(options))
    }

    /// Settings for one variant.
    pub fn variant(&self, kind: VariantKind) -> VariantSettings {
        match kind {
            VariantKind::Webp => VariantSettings {
                enabled: self.webp_enable,
                quality: self.webp_quality,
            },
            VariantKind::Avif => VariantSettings {
                enabled: self.avif_enable,
                quality: self.avif_quality,
            },
        }
    }

    /// Extra arguments as discrete argv entries.
    ///
    /// Quotes group words the way a POSIX shell would, but the tokens are
    /// passed straight to the binary. Unbalanced quoting yields no extra
    /// arguments.
    pub fn extra_args(&self) -> Vec<String> {
        match shell_words::split(&self.exec) {
            Ok(args) => args,
            Err(e) => {
                warn!("Ignoring extra arguments {:?}: {}", self.exec, e);
                Vec::new()
            }
        }
    }

    /// Sets the primary quality.
    pub fn with_quality(mut self, quality: Option<Quality>) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the extra arguments.
    pub fn with_exec(mut self, exec: impl Into<String>) -> Self {
        self.exec = exec.into();
        self
    }

    /// Sets the density.
    pub fn with_density(mut self, density: Option<u32>) -> Self {
        self.density = density;
        self
    }

    /// Sets the colorspace.
    pub fn with_colorspace(mut self, colorspace: Option<Colorspace>) -> Self {
        self.colorspace = colorspace;
        self
    }

    /// Enables or disables a variant and sets its quality.
    pub fn with_variant(
        mut self,
        kind: VariantKind,
        enabled: bool,
        quality: Option<Quality>,
    ) -> Self {
        match kind {
            VariantKind::Webp => {
                self.webp_enable = enabled;
                self.webp_quality = quality;
            }
            VariantKind::Avif => {
                self.avif_enable = enabled;
                self.avif_quality = quality;
            }
        }
        self
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_integral(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral))
}

/// Deserializers for form-style option values.
mod lenient {
    use super::{integral, parse_integral, Colorspace, Quality, DEFAULT_DENSITY};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null))
    }

    pub fn quality<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Quality>, D::Error> {
        Ok(Quality::from_value(&raw(deserializer)?))
    }

    fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match raw(deserializer)? {
            Value::Null | Value::Bool(false) => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("expected a string, got {}", other))),
        }
    }

    pub fn exec<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let exec = text(deserializer)?;
        shell_words::split(&exec)
            .map_err(|e| D::Error::custom(format!("invalid extra arguments {:?}: {}", exec, e)))?;
        Ok(exec)
    }

    pub fn density<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        let value = raw(deserializer)?;
        let number = match &value {
            Value::Null | Value::Bool(false) => return Ok(None),
            Value::Bool(true) => return Ok(Some(DEFAULT_DENSITY)),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => parse_integral(s),
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            _ => None,
        };
        match number {
            Some(0) => Ok(None),
            Some(n) if n > 0 && n <= u32::MAX as i64 => Ok(Some(n as u32)),
            _ => Err(D::Error::custom(format!("invalid density: {}", value))),
        }
    }

    pub fn colorspace<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Colorspace>, D::Error> {
        match raw(deserializer)? {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(None),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() || s == "0" || s.eq_ignore_ascii_case("none") {
                    return Ok(None);
                }
                Colorspace::parse(s)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("unknown colorspace: {}", s)))
            }
            other => Err(D::Error::custom(format!("invalid colorspace: {}", other))),
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match raw(deserializer)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "off" | "no" => Ok(false),
                "1" | "true" | "on" | "yes" => Ok(true),
                other => Err(D::Error::custom(format!("invalid flag: {}", other))),
            },
            other => Err(D::Error::custom(format!("invalid flag: {}", other))),
        }
    }
}
