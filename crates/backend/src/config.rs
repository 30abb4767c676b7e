use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::Conventions,
    artifact::{JsonUnitCodec, DEFAULT_UNIT_SUFFIX},
};

/// Settings of a transformation run, usually loaded from a TOML file.
///
/// Every field is optional in the file; missing ones take their defaults.
///
/// ```toml
/// unit-suffix = ".class.json"
///
/// [conventions]
/// resume-method = "invokeSuspend"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransformConfig {
    /// File name suffix identifying compiled units. Other files are copied verbatim.
    pub unit_suffix: String,

    pub conventions: Conventions,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self { unit_suffix: DEFAULT_UNIT_SUFFIX.to_string(), conventions: Conventions::default() }
    }
}

impl TransformConfig {
    /// Load the configuration from the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {path:?}"))?;
        Self::from_toml_str(&content).wrap_err_with(|| format!("invalid config file {path:?}"))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The codec recognizing units by [`Self::unit_suffix`].
    pub fn codec(&self) -> JsonUnitCodec {
        JsonUnitCodec::new(self.unit_suffix.clone())
    }
}
