use std::{fmt, path::Path};

use super::unit::CompiledUnit;
use crate::error::TransformError;

/// The default suffix of files holding a compiled unit.
pub const DEFAULT_UNIT_SUFFIX: &str = ".class.json";

/// Turns the bytes of a file into a mutable [`CompiledUnit`] and back.
///
/// Implementations must be shareable across threads since files may be processed in parallel.
pub trait UnitCodec: fmt::Debug + Send + Sync {
    /// Returns true if the file at `path` holds a compiled unit this codec understands.
    /// Files that are not accepted are copied verbatim.
    fn accepts(&self, path: &Path) -> bool;

    /// Decode a compiled unit. Any failure is a [`TransformError::MalformedInput`].
    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<CompiledUnit, TransformError>;

    /// Re-serialize a (possibly rewritten) compiled unit.
    fn encode(&self, path: &Path, unit: &CompiledUnit) -> Result<Vec<u8>, TransformError>;
}

/// Codec for compiled units stored as JSON documents.
#[derive(Clone, Debug)]
pub struct JsonUnitCodec {
    suffix: String,
}

impl Default for JsonUnitCodec {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_SUFFIX)
    }
}

impl JsonUnitCodec {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into() }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl UnitCodec for JsonUnitCodec {
    fn accepts(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.len() > self.suffix.len() && name.ends_with(&self.suffix))
    }

    fn decode(&self, path: &Path, bytes: &[u8]) -> Result<CompiledUnit, TransformError> {
        let malformed = |reason: String| TransformError::MalformedInput {
            path: path.to_path_buf(),
            reason,
        };

        let unit: CompiledUnit =
            serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        if unit.header.name.is_empty() {
            return Err(malformed("unit has no name".to_string()));
        }
        for method in &unit.methods {
            method
                .parsed_descriptor()
                .map_err(|e| malformed(format!("method `{}`: {e}", method.name)))?;
        }

        Ok(unit)
    }

    fn encode(&self, path: &Path, unit: &CompiledUnit) -> Result<Vec<u8>, TransformError> {
        serde_json::to_vec_pretty(unit).map_err(|e| TransformError::Serialization {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_by_suffix() {
        let codec = JsonUnitCodec::default();
        assert!(codec.accepts(Path::new("out/com/example/Foo.class.json")));
        assert!(!codec.accepts(Path::new("out/com/example/Foo.json")));
        assert!(!codec.accepts(Path::new("out/.class.json")));
        assert!(!codec.accepts(Path::new("META-INF/MANIFEST.MF")));
    }

    #[test]
    fn test_decode_encode() {
        let codec = JsonUnitCodec::default();
        let json = br#"{
            "name": "a/Foo",
            "super_name": "java/lang/Object",
            "source_file": "Foo.kt",
            "methods": [
                { "name": "bar", "descriptor": "()V", "access": 9,
                  "instructions": [ { "op": "line", "line": 3 }, { "op": "other", "mnemonic": "return" } ] }
            ]
        }"#;
        let unit = codec.decode(Path::new("Foo.class.json"), json).unwrap();
        assert_eq!(unit.name(), "a/Foo");
        assert_eq!(unit.header.source_file.as_deref(), Some("Foo.kt"));
        assert!(unit.methods[0].is_static());
        assert_eq!(unit.methods[0].instructions.len(), 2);

        let bytes = codec.encode(Path::new("Foo.class.json"), &unit).unwrap();
        assert_eq!(codec.decode(Path::new("Foo.class.json"), &bytes).unwrap(), unit);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let codec = JsonUnitCodec::default();
        let path = Path::new("Bad.class.json");
        let cases: [&[u8]; 3] = [
            b"not json",
            br#"{"name": ""}"#,
            br#"{"name": "a/B", "methods": [{"name": "m", "descriptor": "(Q)V"}]}"#,
        ];
        for bad in cases {
            assert!(matches!(
                codec.decode(path, bad),
                Err(TransformError::MalformedInput { .. })
            ));
        }
    }
}
