use std::path::Path;

use crate::{
    analysis::{Conventions, InstrumentationInjector, MethodRole},
    artifact::{CompiledUnit, UnitCodec},
    error::{RecordedFailure, TransformError},
    registry::Registries,
    utils::listing::unit_listing,
};

/// What happened to one compiled unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitSummary {
    /// Methods whose instruction stream was changed.
    pub rewritten: usize,

    /// Methods whose rewriting failed and was recorded.
    pub failed: usize,
}

/// Instruments every method of a compiled unit, isolating per-method failures.
#[derive(Clone, Copy, Debug)]
pub struct UnitTransformer<'a> {
    conventions: &'a Conventions,
    codec: &'a dyn UnitCodec,
    registries: &'a Registries,
}

impl<'a> UnitTransformer<'a> {
    pub fn new(
        conventions: &'a Conventions,
        codec: &'a dyn UnitCodec,
        registries: &'a Registries,
    ) -> Self {
        Self { conventions, codec, registries }
    }

    /// Decode, instrument and re-encode the unit stored in `bytes`.
    ///
    /// Only unit-level problems are returned; method-level failures are recorded in the failure
    /// registry and the unit keeps whatever instrumentation succeeded.
    ///
    /// The unit is encoded once before rewriting, so a unit the codec cannot write back fails
    /// before any registry index is handed out for it.
    pub fn transform_bytes(&self, path: &Path, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut unit = self.codec.decode(path, bytes)?;
        self.codec.encode(path, &unit)?;
        self.transform_unit(path, &mut unit);
        self.codec.encode(path, &unit)
    }

    /// Instrument every method of `unit` in place.
    pub fn transform_unit(&self, path: &Path, unit: &mut CompiledUnit) -> UnitSummary {
        let injector = InstrumentationInjector::new(self.conventions, self.registries);
        let mut summary = UnitSummary::default();

        let CompiledUnit { header, methods } = &mut *unit;
        for method in methods.iter_mut() {
            // A failed rewrite may leave the method half-instrumented, which we keep.
            match injector.instrument(method, header) {
                Ok(outcome) => {
                    if outcome.is_rewritten() {
                        summary.rewritten += 1;
                    }
                    if outcome.role != MethodRole::Plain {
                        trace!(
                            "{}.{}: {}, {} call site(s)",
                            header.name,
                            method.name,
                            outcome.role,
                            outcome.call_sites.len()
                        );
                    }
                }
                Err(err) => {
                    error!(
                        "while instrumenting {}.{} with desc: {}: {err}",
                        header.name, method.name, method.descriptor
                    );
                    summary.failed += 1;
                    self.registries.failures.append(RecordedFailure::new(
                        path,
                        Some(method.id(header)),
                        err,
                    ));
                }
            }
        }

        if summary.failed > 0 {
            debug!("unit listing of {}:\n{}", unit.name(), unit_listing(unit));
        }
        info!("transformed {} ({} method(s) rewritten)", unit.name(), summary.rewritten);

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{
        AccessFlags, CompiledMethod, Instruction, InvokeKind, JsonUnitCodec, UnitHeader,
    };

    const CONT: &str = "Lkotlin/coroutines/experimental/Continuation;";

    fn call(name: &str) -> Instruction {
        Instruction::Invoke {
            kind: InvokeKind::Static,
            owner: "a/MainKt".to_string(),
            name: name.to_string(),
            descriptor: format!("({CONT})Ljava/lang/Object;"),
        }
    }

    fn unit() -> CompiledUnit {
        let header = UnitHeader {
            name: "a/Main$run$1".to_string(),
            super_name: Some(Conventions::default().coroutine_impl_type),
            source_file: Some("Main.kt".to_string()),
            interfaces: vec![],
        };
        let methods = vec![
            // Factory without any allocation: fails structurally.
            CompiledMethod {
                name: "create".to_string(),
                descriptor: format!("(Ljava/lang/Object;{CONT}){CONT}"),
                access: AccessFlags(AccessFlags::PUBLIC),
                instructions: vec![Instruction::Other {
                    mnemonic: "areturn".to_string(),
                    operands: vec![],
                }],
            },
            CompiledMethod {
                name: "doResume".to_string(),
                descriptor: Conventions::default().resume_descriptor,
                access: AccessFlags(AccessFlags::PUBLIC),
                instructions: vec![Instruction::Line { line: 3 }, call("delay")],
            },
        ];
        CompiledUnit { header, methods }
    }

    #[test]
    fn test_method_failure_is_isolated() {
        let conv = Conventions::default();
        let codec = JsonUnitCodec::default();
        let registries = Registries::new();
        let transformer = UnitTransformer::new(&conv, &codec, &registries);

        let mut unit = unit();
        let summary = transformer.transform_unit(Path::new("a/Main$run$1.class.json"), &mut unit);

        assert_eq!(summary, UnitSummary { rewritten: 1, failed: 1 });
        assert_eq!(registries.resume_handlers.len(), 1);
        // Named state machines only get the entry hook.
        assert!(registries.call_sites.is_empty());
        assert_eq!(unit.methods[1].instructions.len(), 5);

        let failure = registries.failures.first().unwrap();
        assert!(matches!(failure.error, TransformError::Structural { .. }));
        assert_eq!(failure.method.as_ref().unwrap().name, "create");
    }

    /// Reads like the JSON codec but refuses to write anything back.
    #[derive(Debug, Default)]
    struct ReadOnlyCodec(JsonUnitCodec);

    impl UnitCodec for ReadOnlyCodec {
        fn accepts(&self, path: &Path) -> bool {
            self.0.accepts(path)
        }

        fn decode(&self, path: &Path, bytes: &[u8]) -> Result<CompiledUnit, TransformError> {
            self.0.decode(path, bytes)
        }

        fn encode(&self, path: &Path, _unit: &CompiledUnit) -> Result<Vec<u8>, TransformError> {
            Err(TransformError::Serialization {
                path: path.to_path_buf(),
                reason: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn test_unencodable_unit_registers_nothing() {
        let conv = Conventions::default();
        let codec = ReadOnlyCodec::default();
        let registries = Registries::new();
        let transformer = UnitTransformer::new(&conv, &codec, &registries);
        let path = Path::new("a/Main$run$1.class.json");

        let bytes = serde_json::to_vec(&unit()).unwrap();
        let err = transformer.transform_bytes(path, &bytes).unwrap_err();
        assert!(matches!(err, TransformError::Serialization { .. }));
        assert!(registries.resume_handlers.is_empty());
        assert!(registries.failures.is_empty());
    }

    #[test]
    fn test_transform_bytes() {
        let conv = Conventions::default();
        let codec = JsonUnitCodec::default();
        let registries = Registries::new();
        let transformer = UnitTransformer::new(&conv, &codec, &registries);
        let path = Path::new("a/Main$run$1.class.json");

        let bytes = serde_json::to_vec(&unit()).unwrap();
        let output = transformer.transform_bytes(path, &bytes).unwrap();
        let decoded = codec.decode(path, &output).unwrap();
        assert_eq!(decoded.methods[1].instructions.len(), 5);

        let err = transformer.transform_bytes(path, b"{").unwrap_err();
        assert!(matches!(err, TransformError::MalformedInput { .. }));
    }
}
