//! Read-only view of what the instrumentation would do to a unit.

use std::fmt;

use super::{
    classifier::{MethodClassifier, MethodRole},
    conventions::Conventions,
    locator::ContinuationLocator,
    scanner::{ScannedCall, SuspendCallScanner},
};
use crate::{
    artifact::{CompiledUnit, MethodId},
    error::TransformError,
};

#[derive(Clone, Debug)]
pub struct MethodSummary {
    pub id: MethodId,
    pub role: MethodRole,

    /// The continuation slot for async entries and handlers, the completion slot for factories.
    pub slot: Option<Result<usize, TransformError>>,

    /// Asynchronous calls that would be hooked.
    pub calls: Vec<ScannedCall>,
}

impl fmt::Display for MethodSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.role)?;
        match &self.slot {
            Some(Ok(slot)) if self.role == MethodRole::Factory => write!(f, " completion: {slot}")?,
            Some(Ok(slot)) => write!(f, " continuation: {slot}")?,
            Some(Err(err)) => write!(f, " error: {err}")?,
            None => {}
        }
        for call in &self.calls {
            write!(f, "\n    line {}: {}", call.line, call.target)?;
        }
        Ok(())
    }
}

/// Classify every method of `unit` and locate its slots and calls without changing anything.
pub fn summarize_unit(conventions: &Conventions, unit: &CompiledUnit) -> Vec<MethodSummary> {
    let classifier = MethodClassifier::new(conventions);
    let locator = ContinuationLocator::new(conventions);
    let scanner = SuspendCallScanner::new(conventions);

    unit.methods
        .iter()
        .map(|method| {
            let role = if method.has_code() {
                classifier.classify(method, &unit.header)
            } else {
                MethodRole::Plain
            };
            let slot = if role == MethodRole::Factory {
                Some(locator.completion_slot(method, &unit.header))
            } else if role.is_async_entry() {
                Some(locator.continuation_slot(method, &unit.header))
            } else {
                None
            };
            let calls =
                if role.scans_calls() { scanner.scan(&method.instructions) } else { vec![] };
            MethodSummary { id: method.id(&unit.header), role, slot, calls }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{AccessFlags, CompiledMethod, Instruction, InvokeKind, UnitHeader};

    const CONT: &str = "Lkotlin/coroutines/experimental/Continuation;";

    #[test]
    fn test_summarize_top_level_unit() {
        let unit = CompiledUnit {
            header: UnitHeader { name: "a/MainKt".to_string(), ..Default::default() },
            methods: vec![
                CompiledMethod {
                    name: "main".to_string(),
                    descriptor: "([Ljava/lang/String;)V".to_string(),
                    access: AccessFlags(AccessFlags::STATIC),
                    instructions: vec![],
                },
                CompiledMethod {
                    name: "foo".to_string(),
                    descriptor: format!("(J{CONT})Ljava/lang/Object;"),
                    access: AccessFlags(AccessFlags::STATIC),
                    instructions: vec![
                        Instruction::Line { line: 7 },
                        Instruction::Invoke {
                            kind: InvokeKind::Static,
                            owner: "a/MainKt".to_string(),
                            name: "bar".to_string(),
                            descriptor: format!("({CONT})Ljava/lang/Object;"),
                        },
                    ],
                },
            ],
        };

        let summaries = summarize_unit(&Conventions::default(), &unit);
        assert_eq!(summaries[0].role, MethodRole::Plain);
        assert!(summaries[0].slot.is_none());

        assert_eq!(summaries[1].role, MethodRole::AsyncEntry);
        assert_eq!(summaries[1].slot.clone().unwrap().unwrap(), 2);
        assert_eq!(summaries[1].calls.len(), 1);
        assert_eq!(summaries[1].calls[0].line, 7);

        let shown = summaries[1].to_string();
        assert!(shown.contains("continuation: 2"));
        assert!(shown.contains("line 7: a/MainKt.bar"));
    }
}
