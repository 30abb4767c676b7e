//! Finds calls into other asynchronous operations inside an instruction stream.

use super::conventions::Conventions;
use crate::artifact::{Instruction, MethodDescriptor, MethodId};

/// Line number recorded when no line marker precedes a call.
pub const UNKNOWN_LINE: i32 = -1;

/// An asynchronous call found in an instruction stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedCall {
    /// Position of the call instruction in the scanned stream.
    pub position: usize,

    /// The callee.
    pub target: MethodId,

    /// Line of the nearest preceding line marker, or [`UNKNOWN_LINE`].
    pub line: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct SuspendCallScanner<'a> {
    conventions: &'a Conventions,
}

impl<'a> SuspendCallScanner<'a> {
    pub fn new(conventions: &'a Conventions) -> Self {
        Self { conventions }
    }

    /// Whether `insn` calls a method carrying the asynchronous marker.
    pub fn is_suspend_call(&self, insn: &Instruction) -> bool {
        let Instruction::Invoke { name, descriptor, .. } = insn else {
            return false;
        };
        match MethodDescriptor::parse(descriptor) {
            Ok(descriptor) => self.conventions.is_suspend(name, &descriptor),
            Err(e) => {
                warn!("ignoring call with {e}");
                false
            }
        }
    }

    /// All asynchronous calls in `instructions`, in instruction order.
    pub fn scan(&self, instructions: &[Instruction]) -> Vec<ScannedCall> {
        let mut line = UNKNOWN_LINE;
        let mut calls = vec![];
        for (position, insn) in instructions.iter().enumerate() {
            if let Instruction::Line { line: marker } = insn {
                line = i32::try_from(*marker).unwrap_or(UNKNOWN_LINE);
            } else if self.is_suspend_call(insn) {
                if let Some(target) = MethodId::of_call(insn) {
                    calls.push(ScannedCall { position, target, line });
                }
            }
        }
        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::InvokeKind;

    const CONT: &str = "Lkotlin/coroutines/experimental/Continuation;";

    fn call(name: &str, descriptor: &str) -> Instruction {
        Instruction::Invoke {
            kind: InvokeKind::Static,
            owner: "a/MainKt".to_string(),
            name: name.to_string(),
            descriptor: descriptor.replace("$C", CONT),
        }
    }

    fn other(mnemonic: &str) -> Instruction {
        Instruction::Other { mnemonic: mnemonic.to_string(), operands: vec![] }
    }

    #[test]
    fn test_scan_finds_calls_with_lines() {
        let conv = Conventions::default();
        let scanner = SuspendCallScanner::new(&conv);
        let stream = vec![
            call("first", "($C)Ljava/lang/Object;"),
            Instruction::Label { id: 0 },
            Instruction::Line { line: 10 },
            call("println", "(Ljava/lang/Object;)V"),
            call("second", "(I$C)Ljava/lang/Object;"),
            other("pop"),
            Instruction::Line { line: 12 },
            call("third$default", "(I$CILjava/lang/Object;)Ljava/lang/Object;"),
            other("areturn"),
        ];

        let calls = scanner.scan(&stream);
        let found: Vec<_> =
            calls.iter().map(|c| (c.position, c.target.name.as_str(), c.line)).collect();
        assert_eq!(
            found,
            vec![(0, "first", UNKNOWN_LINE), (4, "second", 10), (7, "third$default", 12)]
        );
        assert_eq!(calls[1].target.owner, "a/MainKt");
    }

    #[test]
    fn test_scan_is_deterministic_and_ignores_other_shapes() {
        let conv = Conventions::default();
        let scanner = SuspendCallScanner::new(&conv);
        let stream = vec![
            Instruction::New { class: CONT.to_string() },
            call("broken", "(Q)V"),
            call("plain", "(Ljava/lang/Object;)V"),
        ];
        assert!(scanner.scan(&stream).is_empty());
        assert!(scanner.scan(&[]).is_empty());

        let stream = vec![call("a", "($C)V"), call("b", "($C)V")];
        assert_eq!(scanner.scan(&stream), scanner.scan(&stream));
    }
}
