use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::Display;

/// The dispatch kind of a call instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvokeKind {
    Static,
    Virtual,
    Special,
    Interface,
}

/// The kind of value moved between the operand stack and a local slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

/// A single node of a method's instruction stream.
///
/// Only the shapes the transformation inspects or emits get their own variant. Everything else
/// is carried through untouched as [`Instruction::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// A method call.
    Invoke { kind: InvokeKind, owner: String, name: String, descriptor: String },

    /// An object allocation.
    New { class: String },

    /// A source line marker. It applies to the instructions that follow it.
    Line { line: u32 },

    /// A jump target.
    Label { id: u32 },

    /// Push the value stored in a local slot.
    Load { kind: ValueKind, slot: u16 },

    /// Pop a value into a local slot.
    Store { kind: ValueKind, slot: u16 },

    /// Push an integer constant.
    Push { value: i32 },

    /// Duplicate the top of the operand stack.
    Dup,

    /// Any instruction the transformation does not need to understand.
    Other {
        mnemonic: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        operands: Vec<String>,
    },
}

impl Instruction {
    /// Returns true if this is an object allocation.
    pub fn is_allocation(&self) -> bool {
        matches!(self, Self::New { .. })
    }

    /// Returns true for pseudo instructions that only carry metadata.
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Line { .. } | Self::Label { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoke { kind, owner, name, descriptor } => {
                write!(f, "invoke{kind} {owner}.{name}{descriptor}")
            }
            Self::New { class } => write!(f, "new {class}"),
            Self::Line { line } => write!(f, "line {line}"),
            Self::Label { id } => write!(f, "L{id}:"),
            Self::Load { kind, slot } => write!(f, "load.{kind} {slot}"),
            Self::Store { kind, slot } => write!(f, "store.{kind} {slot}"),
            Self::Push { value } => write!(f, "push {value}"),
            Self::Dup => write!(f, "dup"),
            Self::Other { mnemonic, operands } if operands.is_empty() => write!(f, "{mnemonic}"),
            Self::Other { mnemonic, operands } => {
                write!(f, "{mnemonic} {}", operands.iter().join(", "))
            }
        }
    }
}
