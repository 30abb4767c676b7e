//! The structural tree of compiled units and the codec turning files into it.

pub mod codec;
pub mod descriptor;
pub mod instruction;
pub mod unit;

pub use codec::{JsonUnitCodec, UnitCodec, DEFAULT_UNIT_SUFFIX};
pub use descriptor::{FieldType, MethodDescriptor};
pub use instruction::{Instruction, InvokeKind, ValueKind};
pub use unit::{AccessFlags, CompiledMethod, CompiledUnit, MethodId, UnitHeader};
