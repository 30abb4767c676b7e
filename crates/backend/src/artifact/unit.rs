use std::fmt;

use serde::{Deserialize, Serialize};

use super::{descriptor::MethodDescriptor, instruction::Instruction};
use crate::error::DescriptorError;

/// Access flags of a method, using the JVM bit layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const NATIVE: u16 = 0x0100;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;

    pub fn contains(&self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    /// A static method has no receiver in slot 0.
    pub fn is_static(&self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Abstract and native methods are declared without a body.
    pub fn is_bodiless(&self) -> bool {
        self.contains(Self::ABSTRACT | Self::NATIVE)
    }
}

/// Identity of a method, used as a stable, human-readable debugging key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodId {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self { owner: owner.into(), name: name.into(), descriptor: descriptor.into() }
    }

    /// The identity of the callee of a call instruction.
    pub fn of_call(insn: &Instruction) -> Option<Self> {
        match insn {
            Instruction::Invoke { owner, name, descriptor, .. } => {
                Some(Self::new(owner.as_str(), name.as_str(), descriptor.as_str()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Type-level metadata of a compiled unit. Read-only input to classification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitHeader {
    /// Internal name, e.g. `com/example/Foo$bar$1`.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
}

/// A method together with its mutable instruction stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledMethod {
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub access: AccessFlags,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl CompiledMethod {
    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }

    /// Whether there is an instruction stream to rewrite.
    pub fn has_code(&self) -> bool {
        !self.access.is_bodiless() && !self.instructions.is_empty()
    }

    /// Parse the descriptor of this method.
    pub fn parsed_descriptor(&self) -> Result<MethodDescriptor, DescriptorError> {
        MethodDescriptor::parse(&self.descriptor)
    }

    /// The identity of this method, declared in `owner`.
    pub fn id(&self, owner: &UnitHeader) -> MethodId {
        MethodId::new(owner.name.as_str(), self.name.as_str(), self.descriptor.as_str())
    }
}

/// One logical type: its header plus its methods in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    #[serde(flatten)]
    pub header: UnitHeader,

    #[serde(default)]
    pub methods: Vec<CompiledMethod>,
}

impl CompiledUnit {
    pub fn name(&self) -> &str {
        &self.header.name
    }
}
