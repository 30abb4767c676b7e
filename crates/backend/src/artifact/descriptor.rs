//! Method and field descriptors in the JVM notation, e.g. `(IJLjava/lang/Object;)V`.

use std::{fmt, str::FromStr};

use crate::error::DescriptorError;

/// The type of a single parameter, field or return value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    /// A class or interface type, by internal name (`java/lang/Object`).
    Object(String),
    /// An array type with its element type.
    Array(Box<FieldType>),
}

impl FieldType {
    /// Number of local variable slots a value of this type occupies.
    ///
    /// `long` and `double` are wide and take two slots, everything else takes one.
    pub fn slot_width(&self) -> usize {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }

    /// Returns the internal class name if this is an object type.
    pub fn object_name(&self) -> Option<&str> {
        match self {
            Self::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Returns true if this is the object type `name`.
    pub fn is_object(&self, name: &str) -> bool {
        self.object_name() == Some(name)
    }

    fn parse_from(
        descriptor: &str,
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    ) -> Result<Self, DescriptorError> {
        let err = |reason| DescriptorError { descriptor: descriptor.to_string(), reason };
        let c = chars.next().ok_or_else(|| err("unexpected end of descriptor"))?;
        let ty = match c {
            'B' => Self::Byte,
            'C' => Self::Char,
            'D' => Self::Double,
            'F' => Self::Float,
            'I' => Self::Int,
            'J' => Self::Long,
            'S' => Self::Short,
            'Z' => Self::Boolean,
            'L' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(';') => break,
                        Some(c) => name.push(c),
                        None => return Err(err("unterminated object type")),
                    }
                }
                if name.is_empty() {
                    return Err(err("empty object type name"));
                }
                Self::Object(name)
            }
            '[' => Self::Array(Box::new(Self::parse_from(descriptor, chars)?)),
            _ => return Err(err("unknown type tag")),
        };
        Ok(ty)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => write!(f, "B"),
            Self::Char => write!(f, "C"),
            Self::Double => write!(f, "D"),
            Self::Float => write!(f, "F"),
            Self::Int => write!(f, "I"),
            Self::Long => write!(f, "J"),
            Self::Short => write!(f, "S"),
            Self::Boolean => write!(f, "Z"),
            Self::Object(name) => write!(f, "L{name};"),
            Self::Array(element) => write!(f, "[{element}"),
        }
    }
}

/// A parsed method descriptor: ordered parameter types plus the return type.
///
/// `None` as return type stands for `void`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: Option<FieldType>,
}

impl MethodDescriptor {
    /// Parse a method descriptor string.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let err = |reason| DescriptorError { descriptor: descriptor.to_string(), reason };
        let mut chars = descriptor.chars().peekable();
        if chars.next() != Some('(') {
            return Err(err("missing opening parenthesis"));
        }

        let mut parameters = vec![];
        loop {
            match chars.peek() {
                Some(')') => {
                    chars.next();
                    break;
                }
                Some(_) => parameters.push(FieldType::parse_from(descriptor, &mut chars)?),
                None => return Err(err("missing closing parenthesis")),
            }
        }

        let return_type = if chars.peek() == Some(&'V') {
            chars.next();
            None
        } else {
            Some(FieldType::parse_from(descriptor, &mut chars)?)
        };

        if chars.next().is_some() {
            return Err(err("trailing characters after return type"));
        }

        Ok(Self { parameters, return_type })
    }

    /// Number of declared parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Sum of the slot widths of the first `count` parameters.
    pub fn slot_width_of_first(&self, count: usize) -> usize {
        self.parameters.iter().take(count).map(FieldType::slot_width).sum()
    }

    /// Returns true if the return type is the object type `name`.
    pub fn returns_object(&self, name: &str) -> bool {
        self.return_type.as_ref().is_some_and(|ty| ty.is_object(name))
    }
}

impl FromStr for MethodDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for param in &self.parameters {
            write!(f, "{param}")?;
        }
        write!(f, ")")?;
        match &self.return_type {
            Some(ty) => write!(f, "{ty}"),
            None => write!(f, "V"),
        }
    }
}
