use std::fmt::Write;

use itertools::Itertools;

use crate::artifact::{CompiledMethod, CompiledUnit};

/// Human-readable listing of a whole unit, used for post-mortem analysis of failed rewrites.
pub fn unit_listing(unit: &CompiledUnit) -> String {
    let header = &unit.header;
    let mut out = format!("class {}", header.name);
    if let Some(super_name) = &header.super_name {
        let _ = write!(out, " extends {super_name}");
    }
    if !header.interfaces.is_empty() {
        let _ = write!(out, " implements {}", header.interfaces.iter().join(", "));
    }
    if let Some(source) = &header.source_file {
        let _ = write!(out, " ({source})");
    }
    out.push('\n');

    for method in &unit.methods {
        out.push_str(&method_listing(method));
    }
    out
}

/// Listing of one method: signature line, then one numbered line per instruction.
pub fn method_listing(method: &CompiledMethod) -> String {
    let mut out = format!(
        "  {}{} [access 0x{:04x}]\n",
        method.name, method.descriptor, method.access.0
    );
    for (index, insn) in method.instructions.iter().enumerate() {
        let _ = writeln!(out, "    {index:>4}: {insn}");
    }
    out
}
