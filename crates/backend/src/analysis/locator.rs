//! Computes the local slot holding the continuation of a method.
//!
//! This must match the calling convention the unit was compiled with exactly. Being one slot off
//! makes the injected hook read an unrelated local at runtime.

use super::conventions::Conventions;
use crate::{
    artifact::{CompiledMethod, MethodDescriptor, UnitHeader},
    error::TransformError,
};

/// The slot of the receiver, and of the continuation of state machine methods.
pub const RECEIVER_SLOT: usize = 0;

/// Slot of the parameter at logical `index`: the widths of all preceding parameters, plus one
/// for the receiver of instance methods.
pub fn parameter_slot(descriptor: &MethodDescriptor, index: usize, is_static: bool) -> usize {
    descriptor.slot_width_of_first(index) + usize::from(!is_static)
}

#[derive(Clone, Copy, Debug)]
pub struct ContinuationLocator<'a> {
    conventions: &'a Conventions,
}

impl<'a> ContinuationLocator<'a> {
    pub fn new(conventions: &'a Conventions) -> Self {
        Self { conventions }
    }

    /// The slot holding the continuation while `method` runs.
    ///
    /// State machines are their own continuation, so every method on them uses the receiver.
    /// Otherwise the method must carry the asynchronous marker.
    pub fn continuation_slot(
        &self,
        method: &CompiledMethod,
        unit: &UnitHeader,
    ) -> Result<usize, TransformError> {
        if self.conventions.is_coroutine_impl_or_subtype(unit) {
            return Ok(RECEIVER_SLOT);
        }

        let not_async = |reason: String| TransformError::Classification {
            method: method.id(unit),
            reason,
        };
        let descriptor = method.parsed_descriptor().map_err(|e| not_async(e.to_string()))?;
        if !self.conventions.is_suspend(&method.name, &descriptor) {
            return Err(not_async(format!(
                "no {} parameter at the position required for `{}`",
                self.conventions.continuation_type, method.name
            )));
        }
        let index = self
            .conventions
            .continuation_parameter(&method.name, &descriptor)
            .ok_or_else(|| not_async("too few parameters".to_string()))?;

        Ok(parameter_slot(&descriptor, index, method.is_static()))
    }

    /// The slot of the completion continuation a factory receives as its last parameter.
    pub fn completion_slot(
        &self,
        method: &CompiledMethod,
        unit: &UnitHeader,
    ) -> Result<usize, TransformError> {
        let descriptor = method.parsed_descriptor().map_err(|e| TransformError::Structural {
            method: method.id(unit),
            reason: e.to_string(),
        })?;
        let index = descriptor.parameter_count().checked_sub(1).ok_or_else(|| {
            TransformError::Structural {
                method: method.id(unit),
                reason: "factory without completion parameter".to_string(),
            }
        })?;
        Ok(parameter_slot(&descriptor, index, method.is_static()))
    }
}
