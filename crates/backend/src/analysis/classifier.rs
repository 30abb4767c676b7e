//! Decides which role a method plays in the coroutine calling convention.

use strum::Display;

use super::conventions::Conventions;
use crate::artifact::{CompiledMethod, UnitHeader};

/// The role of a method, as far as instrumentation is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum MethodRole {
    /// `create` of a state machine, building the coroutine around a completion.
    Factory,

    /// The dispatch method resuming a suspended state machine. `anonymous` is set when the state
    /// machine belongs to a suspend lambda, whose body lives in the handler itself.
    ResumeHandler { anonymous: bool },

    /// A method carrying the asynchronous marker.
    AsyncEntry,

    /// Anything else. Left untouched.
    Plain,
}

impl MethodRole {
    /// Whether the method runs with a continuation at hand.
    pub fn is_async_entry(&self) -> bool {
        matches!(self, Self::AsyncEntry | Self::ResumeHandler { .. })
    }

    /// Whether the method body may contain asynchronous calls worth hooking.
    pub fn scans_calls(&self) -> bool {
        matches!(self, Self::AsyncEntry | Self::ResumeHandler { anonymous: true })
    }
}

/// Pure classification over static metadata.
#[derive(Clone, Copy, Debug)]
pub struct MethodClassifier<'a> {
    conventions: &'a Conventions,
}

impl<'a> MethodClassifier<'a> {
    pub fn new(conventions: &'a Conventions) -> Self {
        Self { conventions }
    }

    pub fn classify(&self, method: &CompiledMethod, unit: &UnitHeader) -> MethodRole {
        let conv = self.conventions;
        let Ok(descriptor) = method.parsed_descriptor() else {
            return MethodRole::Plain;
        };

        if conv.is_factory_method(method, &descriptor, unit) {
            MethodRole::Factory
        } else if conv.is_coroutine_impl_or_subtype(unit) && conv.is_resume_method(method) {
            MethodRole::ResumeHandler { anonymous: conv.is_anonymous_state_machine(unit) }
        } else if conv.is_suspend(&method.name, &descriptor) {
            MethodRole::AsyncEntry
        } else {
            MethodRole::Plain
        }
    }
}
