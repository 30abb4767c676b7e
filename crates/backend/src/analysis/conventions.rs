//! Naming and descriptor conventions of the coroutine calling convention.
//!
//! These are tied to how the upstream compiler shapes its output. They are collected in one
//! [`Conventions`] value so they can be changed through configuration without touching the
//! classification or rewriting logic.

use serde::{Deserialize, Serialize};

use crate::artifact::{CompiledMethod, MethodDescriptor, UnitHeader};

/// The descriptor of both hook methods: `(continuation, index)`.
pub const HOOK_DESCRIPTOR: &str = "(Ljava/lang/Object;I)V";

/// Hook called right after an asynchronous call returns.
pub const ON_ASYNC_CALL_RETURN: &str = "onAsyncCallReturn";

/// Hook called on entry of a resumption handler.
pub const ON_RESUME_ENTRY: &str = "onResumeEntry";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Conventions {
    /// The continuation interface threaded through asynchronous calls.
    pub continuation_type: String,

    /// The base type of compiler-generated state machines.
    pub coroutine_impl_type: String,

    /// Name of the dispatch method resuming a state machine.
    pub resume_method: String,

    /// Descriptor of the dispatch method.
    pub resume_descriptor: String,

    /// Name of the coroutine factory method.
    pub factory_method: String,

    /// Suffix of synthetic methods that fill in default arguments.
    pub default_suffix: String,

    /// Position of the continuation counted from the end of the parameter list, for methods
    /// carrying [`Self::default_suffix`]. They append a mask and a marker after it.
    pub default_continuation_offset: usize,

    /// Position of the continuation counted from the end of the parameter list, otherwise.
    pub continuation_offset: usize,

    /// Prefix of the function interfaces implemented by anonymous suspend lambdas.
    pub lambda_interface_prefix: String,

    /// Owner of the static hook methods.
    pub hooks_owner: String,

    /// Type wrapping the completion continuation handed to factories.
    pub wrapped_completion_type: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            continuation_type: "kotlin/coroutines/experimental/Continuation".to_string(),
            coroutine_impl_type: "kotlin/coroutines/experimental/jvm/internal/CoroutineImpl"
                .to_string(),
            resume_method: "doResume".to_string(),
            resume_descriptor: "(Ljava/lang/Object;Ljava/lang/Throwable;)Ljava/lang/Object;"
                .to_string(),
            factory_method: "create".to_string(),
            default_suffix: "$default".to_string(),
            default_continuation_offset: 3,
            continuation_offset: 1,
            lambda_interface_prefix: "kotlin/jvm/functions/Function".to_string(),
            hooks_owner: "cdt/runtime/DebugHooks".to_string(),
            wrapped_completion_type: "cdt/runtime/WrappedCompletion".to_string(),
        }
    }
}

impl Conventions {
    /// Whether the unit is the continuation-implementation base type or a direct subtype of it.
    pub fn is_coroutine_impl_or_subtype(&self, unit: &UnitHeader) -> bool {
        unit.name == self.coroutine_impl_type ||
            unit.super_name.as_deref() == Some(self.coroutine_impl_type.as_str())
    }

    /// How far from the end of the parameter list the continuation of method `name` sits.
    pub fn continuation_offset(&self, name: &str) -> usize {
        if name.ends_with(&self.default_suffix) {
            self.default_continuation_offset
        } else {
            self.continuation_offset
        }
    }

    /// Logical parameter index of the continuation of method `name`, if the descriptor is long
    /// enough to carry one.
    pub fn continuation_parameter(&self, name: &str, descriptor: &MethodDescriptor) -> Option<usize> {
        descriptor.parameter_count().checked_sub(self.continuation_offset(name))
    }

    /// Whether a method called `name` with `descriptor` carries the asynchronous marker: a
    /// continuation parameter at the position its naming convention dictates.
    pub fn is_suspend(&self, name: &str, descriptor: &MethodDescriptor) -> bool {
        self.continuation_parameter(name, descriptor)
            .and_then(|index| descriptor.parameters.get(index))
            .is_some_and(|ty| ty.is_object(&self.continuation_type))
    }

    /// Whether `method` is the dispatch method of a state machine.
    pub fn is_resume_method(&self, method: &CompiledMethod) -> bool {
        method.name == self.resume_method && method.descriptor == self.resume_descriptor
    }

    /// Whether `method` is the coroutine factory of a state machine: `create(.., Continuation)`
    /// returning a continuation, declared on a continuation-implementation type.
    pub fn is_factory_method(
        &self,
        method: &CompiledMethod,
        descriptor: &MethodDescriptor,
        unit: &UnitHeader,
    ) -> bool {
        method.name == self.factory_method &&
            !method.is_static() &&
            self.is_coroutine_impl_or_subtype(unit) &&
            descriptor.returns_object(&self.continuation_type) &&
            descriptor.parameters.last().is_some_and(|ty| ty.is_object(&self.continuation_type))
    }

    /// Whether `unit` is the state machine of an anonymous suspend lambda.
    ///
    /// Such types are named `Outer$fn$N` and implement a function interface, unlike the state
    /// machines of named suspend functions which only forward back to the function body.
    pub fn is_anonymous_state_machine(&self, unit: &UnitHeader) -> bool {
        let numbered = unit
            .name
            .rsplit_once('$')
            .is_some_and(|(_, tail)| !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()));
        numbered &&
            self.is_coroutine_impl_or_subtype(unit) &&
            unit.interfaces.iter().any(|i| i.starts_with(&self.lambda_interface_prefix))
    }
}
