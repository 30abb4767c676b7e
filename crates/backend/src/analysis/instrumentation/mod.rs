//! This module rewrites the instruction streams of coroutine code so that an external debugger
//! can observe every suspension and resumption.
//!
//! Compiled suspend functions follow a state-machine calling convention: every asynchronous
//! method receives a hidden continuation as a trailing parameter, and compiler-generated state
//! machine types resume a suspended computation through a dispatch method. We do not touch the
//! source; we insert calls into a static hook class at three kinds of places instead:
//!
//! - right after each call into another asynchronous method, `onAsyncCallReturn(cont, index)`,
//!   where `index` refers to a [`SuspendCall`] in the call-site registry;
//! - at the entry of each dispatch method, `onResumeEntry(cont, index)`, where `index` refers to
//!   the [`MethodId`] of the handler in the resume-handler registry;
//! - before the first allocation in each coroutine factory, where the completion continuation is
//!   replaced by a wrapper the debugger can track.
//!
//! Registry indices are baked into the rewritten code as literal operands, which is why the
//! registries are append-only.
//!
//! WARNING: running the rewriting twice over the same unit instruments it twice. Instrumented
//! output is not meant to be fed back in.

mod hooks;
mod site;

pub use site::{CallPosition, SuspendCall};

use super::{
    classifier::{MethodClassifier, MethodRole},
    conventions::Conventions,
    locator::ContinuationLocator,
    scanner::SuspendCallScanner,
};
use crate::{
    artifact::{CompiledMethod, Instruction, UnitHeader},
    error::TransformError,
    registry::Registries,
};

/// What happened to a single method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodOutcome {
    pub role: MethodRole,

    /// The continuation slot the hooks read, for async entries.
    pub continuation: Option<usize>,

    /// Index of the method in the resume-handler registry.
    pub resume_index: Option<usize>,

    /// Indices of the call sites hooked in this method, in instruction order.
    pub call_sites: Vec<usize>,
}

impl MethodOutcome {
    fn new(role: MethodRole) -> Self {
        Self { role, continuation: None, resume_index: None, call_sites: vec![] }
    }

    /// Whether the instruction stream was changed.
    pub fn is_rewritten(&self) -> bool {
        self.role == MethodRole::Factory ||
            self.resume_index.is_some() ||
            !self.call_sites.is_empty()
    }
}

/// Rewrites methods in place, appending to the registries of the current run.
#[derive(Debug)]
pub struct InstrumentationInjector<'a> {
    conventions: &'a Conventions,
    registries: &'a Registries,
}

impl<'a> InstrumentationInjector<'a> {
    pub fn new(conventions: &'a Conventions, registries: &'a Registries) -> Self {
        Self { conventions, registries }
    }

    /// Classify `method` and apply every rewriting its role calls for.
    ///
    /// Factories are only rewired. Resumption handlers get their entry hook; those of anonymous
    /// suspend lambdas also contain the lambda body and get call-site hooks as well. Async
    /// entries get call-site hooks. Plain methods, and methods without code, are left alone.
    pub fn instrument(
        &self,
        method: &mut CompiledMethod,
        unit: &UnitHeader,
    ) -> Result<MethodOutcome, TransformError> {
        if !method.has_code() {
            trace!("skipping {}.{}: no code", unit.name, method.name);
            return Ok(MethodOutcome::new(MethodRole::Plain));
        }

        let role = MethodClassifier::new(self.conventions).classify(method, unit);
        let mut outcome = MethodOutcome::new(role);
        let locator = ContinuationLocator::new(self.conventions);

        match role {
            MethodRole::Plain => return Ok(outcome),
            MethodRole::Factory => {
                let completion = locator.completion_slot(method, unit)?;
                debug!("create in {}: {}, completion: {completion}", unit.name, method.descriptor);
                self.rewire_factory(method, unit, completion)?;
                return Ok(outcome);
            }
            MethodRole::ResumeHandler { .. } | MethodRole::AsyncEntry => {}
        }

        let continuation = locator.continuation_slot(method, unit)?;
        outcome.continuation = Some(continuation);
        debug!(
            ">>in method {}.{} with descriptor: {}, role: {role}, cont: {continuation}",
            unit.name, method.name, method.descriptor
        );

        if let MethodRole::ResumeHandler { .. } = role {
            outcome.resume_index = Some(self.hook_resume_entry(method, unit, continuation)?);
        }
        if role.scans_calls() {
            outcome.call_sites = self.hook_suspend_calls(method, unit, continuation)?;
        }

        Ok(outcome)
    }

    /// Insert the wrapped-completion construction right before the first allocation.
    pub fn rewire_factory(
        &self,
        method: &mut CompiledMethod,
        unit: &UnitHeader,
        completion: usize,
    ) -> Result<(), TransformError> {
        let completion = local_slot(completion, method, unit)?;
        let position = method
            .instructions
            .iter()
            .position(Instruction::is_allocation)
            .ok_or_else(|| TransformError::Structural {
                method: method.id(unit),
                reason: "no allocation instruction in factory".to_string(),
            })?;

        let wrap = hooks::wrapped_completion(self.conventions, completion);
        method.instructions.splice(position..position, wrap);
        Ok(())
    }

    /// Register `method` as a resumption handler and hook its entry. Returns the registry index.
    pub fn hook_resume_entry(
        &self,
        method: &mut CompiledMethod,
        unit: &UnitHeader,
        continuation: usize,
    ) -> Result<usize, TransformError> {
        let slot = local_slot(continuation, method, unit)?;
        let index = self.registries.resume_handlers.append(method.id(unit));
        let hook = hooks::resume_entry(self.conventions, slot, operand(index, method, unit)?);
        method.instructions.splice(0..0, hook);
        Ok(index)
    }

    /// Record every asynchronous call in `method` and hook right after it. Returns the registry
    /// indices in instruction order.
    pub fn hook_suspend_calls(
        &self,
        method: &mut CompiledMethod,
        unit: &UnitHeader,
        continuation: usize,
    ) -> Result<Vec<usize>, TransformError> {
        let calls = SuspendCallScanner::new(self.conventions).scan(&method.instructions);
        if calls.is_empty() {
            return Ok(vec![]);
        }
        debug!(
            "suspend calls:\n{}",
            calls.iter().map(|call| call.target.to_string()).collect::<Vec<_>>().join("\n")
        );

        let slot = local_slot(continuation, method, unit)?;
        let caller = method.id(unit);

        // A hook goes in as soon as its index is handed out. Earlier insertions shift the scanned
        // positions.
        let mut indices = Vec::with_capacity(calls.len());
        let mut shift = 0;
        for call in calls {
            let position = CallPosition::new(unit.source_file.clone(), call.line);
            let site = SuspendCall { target: call.target, caller: caller.clone(), position };
            let index = self.registries.call_sites.append(site);
            let value = operand(index, method, unit)?;
            let hook = hooks::after_suspend_call(self.conventions, slot, value);
            let at = call.position + shift + 1;
            shift += hook.len();
            method.instructions.splice(at..at, hook);
            indices.push(index);
        }

        Ok(indices)
    }
}

fn local_slot(
    slot: usize,
    method: &CompiledMethod,
    unit: &UnitHeader,
) -> Result<u16, TransformError> {
    u16::try_from(slot).map_err(|_| TransformError::Structural {
        method: method.id(unit),
        reason: format!("local slot {slot} out of range"),
    })
}

fn operand(
    index: usize,
    method: &CompiledMethod,
    unit: &UnitHeader,
) -> Result<i32, TransformError> {
    i32::try_from(index).map_err(|_| TransformError::Structural {
        method: method.id(unit),
        reason: format!("registry index {index} does not fit an integer operand"),
    })
}
