//! Instruction sequences injected into rewritten methods.

use crate::{
    analysis::conventions::{Conventions, HOOK_DESCRIPTOR, ON_ASYNC_CALL_RETURN, ON_RESUME_ENTRY},
    artifact::{Instruction, InvokeKind, ValueKind},
};

fn hook_call(
    conventions: &Conventions,
    hook: &str,
    continuation: u16,
    index: i32,
) -> Vec<Instruction> {
    vec![
        Instruction::Load { kind: ValueKind::Reference, slot: continuation },
        Instruction::Push { value: index },
        Instruction::Invoke {
            kind: InvokeKind::Static,
            owner: conventions.hooks_owner.clone(),
            name: hook.to_string(),
            descriptor: HOOK_DESCRIPTOR.to_string(),
        },
    ]
}

/// `onAsyncCallReturn(continuation, index)`, placed right after an asynchronous call.
pub fn after_suspend_call(
    conventions: &Conventions,
    continuation: u16,
    index: i32,
) -> Vec<Instruction> {
    hook_call(conventions, ON_ASYNC_CALL_RETURN, continuation, index)
}

/// `onResumeEntry(continuation, index)`, placed at the very start of a resumption handler.
pub fn resume_entry(conventions: &Conventions, continuation: u16, index: i32) -> Vec<Instruction> {
    hook_call(conventions, ON_RESUME_ENTRY, continuation, index)
}

/// `completion = new WrappedCompletion(completion)`, placed before the allocation in a factory.
pub fn wrapped_completion(conventions: &Conventions, completion: u16) -> Vec<Instruction> {
    let wrapper = &conventions.wrapped_completion_type;
    vec![
        Instruction::New { class: wrapper.clone() },
        Instruction::Dup,
        Instruction::Load { kind: ValueKind::Reference, slot: completion },
        Instruction::Invoke {
            kind: InvokeKind::Special,
            owner: wrapper.clone(),
            name: "<init>".to_string(),
            descriptor: format!("(L{};)V", conventions.continuation_type),
        },
        Instruction::Store { kind: ValueKind::Reference, slot: completion },
    ]
}
