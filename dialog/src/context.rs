//! Turn context handed to dialog steps.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    activity::{Activity, Attachment, Outbound},
    prompt::{PromptOptions, PromptValue},
    stack::DialogStack,
};

/// Input of a step.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StepArgs {
    #[default]
    None,
    /// Arguments passed to `begin` or `replace`.
    Value(Value),
    /// Value accepted by the prompt the previous step issued.
    Prompt(PromptValue),
    /// Result of a child dialog that ended.
    Resumed(Option<Value>),
}

impl StepArgs {
    /// Accepted text input.
    pub fn text(&self) -> Option<&str> {
        match self {
            StepArgs::Prompt(PromptValue::Text { value }) => Some(value),
            _ => None,
        }
    }

    /// Label of the accepted choice.
    pub fn choice(&self) -> Option<&str> {
        match self {
            StepArgs::Prompt(PromptValue::Choice { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Accepted attachments; empty for any other input.
    pub fn attachments(&self) -> &[Attachment] {
        match self {
            StepArgs::Prompt(PromptValue::Attachments { attachments }) => attachments,
            _ => &[],
        }
    }
}

/// What a step asks the engine to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Issue a prompt and suspend until the next activity.
    Prompt { prompt: String, options: PromptOptions },
    /// Run the next step of the same dialog in this turn.
    Next(StepArgs),
    /// Pop the current dialog and begin another in its place.
    Replace { dialog: String, args: StepArgs },
    /// Push a child dialog; this dialog resumes at its next step when the
    /// child ends.
    Begin { dialog: String, args: StepArgs },
    /// Pop the current dialog, handing the result to the one below.
    End(Option<Value>),
}

impl StepOutcome {
    pub fn prompt(prompt: impl Into<String>, options: PromptOptions) -> Self {
        StepOutcome::Prompt {
            prompt: prompt.into(),
            options,
        }
    }

    pub fn next(args: StepArgs) -> Self {
        StepOutcome::Next(args)
    }

    pub fn replace(dialog: impl Into<String>) -> Self {
        StepOutcome::Replace {
            dialog: dialog.into(),
            args: StepArgs::None,
        }
    }

    pub fn begin(dialog: impl Into<String>) -> Self {
        StepOutcome::Begin {
            dialog: dialog.into(),
            args: StepArgs::None,
        }
    }

    pub fn end() -> Self {
        StepOutcome::End(None)
    }
}

/// Everything a step may touch during one turn: shared services, the
/// conversation's state, the inbound activity and the outbound queue.
pub struct DialogContext<S, C> {
    services: Arc<S>,
    /// Conversation state owned by this turn.
    pub state: C,
    pub(crate) stack: DialogStack,
    activity: Activity,
    outbound: Vec<Outbound>,
}

/// Parts returned when a turn is over.
#[derive(Debug)]
pub struct TurnParts<C> {
    pub state: C,
    pub stack: DialogStack,
    pub outbound: Vec<Outbound>,
}

impl<S, C> DialogContext<S, C> {
    pub fn new(services: Arc<S>, state: C, stack: DialogStack, activity: Activity) -> Self {
        Self {
            services,
            state,
            stack,
            activity,
            outbound: Vec::new(),
        }
    }

    /// Shared services. Returned as an owned handle so steps can keep it
    /// across awaits while mutating `state`.
    pub fn services(&self) -> Arc<S> {
        Arc::clone(&self.services)
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn stack(&self) -> &DialogStack {
        &self.stack
    }

    /// Queues a message for the user.
    pub fn send(&mut self, message: Outbound) {
        self.outbound.push(message);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send(Outbound::text(text));
    }

    /// Returns true once anything was sent this turn.
    pub fn responded(&self) -> bool {
        !self.outbound.is_empty()
    }

    pub fn outbound(&self) -> &[Outbound] {
        &self.outbound
    }

    pub fn into_parts(self) -> TurnParts<C> {
        TurnParts {
            state: self.state,
            stack: self.stack,
            outbound: self.outbound,
        }
    }
}
