//! Waterfall interpreter.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{
    context::{DialogContext, StepArgs, StepOutcome},
    error::{DialogError, Result},
    prompt::Recognition,
    registry::Registry,
    stack::{DialogFrame, PendingPrompt},
};

/// Where a turn left the stack.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnStatus {
    /// `continue_dialog` found no active dialog.
    Empty,
    /// The top frame is suspended on a prompt.
    Waiting,
    /// The last dialog ended; the stack is idle.
    Complete(Option<Value>),
}

/// Runs dialogs from a shared [`Registry`].
pub struct Engine<S, C> {
    registry: Arc<Registry<S, C>>,
}

impl<S, C> Clone for Engine<S, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S, C> Engine<S, C>
where
    S: Send + Sync,
    C: Send,
{
    pub fn new(registry: Registry<S, C>) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Registry<S, C> {
        &self.registry
    }

    /// Pushes `dialog` and runs its first step.
    pub async fn begin(
        &self,
        dc: &mut DialogContext<S, C>,
        dialog: &str,
        args: StepArgs,
    ) -> Result<TurnStatus> {
        self.registry.dialog(dialog)?;
        dc.stack.push(DialogFrame::new(dialog));
        self.run(dc, args).await
    }

    /// Replaces the top frame with `dialog`. The depth never grows.
    pub async fn replace(
        &self,
        dc: &mut DialogContext<S, C>,
        dialog: &str,
        args: StepArgs,
    ) -> Result<TurnStatus> {
        self.registry.dialog(dialog)?;
        dc.stack.pop();
        dc.stack.push(DialogFrame::new(dialog));
        self.run(dc, args).await
    }

    /// Resumes the top frame with the context's activity.
    ///
    /// A frame suspended on a prompt has the activity validated first. A
    /// rejected input re-issues the prompt and leaves the frame untouched.
    pub async fn continue_dialog(&self, dc: &mut DialogContext<S, C>) -> Result<TurnStatus> {
        let Some(frame) = dc.stack.top() else {
            return Ok(TurnStatus::Empty);
        };

        let Some(pending) = frame.pending.clone() else {
            debug!("{} resumed without a pending prompt", frame.dialog);
            advance(dc);
            return self.run(dc, StepArgs::None).await;
        };

        let prompt = *self.registry.prompt(&pending.prompt)?;
        match prompt.recognize(&pending.options, dc.activity()) {
            Recognition::Rejected { message } => {
                debug!("{} rejected input", pending.prompt);
                if let Some(message) = message {
                    dc.send_text(message);
                }
                dc.send(prompt.reissue(&pending.options));
                Ok(TurnStatus::Waiting)
            }
            Recognition::Accepted(value) => {
                if let Some(top) = dc.stack.top_mut() {
                    top.pending = None;
                }
                advance(dc);
                self.run(dc, StepArgs::Prompt(value)).await
            }
        }
    }

    async fn run(&self, dc: &mut DialogContext<S, C>, mut args: StepArgs) -> Result<TurnStatus> {
        loop {
            let Some(frame) = dc.stack.top() else {
                return Ok(TurnStatus::Complete(None));
            };
            let dialog = frame.dialog.clone();
            let index = frame.step;
            let def = self.registry.dialog(&dialog)?;

            let outcome = match def.steps().get(index) {
                Some(step) => {
                    debug!("running {} step {}", dialog, index);
                    step(dc, std::mem::take(&mut args))
                        .await
                        .map_err(|e| match e {
                            DialogError::Failed(message) => DialogError::Step {
                                dialog: dialog.clone(),
                                step: index,
                                message,
                            },
                            other => other,
                        })?
                }
                // Falling off the last step ends the dialog.
                None => StepOutcome::End(None),
            };

            match outcome {
                StepOutcome::Prompt { prompt, options } => {
                    let issued = self.registry.prompt(&prompt)?.issue(&options);
                    dc.send(issued);
                    if let Some(top) = dc.stack.top_mut() {
                        top.pending = Some(PendingPrompt { prompt, options });
                    }
                    return Ok(TurnStatus::Waiting);
                }
                StepOutcome::Next(next) => {
                    advance(dc);
                    args = next;
                }
                StepOutcome::Replace { dialog, args: next } => {
                    self.registry.dialog(&dialog)?;
                    debug!("replacing top with {}", dialog);
                    dc.stack.pop();
                    dc.stack.push(DialogFrame::new(dialog));
                    args = next;
                }
                StepOutcome::Begin { dialog, args: next } => {
                    self.registry.dialog(&dialog)?;
                    debug!("beginning child {}", dialog);
                    advance(dc);
                    dc.stack.push(DialogFrame::new(dialog));
                    args = next;
                }
                StepOutcome::End(result) => {
                    dc.stack.pop();
                    if dc.stack.is_empty() {
                        return Ok(TurnStatus::Complete(result));
                    }
                    args = StepArgs::Resumed(result);
                }
            }
        }
    }
}

fn advance<S, C>(dc: &mut DialogContext<S, C>) {
    if let Some(top) = dc.stack.top_mut() {
        top.step += 1;
    }
}
