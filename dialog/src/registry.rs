//! Dialog and prompt registry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::{
    context::{DialogContext, StepArgs, StepOutcome},
    error::{DialogError, Result},
    prompt::Prompt,
};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One waterfall step.
pub type Step<S, C> =
    for<'a> fn(&'a mut DialogContext<S, C>, StepArgs) -> BoxFuture<'a, Result<StepOutcome>>;

/// A named dialog: ordered steps plus the prompts and dialogs its steps may
/// reference, checked when the registry is built.
pub struct DialogDef<S, C> {
    name: String,
    steps: Vec<Step<S, C>>,
    prompts: Vec<String>,
    transitions: Vec<String>,
}

impl<S, C> DialogDef<S, C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            prompts: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Appends a step.
    pub fn step(mut self, step: Step<S, C>) -> Self {
        self.steps.push(step);
        self
    }

    /// Declares prompts issued by the steps.
    pub fn prompts(mut self, names: &[&str]) -> Self {
        self.prompts.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Declares dialogs the steps replace to or begin.
    pub fn transitions(mut self, names: &[&str]) -> Self {
        self.transitions.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step<S, C>] {
        &self.steps
    }
}

/// Immutable set of dialogs and prompts shared by every conversation.
pub struct Registry<S, C> {
    dialogs: HashMap<String, DialogDef<S, C>>,
    prompts: HashMap<String, Prompt>,
}

impl<S, C> Registry<S, C> {
    pub fn builder() -> RegistryBuilder<S, C> {
        RegistryBuilder {
            dialogs: Vec::new(),
            prompts: Vec::new(),
        }
    }

    pub fn dialog(&self, name: &str) -> Result<&DialogDef<S, C>> {
        self.dialogs
            .get(name)
            .ok_or_else(|| DialogError::UnknownDialog(name.to_string()))
    }

    pub fn prompt(&self, name: &str) -> Result<&Prompt> {
        self.prompts
            .get(name)
            .ok_or_else(|| DialogError::UnknownPrompt(name.to_string()))
    }

    pub fn contains_dialog(&self, name: &str) -> bool {
        self.dialogs.contains_key(name)
    }

    /// Registered dialog names, sorted.
    pub fn dialog_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialogs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects dialogs and prompts, validating them in [`RegistryBuilder::build`].
pub struct RegistryBuilder<S, C> {
    dialogs: Vec<DialogDef<S, C>>,
    prompts: Vec<(String, Prompt)>,
}

impl<S, C> RegistryBuilder<S, C> {
    pub fn prompt(mut self, name: impl Into<String>, prompt: Prompt) -> Self {
        self.prompts.push((name.into(), prompt));
        self
    }

    pub fn dialog(mut self, dialog: DialogDef<S, C>) -> Self {
        self.dialogs.push(dialog);
        self
    }

    pub fn build(self) -> Result<Registry<S, C>> {
        let mut prompts = HashMap::with_capacity(self.prompts.len());
        for (name, prompt) in self.prompts {
            if prompts.insert(name.clone(), prompt).is_some() {
                return Err(DialogError::DuplicatePrompt(name));
            }
        }

        let mut dialogs = HashMap::with_capacity(self.dialogs.len());
        for dialog in self.dialogs {
            if dialog.steps.is_empty() {
                return Err(DialogError::EmptyDialog(dialog.name));
            }
            if let Some(missing) = dialog.prompts.iter().find(|p| !prompts.contains_key(*p)) {
                return Err(DialogError::UnknownPrompt(missing.clone()));
            }
            let name = dialog.name.clone();
            if dialogs.insert(name.clone(), dialog).is_some() {
                return Err(DialogError::DuplicateDialog(name));
            }
        }

        for dialog in dialogs.values() {
            if let Some(missing) = dialog
                .transitions
                .iter()
                .find(|t| !dialogs.contains_key(*t))
            {
                return Err(DialogError::UnknownDialog(missing.clone()));
            }
        }

        Ok(Registry { dialogs, prompts })
    }
}
