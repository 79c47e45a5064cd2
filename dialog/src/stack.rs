//! Per-conversation dialog stack.

use serde::{Deserialize, Serialize};

use crate::prompt::PromptOptions;

/// Prompt a frame is suspended on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPrompt {
    pub prompt: String,
    pub options: PromptOptions,
}

/// One active dialog and its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogFrame {
    pub dialog: String,
    pub step: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingPrompt>,
}

impl DialogFrame {
    pub fn new(dialog: impl Into<String>) -> Self {
        Self {
            dialog: dialog.into(),
            step: 0,
            pending: None,
        }
    }
}

/// Observable state of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState<'a> {
    Idle,
    Active(&'a DialogFrame),
    SuspendedOnPrompt(&'a DialogFrame, &'a PendingPrompt),
}

/// Ordered dialog frames; the last frame is the top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DialogStack {
    frames: Vec<DialogFrame>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }

    pub(crate) fn push(&mut self, frame: DialogFrame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<DialogFrame> {
        self.frames.pop()
    }

    /// Drops every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frames from bottom to top.
    pub fn frames(&self) -> &[DialogFrame] {
        &self.frames
    }

    pub fn state(&self) -> StackState<'_> {
        match self.frames.last() {
            None => StackState::Idle,
            Some(frame) => match &frame.pending {
                Some(pending) => StackState::SuspendedOnPrompt(frame, pending),
                None => StackState::Active(frame),
            },
        }
    }
}
