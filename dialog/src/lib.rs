//! Waterfall dialog engine.
//!
//! A dialog is a named, ordered list of steps. Each conversation owns a
//! [`DialogStack`] of active dialogs; the top frame records which step runs
//! next and, while waiting for the user, the prompt it is suspended on.
//!
//! Steps are plain functions. They read and mutate the conversation state
//! through a [`DialogContext`] and tell the [`Engine`] what to do next by
//! returning a [`StepOutcome`]: prompt, fall through, replace, begin a child
//! or end.
//!
//! # Example
//!
//! ```rust
//! use habot_dialog::{
//!     Activity, BoxFuture, DialogContext, DialogDef, DialogStack, Engine, Prompt,
//!     PromptOptions, Registry, Result, StepArgs, StepOutcome,
//! };
//! use std::sync::Arc;
//!
//! fn ask<'a>(_: &'a mut DialogContext<(), String>, _: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
//!     Box::pin(async { Ok(StepOutcome::prompt("name", PromptOptions::text("Name?"))) })
//! }
//!
//! fn greet<'a>(dc: &'a mut DialogContext<(), String>, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
//!     Box::pin(async move {
//!         dc.state = args.text().unwrap_or_default().to_string();
//!         dc.send_text(format!("Hello {}", dc.state));
//!         Ok(StepOutcome::end())
//!     })
//! }
//!
//! # tokio_test_block_on(async {
//! let registry = Registry::builder()
//!     .prompt("name", Prompt::Text(None))
//!     .dialog(DialogDef::new("greet").step(ask).step(greet).prompts(&["name"]))
//!     .build()?;
//! let engine = Engine::new(registry);
//!
//! let mut dc = DialogContext::new(Arc::new(()), String::new(), DialogStack::new(), Activity::message("c1", "hi"));
//! engine.begin(&mut dc, "greet", StepArgs::None).await?;
//! let parts = dc.into_parts();
//!
//! let mut dc = DialogContext::new(Arc::new(()), parts.state, parts.stack, Activity::message("c1", "Loek"));
//! engine.continue_dialog(&mut dc).await?;
//! assert_eq!(dc.outbound()[0].text, "Hello Loek");
//! # Ok::<(), habot_dialog::DialogError>(())
//! # }).unwrap();
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

mod activity;
mod context;
mod engine;
mod error;
mod prompt;
mod registry;
mod stack;

pub use activity::{Activity, ActivityType, Attachment, Outbound};
pub use context::{DialogContext, StepArgs, StepOutcome, TurnParts};
pub use engine::{Engine, TurnStatus};
pub use error::{DialogError, Result};
pub use prompt::{
    Prompt, PromptOptions, PromptValue, Recognition, TextValidator, DEFAULT_CHOICE_RETRY,
};
pub use registry::{BoxFuture, DialogDef, Registry, RegistryBuilder, Step};
pub use stack::{DialogFrame, DialogStack, PendingPrompt, StackState};
