//! Prompt definitions and input recognition.

use serde::{Deserialize, Serialize};

use crate::activity::{Activity, Attachment, Outbound};

/// Default retry text of choice prompts.
pub const DEFAULT_CHOICE_RETRY: &str = "Please select an option.";

/// Checks text input. `Err` carries the message sent to the user.
pub type TextValidator = fn(&str) -> std::result::Result<(), String>;

/// A registered prompt.
#[derive(Debug, Clone, Copy)]
pub enum Prompt {
    /// Closed set of labels, matched case-insensitively or by 1-based index.
    Choice,
    /// Free text, optionally checked by a validator.
    Text(Option<TextValidator>),
    /// At least one attachment. Content checks belong to the consuming step.
    Attachment,
}

/// Per-use options of a prompt, persisted with the suspended frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_text: Option<String>,
}

impl PromptOptions {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Options of a choice prompt with the default retry text.
    pub fn choices<I, T>(text: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            text: text.into(),
            choices: choices.into_iter().map(Into::into).collect(),
            retry_text: Some(DEFAULT_CHOICE_RETRY.to_string()),
        }
    }
}

/// A value accepted by a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PromptValue {
    Choice { index: usize, value: String },
    Text { value: String },
    Attachments { attachments: Vec<Attachment> },
}

/// Outcome of matching an activity against a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    Accepted(PromptValue),
    /// The prompt is re-issued. `message`, when set, is sent first.
    Rejected { message: Option<String> },
}

impl Prompt {
    /// Builds the message that asks for input.
    pub fn issue(&self, options: &PromptOptions) -> Outbound {
        match self {
            Prompt::Choice => Outbound::with_actions(options.text.clone(), options.choices.clone()),
            Prompt::Text(_) | Prompt::Attachment => Outbound::text(options.text.clone()),
        }
    }

    /// Builds the message that asks again after a rejected input.
    pub fn reissue(&self, options: &PromptOptions) -> Outbound {
        let text = options.retry_text.as_deref().unwrap_or(&options.text);
        match self {
            Prompt::Choice => Outbound::with_actions(text, options.choices.clone()),
            Prompt::Text(_) | Prompt::Attachment => Outbound::text(text),
        }
    }

    /// Matches an activity against this prompt. Pure: the same input always
    /// yields the same recognition.
    pub fn recognize(&self, options: &PromptOptions, activity: &Activity) -> Recognition {
        match self {
            Prompt::Choice => match find_choice(&options.choices, activity.text()) {
                Some(index) => Recognition::Accepted(PromptValue::Choice {
                    index,
                    value: options.choices[index].clone(),
                }),
                None => Recognition::Rejected { message: None },
            },
            Prompt::Text(validator) => {
                let text = activity.text();
                if text.is_empty() {
                    return Recognition::Rejected { message: None };
                }
                match validator.map(|v| v(text)) {
                    Some(Err(message)) => Recognition::Rejected {
                        message: Some(message),
                    },
                    _ => Recognition::Accepted(PromptValue::Text {
                        value: text.to_string(),
                    }),
                }
            }
            Prompt::Attachment => {
                if activity.attachments.is_empty() {
                    Recognition::Rejected { message: None }
                } else {
                    Recognition::Accepted(PromptValue::Attachments {
                        attachments: activity.attachments.clone(),
                    })
                }
            }
        }
    }
}

fn find_choice(choices: &[String], input: &str) -> Option<usize> {
    if input.is_empty() {
        return None;
    }
    if let Some(i) = choices.iter().position(|c| c.eq_ignore_ascii_case(input)) {
        return Some(i);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=choices.len()).contains(&n) => Some(n - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> PromptOptions {
        PromptOptions::choices("What do you want to do?", ["Manage Profiles", "Analyze text"])
    }

    #[test]
    fn test_choice_by_label_and_ordinal() {
        let p = Prompt::Choice;
        let got = p.recognize(&menu(), &Activity::message("c", "  analyze TEXT "));
        assert_eq!(
            got,
            Recognition::Accepted(PromptValue::Choice {
                index: 1,
                value: "Analyze text".into()
            })
        );

        let got = p.recognize(&menu(), &Activity::message("c", "1"));
        assert!(matches!(got, Recognition::Accepted(PromptValue::Choice { index: 0, .. })));

        for bad in ["0", "3", "manage", ""] {
            let got = p.recognize(&menu(), &Activity::message("c", bad));
            assert_eq!(got, Recognition::Rejected { message: None }, "input {bad:?}");
        }
    }

    #[test]
    fn test_choice_reissue_keeps_options() {
        let out = Prompt::Choice.reissue(&menu());
        assert_eq!(out.text, DEFAULT_CHOICE_RETRY);
        assert_eq!(out.suggested_actions, menu().choices);
    }

    #[test]
    fn test_text_validator() {
        fn at_least_three(s: &str) -> Result<(), String> {
            if s.chars().count() < 3 {
                Err("too short".into())
            } else {
                Ok(())
            }
        }
        let p = Prompt::Text(Some(at_least_three));
        let opts = PromptOptions::text("Name?");
        assert_eq!(
            p.recognize(&opts, &Activity::message("c", "ab")),
            Recognition::Rejected {
                message: Some("too short".into())
            }
        );
        assert_eq!(
            p.recognize(&opts, &Activity::message("c", "abc")),
            Recognition::Accepted(PromptValue::Text {
                value: "abc".into()
            })
        );
        assert_eq!(p.reissue(&opts).text, "Name?");
    }

    #[test]
    fn test_attachment_required() {
        let p = Prompt::Attachment;
        let opts = PromptOptions::text("Upload");
        assert!(matches!(
            p.recognize(&opts, &Activity::message("c", "no file")),
            Recognition::Rejected { message: None }
        ));

        let att = Attachment::new("image/png", "http://x/y.png");
        assert!(matches!(
            p.recognize(&opts, &Activity::attachment("c", att)),
            Recognition::Accepted(PromptValue::Attachments { .. })
        ));
    }
}
