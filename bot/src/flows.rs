//! The HaBot menu graph.
//!
//! ```text
//! MainDialog ── Manage Profiles ──▶ ManageProfileDialog ── View ───▶ ViewProfileDialog
//!     │                                   │              ├─ Create ─▶ CreateProfileDialog
//!     ├─ Recognize Speaker ─▶ RecognizeSpeakerDialog     ├─ Delete ─▶ DeleteProfileDialog
//!     ├─ Speech to Text ────▶ SpeechToTextDialog         ├─ Enroll ─▶ EnrollProfileDialog
//!     └─ Analyze text ──────▶ AnalyzeTextDialog          └─ Main menu ▶ MainDialog
//! ```
//!
//! Every transition replaces the top of the stack, and every leaf flow
//! replaces itself with the menu it came from, so a conversation never holds
//! more than one frame.

use std::sync::Arc;

use habot_cognitive::{format_score, EnrollmentStatus, StreamResult, MAX_IDENTIFY_CANDIDATES};
use habot_dialog::{
    BoxFuture, DialogContext, DialogDef, Prompt, PromptOptions, Registry, Result, StepArgs,
    StepOutcome,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    backend::{AttachmentFetcher, ChunkReader, SentimentScorer, SpeakerBackend, Transcriber},
    config::WorkflowConfig,
    enrollment::{EnrollmentOutcome, EnrollmentSupervisor, TIMEOUT_MESSAGE},
    recognition,
    state::{ConversationState, IdentityResolver},
};

/// Dialog names.
pub mod dialogs {
    pub const MAIN: &str = "MainDialog";
    pub const MANAGE_PROFILE: &str = "ManageProfileDialog";
    pub const RECOGNIZE_SPEAKER: &str = "RecognizeSpeakerDialog";
    pub const SPEECH_TO_TEXT: &str = "SpeechToTextDialog";
    pub const ANALYZE_TEXT: &str = "AnalyzeTextDialog";
    pub const VIEW_PROFILE: &str = "ViewProfileDialog";
    pub const CREATE_PROFILE: &str = "CreateProfileDialog";
    pub const DELETE_PROFILE: &str = "DeleteProfileDialog";
    pub const ENROLL_PROFILE: &str = "EnrollProfileDialog";
}

/// Prompt names.
pub mod prompts {
    pub const MANAGE_OR_RECOGNIZE: &str = "manageOrRecognizePrompt";
    pub const MANAGE: &str = "managePrompt";
    pub const RECOGNIZE_THIS: &str = "recognizeThisPrompt";
    pub const RECOGNIZE_THIS_STT: &str = "recognizeThisTSSPrompt";
    pub const ANALYZE_TEXT: &str = "analyzeTextPrompt";
    pub const NAME: &str = "namePrompt";
    pub const ENROLL_PROFILE: &str = "enrollProfilePrompt";
}

/// Main menu labels.
pub mod main_menu {
    pub const MANAGE_PROFILES: &str = "Manage Profiles";
    pub const RECOGNIZE_SPEAKER: &str = "Recognize Speaker";
    pub const SPEECH_TO_TEXT: &str = "Speech to Text";
    pub const ANALYZE_TEXT: &str = "Analyze text";

    pub const ALL: [&str; 4] = [MANAGE_PROFILES, RECOGNIZE_SPEAKER, SPEECH_TO_TEXT, ANALYZE_TEXT];
}

/// Profile menu labels.
pub mod profile_menu {
    pub const VIEW: &str = "View Profile";
    pub const CREATE: &str = "Create Profile";
    pub const DELETE: &str = "Delete Profile";
    pub const ENROLL: &str = "Enroll Profile";
    pub const BACK: &str = "Main menu";

    pub const ALL: [&str; 5] = [VIEW, CREATE, DELETE, ENROLL, BACK];
}

const MENU_TEXT: &str = "What do you want to do?";
const UPLOAD_TEXT: &str = "Please upload a .wav file";
const WAV_CONTENT_TYPE: &str = "audio/wav";
const NO_ATTACHMENT: &str = "I didn't get the attachment...";
const NOT_WAV: &str = "I didn't get a .wav file attachment...";

/// Backends and settings shared by every conversation.
pub struct Services {
    pub speaker: Arc<dyn SpeakerBackend>,
    pub transcriber: Arc<dyn Transcriber>,
    pub sentiment: Arc<dyn SentimentScorer>,
    pub fetcher: Arc<dyn AttachmentFetcher>,
    pub identities: Arc<dyn IdentityResolver>,
    pub workflow: WorkflowConfig,
}

type Ctx = DialogContext<Services, ConversationState>;

/// Builds the registry of all HaBot dialogs and prompts.
pub fn registry() -> Result<Registry<Services, ConversationState>> {
    Registry::builder()
        .prompt(prompts::MANAGE_OR_RECOGNIZE, Prompt::Choice)
        .prompt(prompts::MANAGE, Prompt::Choice)
        .prompt(prompts::RECOGNIZE_THIS, Prompt::Attachment)
        .prompt(prompts::RECOGNIZE_THIS_STT, Prompt::Attachment)
        .prompt(prompts::ANALYZE_TEXT, Prompt::Text(Some(validate_sentence)))
        .prompt(prompts::NAME, Prompt::Text(Some(validate_name)))
        .prompt(prompts::ENROLL_PROFILE, Prompt::Attachment)
        .dialog(
            DialogDef::new(dialogs::MAIN)
                .step(main_ask)
                .step(main_route)
                .prompts(&[prompts::MANAGE_OR_RECOGNIZE])
                .transitions(&[
                    dialogs::MAIN,
                    dialogs::MANAGE_PROFILE,
                    dialogs::RECOGNIZE_SPEAKER,
                    dialogs::SPEECH_TO_TEXT,
                    dialogs::ANALYZE_TEXT,
                ]),
        )
        .dialog(
            DialogDef::new(dialogs::MANAGE_PROFILE)
                .step(manage_ask)
                .step(manage_route)
                .prompts(&[prompts::MANAGE])
                .transitions(&[
                    dialogs::MAIN,
                    dialogs::MANAGE_PROFILE,
                    dialogs::VIEW_PROFILE,
                    dialogs::CREATE_PROFILE,
                    dialogs::DELETE_PROFILE,
                    dialogs::ENROLL_PROFILE,
                ]),
        )
        .dialog(
            DialogDef::new(dialogs::VIEW_PROFILE)
                .step(ask_name)
                .step(view_profile)
                .prompts(&[prompts::NAME])
                .transitions(&[dialogs::MANAGE_PROFILE]),
        )
        .dialog(
            DialogDef::new(dialogs::CREATE_PROFILE)
                .step(ask_name)
                .step(create_profile)
                .prompts(&[prompts::NAME])
                .transitions(&[dialogs::MANAGE_PROFILE]),
        )
        .dialog(
            DialogDef::new(dialogs::DELETE_PROFILE)
                .step(ask_name)
                .step(delete_profile)
                .prompts(&[prompts::NAME])
                .transitions(&[dialogs::MANAGE_PROFILE]),
        )
        .dialog(
            DialogDef::new(dialogs::ENROLL_PROFILE)
                .step(ask_name)
                .step(enroll_ask)
                .step(enroll_run)
                .prompts(&[prompts::NAME, prompts::ENROLL_PROFILE])
                .transitions(&[dialogs::MANAGE_PROFILE]),
        )
        .dialog(
            DialogDef::new(dialogs::RECOGNIZE_SPEAKER)
                .step(recognize_ask)
                .step(recognize_run)
                .prompts(&[prompts::RECOGNIZE_THIS])
                .transitions(&[dialogs::MAIN]),
        )
        .dialog(
            DialogDef::new(dialogs::SPEECH_TO_TEXT)
                .step(transcribe_ask)
                .step(transcribe_run)
                .prompts(&[prompts::RECOGNIZE_THIS_STT])
                .transitions(&[dialogs::MAIN]),
        )
        .dialog(
            DialogDef::new(dialogs::ANALYZE_TEXT)
                .step(analyze_text_ask)
                .step(analyze_text_run)
                .prompts(&[prompts::ANALYZE_TEXT])
                .transitions(&[dialogs::MAIN]),
        )
        .build()
}

// ================== Validators ==================

pub fn validate_name(value: &str) -> std::result::Result<(), String> {
    if value.trim().chars().count() <= 2 {
        return Err("Your name should be at least 2 characters long.".to_string());
    }
    Ok(())
}

pub fn validate_sentence(value: &str) -> std::result::Result<(), String> {
    if value.trim().chars().count() <= 4 {
        return Err("Your sentence should be at least 4 characters long.".to_string());
    }
    Ok(())
}

/// Returns the URL of the first attachment when it is a WAV file, otherwise
/// the message to show.
fn wav_url(args: &StepArgs) -> std::result::Result<String, &'static str> {
    let Some(attachment) = args.attachments().first() else {
        return Err(NO_ATTACHMENT);
    };
    if attachment.content_type != WAV_CONTENT_TYPE || attachment.content_url.trim().is_empty() {
        return Err(NOT_WAV);
    }
    Ok(attachment.content_url.clone())
}

fn display_name(dc: &Ctx) -> String {
    dc.state.name().unwrap_or_default().to_string()
}

// ================== Menus ==================

fn main_ask<'a>(dc: &'a mut Ctx, _: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        dc.state.set_selected_action(None);
        Ok(StepOutcome::prompt(
            prompts::MANAGE_OR_RECOGNIZE,
            PromptOptions::choices(MENU_TEXT, main_menu::ALL),
        ))
    })
}

fn main_route<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        let choice = args.choice().unwrap_or_default().to_string();
        let next = match choice.as_str() {
            main_menu::MANAGE_PROFILES => dialogs::MANAGE_PROFILE,
            main_menu::RECOGNIZE_SPEAKER => dialogs::RECOGNIZE_SPEAKER,
            main_menu::SPEECH_TO_TEXT => dialogs::SPEECH_TO_TEXT,
            main_menu::ANALYZE_TEXT => dialogs::ANALYZE_TEXT,
            _ => dialogs::MAIN,
        };
        dc.state.set_selected_action(Some(choice));
        Ok(StepOutcome::replace(next))
    })
}

fn manage_ask<'a>(_: &'a mut Ctx, _: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async {
        Ok(StepOutcome::prompt(
            prompts::MANAGE,
            PromptOptions::choices(MENU_TEXT, profile_menu::ALL),
        ))
    })
}

fn manage_route<'a>(_: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        let next = match args.choice().unwrap_or_default() {
            profile_menu::VIEW => dialogs::VIEW_PROFILE,
            profile_menu::CREATE => dialogs::CREATE_PROFILE,
            profile_menu::DELETE => dialogs::DELETE_PROFILE,
            profile_menu::ENROLL => dialogs::ENROLL_PROFILE,
            profile_menu::BACK => dialogs::MAIN,
            _ => dialogs::MANAGE_PROFILE,
        };
        Ok(StepOutcome::replace(next))
    })
}

// ================== Profile flows ==================

/// Asks for the user's name unless it is already known.
fn ask_name<'a>(dc: &'a mut Ctx, _: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        if dc.state.has_name() {
            return Ok(StepOutcome::next(StepArgs::None));
        }
        Ok(StepOutcome::prompt(
            prompts::NAME,
            PromptOptions::text("What is your name?"),
        ))
    })
}

/// Stores a name answered to [`ask_name`].
fn remember_name(dc: &mut Ctx, args: &StepArgs) {
    if let Some(name) = args.text() {
        let services = dc.services();
        dc.state.set_name(name.trim(), services.identities.as_ref());
    }
}

fn view_profile<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        remember_name(dc, &args);
        let name = display_name(dc);

        match dc.state.profile_id() {
            Some(profile_id) => {
                let services = dc.services();
                match services.speaker.get_profile(profile_id).await {
                    Ok(profile) => {
                        dc.state.set_enrollment_status(Some(profile.enrollment_status));
                        dc.send_text(match profile.enrollment_status {
                            EnrollmentStatus::Enrolling => format!(
                                "Welcome back {}. You are enrolling, {}s remaining",
                                name, profile.remaining_enrollment_speech_time
                            ),
                            EnrollmentStatus::Training => {
                                format!("Welcome back {name}. Your profile is being trained.")
                            }
                            EnrollmentStatus::Enrolled => {
                                format!("Welcome back {name}. Your profile is enrolled.")
                            }
                        });
                    }
                    Err(e) => {
                        warn!("loading profile {} failed: {}", profile_id, e);
                        dc.send_text(format!("Loading your profile failed with error '{e}'."));
                    }
                }
            }
            None => dc.send_text(format!("I haven't seen you before, {name}")),
        }
        Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE))
    })
}

fn create_profile<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        remember_name(dc, &args);
        let name = display_name(dc);

        if let Some(profile_id) = dc.state.profile_id() {
            dc.send_text(format!(
                "I know you {name}. Your existing profile id is: {profile_id}"
            ));
            return Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE));
        }

        dc.send_text("Creating a new profile...");
        let services = dc.services();
        match services
            .speaker
            .create_profile(&services.workflow.profile_locale)
            .await
        {
            Ok(profile_id) => {
                info!("created profile {} for {}", profile_id, name);
                dc.state.assign_profile(profile_id);
                dc.state.set_enrollment_status(Some(EnrollmentStatus::Enrolling));
                dc.send_text(format!(
                    "Welcome {name}. Your new profile id is: {profile_id}"
                ));
            }
            Err(e) => {
                warn!("creating a profile failed: {}", e);
                dc.send_text(format!("Creating a profile failed with error '{e}'."));
            }
        }
        Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE))
    })
}

fn delete_profile<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        remember_name(dc, &args);

        let Some(profile_id) = dc.state.profile_id() else {
            dc.send_text("I'm sorry, you don't have a profile to delete.");
            return Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE));
        };

        dc.send_text("Deleting your profile");
        let services = dc.services();
        match services.speaker.delete_profile(profile_id).await {
            Ok(()) => {
                info!("deleted profile {}", profile_id);
                dc.state.clear_profile();
                dc.state.set_enrollment_status(None);
                dc.send_text("Deleted your profile");
            }
            Err(e) => {
                warn!("deleting profile {} failed: {}", profile_id, e);
                dc.send_text(format!("Deleting your profile failed with error '{e}'."));
            }
        }
        Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE))
    })
}

fn enroll_ask<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        remember_name(dc, &args);

        if dc.state.profile_id().is_none() {
            dc.send_text("I'm sorry, you don't have a profile to enroll.");
            return Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE));
        }
        dc.send_text("Enrolling your profile");
        Ok(StepOutcome::prompt(
            prompts::ENROLL_PROFILE,
            PromptOptions::text(UPLOAD_TEXT),
        ))
    })
}

fn enroll_run<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        let Some(profile_id) = dc.state.profile_id() else {
            dc.send_text("I'm sorry, you don't have a profile to enroll.");
            return Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE));
        };
        let url = match wav_url(&args) {
            Ok(url) => url,
            Err(message) => {
                dc.send_text(message);
                return Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE));
            }
        };

        dc.send_text("Enrolling a profile with your voice...");
        let services = dc.services();
        match enroll_attachment(&services, profile_id, &url).await {
            Ok(EnrollmentOutcome::Success(result)) => {
                dc.state.set_enrollment_status(Some(result.enrollment_status));
            }
            Ok(EnrollmentOutcome::Failed(message)) => {
                dc.send_text(format!("Enrollment failed with error '{message}'."));
            }
            Ok(EnrollmentOutcome::TimedOut) => {
                dc.send_text(format!("Enrollment failed with error '{TIMEOUT_MESSAGE}'."));
            }
            Err(message) => {
                dc.send_text(format!("Enrollment failed with error '{message}'."));
            }
        }
        dc.send_text("Enrolling of attachment is complete.");
        Ok(StepOutcome::replace(dialogs::MANAGE_PROFILE))
    })
}

async fn enroll_attachment(
    services: &Services,
    profile_id: Uuid,
    url: &str,
) -> std::result::Result<EnrollmentOutcome, String> {
    let stream = services.fetcher.fetch(url).await.map_err(|e| e.to_string())?;
    let audio = ChunkReader::new(stream)
        .read_to_end()
        .await
        .map_err(|e| e.to_string())?;
    EnrollmentSupervisor::new(services.speaker.as_ref(), &services.workflow)
        .enroll(profile_id, audio)
        .await
        .map_err(|e| e.to_string())
}

// ================== Analysis flows ==================

fn recognize_ask<'a>(_: &'a mut Ctx, _: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async {
        Ok(StepOutcome::prompt(
            prompts::RECOGNIZE_THIS,
            PromptOptions::text(UPLOAD_TEXT),
        ))
    })
}

fn recognize_run<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        let url = match wav_url(&args) {
            Ok(url) => url,
            Err(message) => {
                dc.send_text(message);
                return Ok(StepOutcome::replace(dialogs::MAIN));
            }
        };

        let services = dc.services();
        match services.speaker.list_profiles().await {
            Ok(profiles) => {
                for profile in profiles
                    .iter()
                    .filter(|p| p.enrollment_status == EnrollmentStatus::Enrolled)
                {
                    dc.state.add_known_speaker(profile.profile_id);
                }
            }
            Err(e) => warn!("listing profiles failed: {}", e),
        }

        dc.send_text("Analyzing your voice...");

        let candidates: Vec<Uuid> = dc
            .state
            .known_speakers()
            .iter()
            .copied()
            .take(MAX_IDENTIFY_CANDIDATES)
            .collect();
        if candidates.is_empty() {
            dc.send_text("Recognition failed with error 'there are no enrolled profiles'.");
            dc.send_text("Analysis complete.");
            return Ok(StepOutcome::replace(dialogs::MAIN));
        }

        let me = dc.state.profile_id();
        let analyzed = match services.fetcher.fetch(&url).await {
            Ok(audio) => {
                recognition::analyze(
                    services.speaker.as_ref(),
                    audio,
                    &candidates,
                    &services.workflow,
                    |result| dc.send_text(describe_result(&result, me)),
                )
                .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = analyzed {
            dc.send_text(format!("Recognition failed with error '{e}'."));
        }

        dc.send_text("Analysis complete.");
        Ok(StepOutcome::replace(dialogs::MAIN))
    })
}

/// Renders one recognition result for the user whose profile is `me`.
pub fn describe_result(result: &StreamResult, me: Option<Uuid>) -> String {
    match &result.outcome {
        Ok(found) if Some(found.identified_profile_id) == me => {
            format!("Recognized you, confidence '{}'.", found.confidence)
        }
        Ok(found) => format!(
            "Recognized other profile '{}', confidence '{}'.",
            found.identified_profile_id, found.confidence
        ),
        Err(message) => format!("Recognition failed with error '{message}'."),
    }
}

fn transcribe_ask<'a>(_: &'a mut Ctx, _: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async {
        Ok(StepOutcome::prompt(
            prompts::RECOGNIZE_THIS_STT,
            PromptOptions::text(UPLOAD_TEXT),
        ))
    })
}

fn transcribe_run<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        let url = match wav_url(&args) {
            Ok(url) => url,
            Err(message) => {
                dc.send_text(message);
                return Ok(StepOutcome::replace(dialogs::MAIN));
            }
        };

        dc.send_text("Analyzing text...");
        let services = dc.services();
        match services.transcriber.transcribe(&url).await {
            Ok(text) if text.trim().is_empty() => dc.send_text("No speech was recognized."),
            Ok(text) => dc.send_text(text),
            Err(e) => {
                warn!("transcription failed: {}", e);
                dc.send_text(format!("Transcription failed with error '{e}'."));
            }
        }
        dc.send_text("Analysis complete.");
        Ok(StepOutcome::replace(dialogs::MAIN))
    })
}

fn analyze_text_ask<'a>(_: &'a mut Ctx, _: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async {
        Ok(StepOutcome::prompt(
            prompts::ANALYZE_TEXT,
            PromptOptions::text("How is your day going?"),
        ))
    })
}

fn analyze_text_run<'a>(dc: &'a mut Ctx, args: StepArgs) -> BoxFuture<'a, Result<StepOutcome>> {
    Box::pin(async move {
        let sentence = args.text().unwrap_or_default();
        let services = dc.services();
        match services.sentiment.score(sentence).await {
            Ok(score) => dc.send_text(format_score(score)),
            Err(e) => {
                warn!("sentiment analysis failed: {}", e);
                dc.send_text(format!("Sentiment analysis failed with error '{e}'."));
            }
        }
        Ok(StepOutcome::replace(dialogs::MAIN))
    })
}

#[cfg(test)]
mod tests {
    use habot_cognitive::{Confidence, Identification};
    use habot_dialog::{Attachment, PromptValue};

    use super::*;

    #[test]
    fn test_registry_builds() {
        let registry = registry().unwrap();
        assert_eq!(registry.dialog_names().len(), 9);
        assert!(registry.contains_dialog(dialogs::ENROLL_PROFILE));
        assert!(registry.prompt(prompts::RECOGNIZE_THIS_STT).is_ok());
    }

    #[test]
    fn test_validators() {
        assert_eq!(
            validate_name("Al"),
            Err("Your name should be at least 2 characters long.".to_string())
        );
        assert!(validate_name("Ali").is_ok());
        assert_eq!(
            validate_sentence("good"),
            Err("Your sentence should be at least 4 characters long.".to_string())
        );
        assert!(validate_sentence("great").is_ok());
    }

    fn attachments(items: Vec<Attachment>) -> StepArgs {
        StepArgs::Prompt(PromptValue::Attachments { attachments: items })
    }

    #[test]
    fn test_wav_url_checks() {
        assert_eq!(wav_url(&StepArgs::None), Err(NO_ATTACHMENT));
        assert_eq!(wav_url(&attachments(vec![])), Err(NO_ATTACHMENT));
        assert_eq!(
            wav_url(&attachments(vec![Attachment::new("audio/mpeg", "http://x/a.mp3")])),
            Err(NOT_WAV)
        );
        assert_eq!(
            wav_url(&attachments(vec![Attachment::new("audio/wav", "  ")])),
            Err(NOT_WAV)
        );
        assert_eq!(
            wav_url(&attachments(vec![Attachment::new("audio/wav", "http://x/a.wav")])),
            Ok("http://x/a.wav".to_string())
        );
    }

    #[test]
    fn test_describe_result() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let result = |outcome| StreamResult {
            client_id: Uuid::nil(),
            request_id: 0,
            is_final: true,
            outcome,
        };
        let found = |id| {
            Ok(Identification {
                identified_profile_id: id,
                confidence: Confidence::Normal,
            })
        };

        assert_eq!(
            describe_result(&result(found(me)), Some(me)),
            "Recognized you, confidence 'Normal'."
        );
        assert_eq!(
            describe_result(&result(found(other)), Some(me)),
            format!("Recognized other profile '{other}', confidence 'Normal'.")
        );
        assert_eq!(
            describe_result(&result(Err("timeout".into())), None),
            "Recognition failed with error 'timeout'."
        );
    }
}
