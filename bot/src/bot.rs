//! Turn entry point.

use std::collections::HashMap;
use std::sync::Arc;

use habot_dialog::{
    Activity, DialogContext, DialogError, Engine, Outbound, StepArgs, TurnStatus,
};
use habot_store::{ConversationStore, Conversations, StoreError};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    flows::{self, dialogs, Services},
    state::{ConversationRecord, ConversationState},
};

/// Message sent when a turn fails inside the dialog engine.
pub const APOLOGY: &str = "Sorry, something went wrong. Let's start over.";

/// Errors that abort a turn.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot: {0}")]
    Store(#[from] StoreError),

    #[error("bot: {0}")]
    Dialog(#[from] DialogError),
}

type TurnLock = Arc<tokio::sync::Mutex<()>>;

/// A conversation's entry in the turn lock map. Dropping it, including when
/// the turn future is cancelled, removes the entry once no other turn holds
/// or waits for it.
struct TurnSlot<'a> {
    turns: &'a Mutex<HashMap<String, TurnLock>>,
    conversation_id: &'a str,
    lock: TurnLock,
}

impl Drop for TurnSlot<'_> {
    fn drop(&mut self) {
        drop(std::mem::take(&mut self.lock));
        let mut turns = self.turns.lock();
        if turns
            .get(self.conversation_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            turns.remove(self.conversation_id);
        }
    }
}

/// The HaBot conversation front-end.
///
/// Turns of one conversation run one at a time; turns of different
/// conversations run in parallel.
pub struct Bot {
    engine: Engine<Services, ConversationState>,
    services: Arc<Services>,
    records: Conversations<ConversationRecord>,
    turns: Mutex<HashMap<String, TurnLock>>,
}

impl Bot {
    pub fn new(services: Services, store: Arc<dyn ConversationStore>) -> Result<Self, BotError> {
        Ok(Self {
            engine: Engine::new(flows::registry()?),
            services: Arc::new(services),
            records: Conversations::new(store),
            turns: Mutex::new(HashMap::new()),
        })
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Loads the persisted record of a conversation.
    pub fn record(&self, conversation_id: &str) -> Result<ConversationRecord, BotError> {
        Ok(self.records.load_or_default(conversation_id)?)
    }

    /// Handles one inbound activity and returns the replies.
    ///
    /// Only messages are processed. The top dialog is continued, and when
    /// nothing was active and nothing was said the main menu begins.
    pub async fn on_turn(&self, activity: Activity) -> Result<Vec<Outbound>, BotError> {
        if !activity.is_message() {
            debug!("ignoring {:?} activity", activity.kind);
            return Ok(Vec::new());
        }

        let conversation_id = activity.conversation_id.clone();
        let slot = self.turn_slot(&conversation_id);
        let _turn = slot.lock.lock().await;
        self.run_turn(&conversation_id, activity).await
    }

    async fn run_turn(
        &self,
        conversation_id: &str,
        activity: Activity,
    ) -> Result<Vec<Outbound>, BotError> {
        let record = match self.records.load_or_default(conversation_id) {
            Ok(record) => record,
            Err(StoreError::Corrupt { source, .. }) => {
                warn!(
                    "conversation {}: discarding unreadable record: {}",
                    conversation_id, source
                );
                ConversationRecord::default()
            }
            Err(e) => return Err(e.into()),
        };
        let mut dc = DialogContext::new(
            Arc::clone(&self.services),
            record.state,
            record.stack,
            activity,
        );

        let mut status = self.engine.continue_dialog(&mut dc).await;
        if matches!(status, Ok(TurnStatus::Empty))
            && dc.state.selected_action().is_none()
            && !dc.responded()
        {
            status = self
                .engine
                .begin(&mut dc, dialogs::MAIN, StepArgs::None)
                .await;
        }

        let failed = match status {
            Ok(TurnStatus::Complete(_)) => {
                dc.state.set_selected_action(None);
                None
            }
            Ok(_) => None,
            Err(e) => Some(e),
        };

        let parts = dc.into_parts();
        let mut record = ConversationRecord {
            state: parts.state,
            stack: parts.stack,
        };
        let mut outbound = parts.outbound;

        if let Some(e) = failed {
            if e.is_programming_error() {
                warn!("conversation {}: dialog graph error: {}", conversation_id, e);
            } else {
                warn!("conversation {}: turn failed: {}", conversation_id, e);
            }
            record.stack.clear();
            record.state.set_selected_action(None);
            outbound.push(Outbound::text(APOLOGY));
        }

        self.records.save(conversation_id, &record)?;
        Ok(outbound)
    }

    fn turn_slot<'a>(&'a self, conversation_id: &'a str) -> TurnSlot<'a> {
        let lock = Arc::clone(
            self.turns
                .lock()
                .entry(conversation_id.to_string())
                .or_insert_with(TurnLock::default),
        );
        TurnSlot {
            turns: &self.turns,
            conversation_id,
            lock,
        }
    }

    #[cfg(test)]
    fn pending_locks(&self) -> usize {
        self.turns.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use habot_cognitive::{EnrollmentStatus, OperationStatus};
    use habot_dialog::Attachment;
    use habot_store::MemoryStore;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::WorkflowConfig,
        state::StaticIdentityTable,
        testing::{operation, profile, Calls, MockFetcher, MockSentiment, MockSpeaker, MockTranscriber},
    };

    struct Fixture {
        bot: Bot,
        store: Arc<MemoryStore>,
        speaker: Arc<MockSpeaker>,
        fetcher: Arc<MockFetcher>,
    }

    fn fixture() -> Fixture {
        let speaker = Arc::new(MockSpeaker::default());
        let fetcher = Arc::new(MockFetcher::new(64000));
        let services = Services {
            speaker: speaker.clone(),
            transcriber: Arc::new(MockTranscriber {
                result: Ok("hello world".to_string()),
            }),
            sentiment: Arc::new(MockSentiment(0.8)),
            fetcher: fetcher.clone(),
            identities: Arc::new(StaticIdentityTable::builtin()),
            workflow: WorkflowConfig::default(),
        };
        let store = Arc::new(MemoryStore::new());
        let bot = Bot::new(services, store.clone()).unwrap();
        Fixture {
            bot,
            store,
            speaker,
            fetcher,
        }
    }

    impl Fixture {
        async fn say(&self, text: &str) -> Vec<String> {
            self.send(Activity::message("c1", text)).await
        }

        async fn upload(&self, content_type: &str, url: &str) -> Vec<String> {
            self.send(Activity::attachment("c1", Attachment::new(content_type, url)))
                .await
        }

        async fn send(&self, activity: Activity) -> Vec<String> {
            self.bot
                .on_turn(activity)
                .await
                .unwrap()
                .into_iter()
                .map(|o| o.text)
                .collect()
        }

        fn record(&self) -> ConversationRecord {
            self.bot.record("c1").unwrap()
        }

        fn top(&self) -> String {
            self.record().stack.top().map(|f| f.dialog.clone()).unwrap_or_default()
        }
    }

    const MENU: &str = "What do you want to do?";

    #[tokio::test]
    async fn test_first_message_shows_main_menu() {
        let f = fixture();
        let out = f.bot.on_turn(Activity::message("c1", "hi")).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, MENU);
        assert_eq!(
            out[0].suggested_actions,
            vec!["Manage Profiles", "Recognize Speaker", "Speech to Text", "Analyze text"]
        );
        assert_eq!(f.top(), dialogs::MAIN);
        assert_eq!(f.bot.pending_locks(), 0);
    }

    #[tokio::test]
    async fn test_non_message_activities_are_ignored() {
        let f = fixture();
        let mut activity = Activity::message("c1", "hi");
        activity.kind = habot_dialog::ActivityType::ConversationUpdate;
        assert!(f.bot.on_turn(activity).await.unwrap().is_empty());
        assert!(f.record().stack.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_choice_reprompts() {
        let f = fixture();
        f.say("hi").await;
        assert_eq!(f.say("dance").await, vec!["Please select an option."]);
        assert_eq!(f.top(), dialogs::MAIN);
    }

    #[tokio::test]
    async fn test_non_wav_upload_returns_to_main() {
        let f = fixture();
        f.say("hi").await;
        let before = f.record().state.known_speakers().clone();

        assert_eq!(f.say("Recognize Speaker").await, vec!["Please upload a .wav file"]);
        assert_eq!(f.top(), dialogs::RECOGNIZE_SPEAKER);

        let out = f.upload("audio/mpeg", "http://files/voice.mp3").await;
        assert_eq!(out, vec!["I didn't get a .wav file attachment...", MENU]);
        assert_eq!(f.top(), dialogs::MAIN);
        assert_eq!(f.record().stack.depth(), 1);
        assert_eq!(f.record().state.known_speakers(), &before);
        assert_eq!(f.fetcher.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(Calls::get(&f.speaker.calls.opens), 0);
    }

    #[tokio::test]
    async fn test_name_resolves_profile() {
        let f = fixture();
        f.say("hi").await;
        f.say("Manage Profiles").await;

        assert_eq!(f.say("View Profile").await, vec!["What is your name?"]);
        assert_eq!(
            f.say("Lo").await,
            vec!["Your name should be at least 2 characters long.", "What is your name?"]
        );

        let out = f.say("Loek").await;
        assert_eq!(out[0], "Loading your profile failed with error 'profile not found'.");
        assert_eq!(out[1], MENU);
        let state = f.record().state;
        assert_eq!(state.name(), Some("Loek"));
        assert_eq!(
            state.profile_id().map(|id| id.to_string()).as_deref(),
            Some("ab8d4c0d-2896-47ac-9c79-d7fb0efb1bb3")
        );
        assert_eq!(f.top(), dialogs::MANAGE_PROFILE);
    }

    #[tokio::test]
    async fn test_unknown_name_has_no_profile() {
        let f = fixture();
        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("View Profile").await;

        let out = f.say("Nobody").await;
        assert_eq!(out, vec!["I haven't seen you before, Nobody", MENU]);
        assert_eq!(f.record().state.profile_id(), None);
    }

    #[tokio::test]
    async fn test_view_enrolling_profile() {
        let f = fixture();
        f.speaker.profiles.lock().push(profile(
            StaticIdentityTable::ALEX,
            EnrollmentStatus::Enrolling,
            12.5,
        ));
        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("View Profile").await;

        let out = f.say("alex").await;
        assert_eq!(out[0], "Welcome back alex. You are enrolling, 12.5s remaining");
        assert_eq!(
            f.record().state.enrollment_status(),
            Some(EnrollmentStatus::Enrolling)
        );
    }

    #[tokio::test]
    async fn test_create_then_delete_profile() {
        let f = fixture();
        let created = Uuid::new_v4();
        *f.speaker.new_profile.lock() = Some(created);
        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("Create Profile").await;

        let out = f.say("Nobody").await;
        assert_eq!(
            out,
            vec![
                "Creating a new profile...".to_string(),
                format!("Welcome Nobody. Your new profile id is: {created}"),
                MENU.to_string(),
            ]
        );
        assert_eq!(f.record().state.profile_id(), Some(created));

        let out = f.say("Create Profile").await;
        assert_eq!(
            out,
            vec![
                format!("I know you Nobody. Your existing profile id is: {created}"),
                MENU.to_string(),
            ]
        );
        assert_eq!(Calls::get(&f.speaker.calls.created), 1);

        let out = f.say("Delete Profile").await;
        assert_eq!(out, vec!["Deleting your profile", "Deleted your profile", MENU]);
        assert_eq!(f.record().state.profile_id(), None);

        let out = f.say("Delete Profile").await;
        assert_eq!(out, vec!["I'm sorry, you don't have a profile to delete.", MENU]);
        assert_eq!(f.record().stack.depth(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrollment_timeout_message() {
        let f = fixture();
        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("Enroll Profile").await;

        let out = f.say("Alex").await;
        assert_eq!(out, vec!["Enrolling your profile", "Please upload a .wav file"]);

        let out = f.upload("audio/wav", "http://files/alex.wav").await;
        assert_eq!(
            out,
            vec![
                "Enrolling a profile with your voice...",
                "Enrollment failed with error 'Enrollment operation timeout.'.",
                "Enrolling of attachment is complete.",
                MENU,
            ]
        );
        assert_eq!(Calls::get(&f.speaker.calls.polls), 10);
        assert_eq!(f.top(), dialogs::MANAGE_PROFILE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrollment_success_updates_status() {
        let f = fixture();
        let mut done = operation(OperationStatus::Succeeded);
        done.processing_result = Some(habot_cognitive::EnrollmentResult {
            enrollment_status: EnrollmentStatus::Training,
            remaining_enrollment_speech_time: 0.0,
            speech_time: 8.0,
            enrollment_speech_time: 30.0,
        });
        f.speaker.poll_script.lock().push_back(done);

        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("Enroll Profile").await;
        f.say("Alex").await;
        let out = f.upload("audio/wav", "http://files/alex.wav").await;

        assert_eq!(
            out,
            vec![
                "Enrolling a profile with your voice...",
                "Enrolling of attachment is complete.",
                MENU,
            ]
        );
        assert_eq!(
            f.record().state.enrollment_status(),
            Some(EnrollmentStatus::Training)
        );
    }

    #[tokio::test]
    async fn test_enroll_without_profile() {
        let f = fixture();
        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("Enroll Profile").await;

        let out = f.say("Nobody").await;
        assert_eq!(out, vec!["I'm sorry, you don't have a profile to enroll.", MENU]);
        assert_eq!(Calls::get(&f.speaker.calls.submits), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recognize_speaker() {
        let f = fixture();
        f.speaker.profiles.lock().extend([
            profile(StaticIdentityTable::LOEK, EnrollmentStatus::Enrolled, 0.0),
            profile(StaticIdentityTable::ALEX, EnrollmentStatus::Enrolling, 10.0),
        ]);
        *f.speaker.identify_as.lock() = Some(StaticIdentityTable::LOEK);

        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("View Profile").await;
        f.say("Loek").await;
        f.say("Main menu").await;
        f.say("Recognize Speaker").await;

        let out = f.upload("audio/wav", "http://files/loek.wav").await;
        assert_eq!(
            out,
            vec![
                "Analyzing your voice...",
                "Recognized you, confidence 'High'.",
                "Analysis complete.",
                MENU,
            ]
        );

        let known: Vec<Uuid> = f.record().state.known_speakers().iter().copied().collect();
        assert_eq!(known, vec![StaticIdentityTable::LOEK]);
        assert_eq!(Calls::get(&f.speaker.calls.pushes), 2);
        assert_eq!(Calls::get(&f.speaker.calls.ends), 1);
        assert_eq!(Calls::get(&f.speaker.calls.closes), 1);
        assert_eq!(f.speaker.opened_with.lock().as_slice(), &[known]);
    }

    #[tokio::test]
    async fn test_recognize_without_enrolled_profiles() {
        let f = fixture();
        f.say("hi").await;
        f.say("Recognize Speaker").await;

        let out = f.upload("audio/wav", "http://files/x.wav").await;
        assert_eq!(
            out,
            vec![
                "Analyzing your voice...",
                "Recognition failed with error 'there are no enrolled profiles'.",
                "Analysis complete.",
                MENU,
            ]
        );
        assert_eq!(Calls::get(&f.speaker.calls.opens), 0);
    }

    #[tokio::test]
    async fn test_speech_to_text_and_sentiment() {
        let f = fixture();
        f.say("hi").await;
        f.say("Speech to Text").await;
        let out = f.upload("audio/wav", "http://files/speech.wav").await;
        assert_eq!(out, vec!["Analyzing text...", "hello world", "Analysis complete.", MENU]);

        assert_eq!(f.say("Analyze text").await, vec!["How is your day going?"]);
        assert_eq!(
            f.say("meh").await,
            vec!["Your sentence should be at least 4 characters long.", "How is your day going?"]
        );
        assert_eq!(f.say("Pretty good so far").await, vec!["80.00% positive", MENU]);
        assert_eq!(f.record().state.selected_action(), None);
    }

    #[tokio::test]
    async fn test_selected_action_tracks_choice() {
        let f = fixture();
        f.say("hi").await;
        f.say("Analyze text").await;
        assert_eq!(f.record().state.selected_action(), Some("Analyze text"));
    }

    #[tokio::test]
    async fn test_broken_stack_recovers() {
        let f = fixture();
        f.say("hi").await;

        let mut record = f.record();
        record.stack = serde_json::from_value(serde_json::json!([
            {"dialog": "GoneDialog", "step": 0}
        ]))
        .unwrap();
        f.bot.records.save("c1", &record).unwrap();

        let out = f.say("hello").await;
        assert_eq!(out, vec![APOLOGY]);
        assert!(f.record().stack.is_empty());

        assert_eq!(f.say("hello").await, vec![MENU]);
    }

    #[tokio::test]
    async fn test_unreadable_record_restarts_at_menu() {
        let f = fixture();
        f.store
            .save_raw(
                "c1",
                br#"{"state":{"enrollmentStatus":"Unknown"},"stack":[]}"#,
            )
            .unwrap();
        assert!(f.bot.record("c1").is_err());

        assert_eq!(f.say("hi").await, vec![MENU]);
        assert_eq!(f.top(), dialogs::MAIN);
        assert_eq!(f.record().state, ConversationState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_turn_releases_lock() {
        let f = fixture();
        f.say("hi").await;
        f.say("Manage Profiles").await;
        f.say("Enroll Profile").await;
        f.say("Alex").await;

        let upload = Activity::attachment(
            "c1",
            Attachment::new("audio/wav", "http://files/alex.wav"),
        );
        let cancelled =
            tokio::time::timeout(std::time::Duration::from_secs(20), f.bot.on_turn(upload)).await;
        assert!(cancelled.is_err());
        assert_eq!(f.bot.pending_locks(), 0);

        assert_eq!(f.send(Activity::message("c2", "hi")).await, vec![MENU]);
        assert_eq!(f.bot.pending_locks(), 0);
    }

    #[tokio::test]
    async fn test_conversations_are_isolated() {
        let f = fixture();
        f.say("hi").await;
        f.say("Analyze text").await;

        let other = f.send(Activity::message("c2", "hi")).await;
        assert_eq!(other, vec![MENU]);
        assert_eq!(f.top(), dialogs::ANALYZE_TEXT);
    }
}
