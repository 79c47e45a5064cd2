//! Per-conversation profile state.

use std::collections::{BTreeSet, HashMap};

use habot_cognitive::EnrollmentStatus;
use habot_dialog::DialogStack;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maps a display name to a pre-assigned profile id.
pub trait IdentityResolver: Send + Sync {
    /// Returns the profile id for `name`, or `None` for a name never seen.
    fn resolve(&self, name: &str) -> Option<Uuid>;
}

/// Fixed, case-insensitive name table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityTable {
    entries: HashMap<String, Uuid>,
}

impl StaticIdentityTable {
    pub const ALEX: Uuid = Uuid::from_u128(0x4ac7dda3_56a5_45cc_8bda_1183899bf4bf);
    pub const LOEK: Uuid = Uuid::from_u128(0xab8d4c0d_2896_47ac_9c79_d7fb0efb1bb3);
    pub const STRANGER: Uuid = Uuid::from_u128(0x36ca1410_4460_4271_aeca_9aa4934842f7);

    /// The three demo identities.
    pub fn builtin() -> Self {
        Self::from_entries([
            ("Loek", Self::LOEK),
            ("Alex", Self::ALEX),
            ("Stranger", Self::STRANGER),
        ])
    }

    pub fn from_entries<I, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, Uuid)>,
        N: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, id)| (name.as_ref().to_uppercase(), id))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IdentityResolver for StaticIdentityTable {
    fn resolve(&self, name: &str) -> Option<Uuid> {
        self.entries.get(&name.trim().to_uppercase()).copied()
    }
}

/// Profile fields of one conversation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enrollment_status: Option<EnrollmentStatus>,
    #[serde(default)]
    known_speakers: BTreeSet<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_action: Option<String>,
}

impl ConversationState {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns true when a non-blank name is set.
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Sets the name and re-derives the profile id from it. A name the
    /// resolver does not know clears the profile id.
    pub fn set_name(&mut self, name: impl Into<String>, resolver: &dyn IdentityResolver) {
        let name = name.into();
        self.profile_id = resolver.resolve(&name);
        self.name = Some(name);
    }

    pub fn profile_id(&self) -> Option<Uuid> {
        self.profile_id
    }

    /// Assigns a freshly created profile.
    pub fn assign_profile(&mut self, profile_id: Uuid) {
        self.profile_id = Some(profile_id);
    }

    pub fn clear_profile(&mut self) {
        self.profile_id = None;
    }

    pub fn enrollment_status(&self) -> Option<EnrollmentStatus> {
        self.enrollment_status
    }

    pub fn set_enrollment_status(&mut self, status: Option<EnrollmentStatus>) {
        self.enrollment_status = status;
    }

    pub fn known_speakers(&self) -> &BTreeSet<Uuid> {
        &self.known_speakers
    }

    /// Adds a speaker. The set only grows.
    pub fn add_known_speaker(&mut self, id: Uuid) -> bool {
        self.known_speakers.insert(id)
    }

    pub fn selected_action(&self) -> Option<&str> {
        self.selected_action.as_deref()
    }

    pub fn set_selected_action(&mut self, action: Option<String>) {
        self.selected_action = action;
    }
}

/// Everything persisted for one conversation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    #[serde(default)]
    pub state: ConversationState,
    #[serde(default)]
    pub stack: DialogStack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_resolve_case_insensitively() {
        let table = StaticIdentityTable::builtin();
        assert_eq!(table.len(), 3);
        for name in ["Loek", "loek", "LOEK", " Loek "] {
            assert_eq!(table.resolve(name), Some(StaticIdentityTable::LOEK), "{name:?}");
        }
        assert_eq!(table.resolve("alex"), Some(StaticIdentityTable::ALEX));
        assert_eq!(table.resolve("stranger"), Some(StaticIdentityTable::STRANGER));
        assert_eq!(
            StaticIdentityTable::LOEK.to_string(),
            "ab8d4c0d-2896-47ac-9c79-d7fb0efb1bb3"
        );
    }

    #[test]
    fn test_set_name_derives_profile() {
        let table = StaticIdentityTable::builtin();
        let mut state = ConversationState::default();

        state.set_name("Loek", &table);
        assert_eq!(state.profile_id(), Some(StaticIdentityTable::LOEK));
        assert!(state.has_name());

        state.set_name("Nobody", &table);
        assert_eq!(state.name(), Some("Nobody"));
        assert_eq!(state.profile_id(), None);
    }

    #[test]
    fn test_set_name_is_deterministic() {
        let table = StaticIdentityTable::builtin();
        for name in ["Alex", "alex", "Someone", ""] {
            let mut a = ConversationState::default();
            let mut b = ConversationState::default();
            b.assign_profile(Uuid::new_v4());
            a.set_name(name, &table);
            b.set_name(name, &table);
            assert_eq!(a.profile_id(), b.profile_id(), "{name:?}");
        }
    }

    #[test]
    fn test_known_speakers_only_grow() {
        let mut state = ConversationState::default();
        assert!(state.add_known_speaker(StaticIdentityTable::ALEX));
        assert!(!state.add_known_speaker(StaticIdentityTable::ALEX));
        state.clear_profile();
        assert_eq!(state.known_speakers().len(), 1);
    }

    #[test]
    fn test_record_json() {
        let mut record = ConversationRecord::default();
        record.state.set_name("Alex", &StaticIdentityTable::builtin());
        record.state.set_enrollment_status(Some(EnrollmentStatus::Training));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["state"]["name"], "Alex");
        assert_eq!(json["state"]["profileId"], "4ac7dda3-56a5-45cc-8bda-1183899bf4bf");
        assert_eq!(json["state"]["enrollmentStatus"], "Training");
        assert_eq!(json["stack"], serde_json::json!([]));

        let back: ConversationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
