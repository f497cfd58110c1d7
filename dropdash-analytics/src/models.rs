use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    blocks, conversations, match_candidates, match_drop_stats, match_drops, match_requests,
    matches, messages, profiles, users, waitlist_cities,
};

// --- Gender ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Man,
    Woman,
    NonBinary,
    /// Anything the store holds that is not one of the three known values.
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "man" => Gender::Man,
            "woman" => Gender::Woman,
            "non_binary" => Gender::NonBinary,
            _ => Gender::Other,
        }
    }
}

// --- User ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

// --- Profile ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub gender: String,
    pub bio: Option<String>,
    pub school: Option<String>,
    pub job_title: Option<String>,
    pub hometown: Option<String>,
    pub neighborhood: Option<String>,
    pub height: Option<i32>,
    pub completed: bool,
    pub status: String,
    pub waitlist_city_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn gender(&self) -> Gender {
        Gender::parse(&self.gender)
    }
}

/// Per-profile counts of the assets that feed the completeness score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileAssetCounts {
    pub photos: i64,
    pub prompts: i64,
    pub interests: i64,
}

// --- Match ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = matches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Match {
    pub id: Uuid,
    pub profile1_id: Uuid,
    pub profile2_id: Uuid,
    pub drop_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub profile1_unmatched_at: Option<DateTime<Utc>>,
    pub profile2_unmatched_at: Option<DateTime<Utc>>,
}

impl Match {
    /// A match stays active until either side unmatches.
    pub fn is_active(&self) -> bool {
        self.profile1_unmatched_at.is_none() && self.profile2_unmatched_at.is_none()
    }
}

// --- Conversation ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Conversation {
    pub id: Uuid,
    pub match_id: Uuid,
    pub profile1_contact_exchanged_at: Option<DateTime<Utc>>,
    pub profile2_contact_exchanged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn contact_exchanged(&self) -> bool {
        self.profile1_contact_exchanged_at.is_some() || self.profile2_contact_exchanged_at.is_some()
    }
}

// --- Message ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_profile_id: Uuid,
    pub content: String,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

/// Narrow projection of a message without its body.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SentMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_profile_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- Block ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Block {
    pub id: Uuid,
    pub blocker_profile_id: Uuid,
    pub blocked_profile_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- Match Requests & Candidates ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = match_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchRequest {
    pub id: Uuid,
    pub sender_profile_id: Uuid,
    pub receiver_profile_id: Uuid,
    pub drop_id: Option<Uuid>,
    pub status: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchRequest {
    pub fn is_rejected(&self) -> bool {
        self.status.eq_ignore_ascii_case("rejected")
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = match_candidates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchCandidate {
    pub id: Uuid,
    pub drop_id: Uuid,
    pub profile_id: Uuid,
    pub candidate_profile_id: Uuid,
    pub is_standout: bool,
    pub created_at: DateTime<Utc>,
}

// --- Drops ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = match_drops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchDrop {
    pub id: Uuid,
    pub city_id: Option<Uuid>,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = match_drop_stats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchDropStats {
    pub drop_id: Uuid,
    pub participants: i64,
    pub participants_men: i64,
    pub participants_women: i64,
    pub participants_nonbinary: i64,
    pub requests_sent: i64,
    pub requests_accepted: i64,
    pub requests_rejected: i64,
    pub matches: i64,
    pub conversations: i64,
    pub unmatches: i64,
    pub updated_at: DateTime<Utc>,
}

// --- Waitlist Cities ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = waitlist_cities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WaitlistCity {
    pub id: Uuid,
    pub name: String,
    pub country: Option<String>,
    pub population: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parse_buckets_unknown_values() {
        assert_eq!(Gender::parse("man"), Gender::Man);
        assert_eq!(Gender::parse("Woman "), Gender::Woman);
        assert_eq!(Gender::parse("non_binary"), Gender::NonBinary);
        assert_eq!(Gender::parse("robot"), Gender::Other);
        assert_eq!(Gender::parse(""), Gender::Other);
    }

    #[test]
    fn match_is_inactive_once_either_side_unmatches() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut m = Match {
            id: Uuid::new_v4(),
            profile1_id: a,
            profile2_id: b,
            drop_id: None,
            created_at: Utc::now(),
            profile1_unmatched_at: None,
            profile2_unmatched_at: None,
        };
        assert!(m.is_active());

        m.profile2_unmatched_at = Some(Utc::now());
        assert!(!m.is_active());

        m.profile2_unmatched_at = None;
        m.profile1_unmatched_at = Some(Utc::now());
        assert!(!m.is_active());
    }
}
