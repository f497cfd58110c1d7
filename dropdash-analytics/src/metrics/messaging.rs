//! Conversation and message engagement statistics.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::gender::GenderCounts;
use crate::metrics::numeric::{hours_between, mean, median, pct, round2, zero_if_none};
use crate::metrics::period::DateWindow;
use crate::metrics::plans::PlanDetector;
use crate::models::{
    Block, Conversation, Gender, Match, MatchCandidate, MatchRequest, Message,
};

/// A conversation whose last message is older than this is ghosted.
pub const GHOST_AFTER_DAYS: i64 = 7;

#[derive(Debug, Default)]
pub struct MessagingDataset {
    pub matches: Vec<Match>,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub blocks: Vec<Block>,
    pub requests: Vec<MatchRequest>,
    pub candidates: Vec<MatchCandidate>,
    /// Gender per profile id, for the by-gender buckets.
    pub genders: HashMap<Uuid, Gender>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagingStats {
    pub total_matches: i64,
    pub total_conversations: i64,
    pub total_messages: i64,
    #[serde(serialize_with = "zero_if_none")]
    pub avg_messages_per_conversation: Option<f64>,
    pub matches_with_messages_pct: f64,
    pub first_message_reply_rate: f64,
    #[serde(serialize_with = "zero_if_none")]
    pub avg_response_time_hours: Option<f64>,
    #[serde(serialize_with = "zero_if_none")]
    pub median_response_time_hours: Option<f64>,
    pub double_text_rate: f64,
    pub ghost_rate: f64,
    pub mutual_messaging_rate: f64,
    pub contact_exchange_rate: f64,
    pub block_rate: f64,
    pub unmatch_rate: f64,
    pub plans_rate: f64,
    pub liked_message_rate: f64,
    pub standout_conversion_rate: f64,
    pub rejection_by_gender: GenderCounts,
    pub first_message_by_gender: GenderCounts,
}

fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Per-conversation facts derived from its ordered messages.
struct Thread<'a> {
    conversation_id: Uuid,
    messages: Vec<&'a Message>,
}

impl Thread<'_> {
    fn first(&self) -> &Message {
        self.messages[0]
    }

    fn last(&self) -> &Message {
        self.messages[self.messages.len() - 1]
    }

    fn replied(&self) -> bool {
        let opener = self.first().sender_profile_id;
        self.messages[1..].iter().any(|m| m.sender_profile_id != opener)
    }

    fn response_hours(&self) -> impl Iterator<Item = f64> + '_ {
        self.messages
            .windows(2)
            .filter(|w| w[0].sender_profile_id != w[1].sender_profile_id)
            .map(|w| hours_between(w[0].created_at, w[1].created_at))
    }

    fn double_texted(&self) -> bool {
        self.messages
            .windows(2)
            .any(|w| w[0].sender_profile_id == w[1].sender_profile_id)
    }

    fn mutual(&self) -> bool {
        let senders: HashSet<Uuid> = self.messages.iter().map(|m| m.sender_profile_id).collect();
        senders.len() >= 2
    }
}

fn group_threads<'a>(messages: &'a [Message], window: &DateWindow) -> Vec<Thread<'a>> {
    let mut grouped: HashMap<Uuid, Vec<&'a Message>> = HashMap::new();
    for m in messages.iter().filter(|m| window.contains(m.created_at)) {
        grouped.entry(m.conversation_id).or_default().push(m);
    }

    let mut out: Vec<Thread<'a>> = grouped
        .into_iter()
        .map(|(conversation_id, mut msgs)| {
            msgs.sort_by_key(|m| (m.created_at, m.id));
            Thread { conversation_id, messages: msgs }
        })
        .collect();
    out.sort_by_key(|t| t.conversation_id);
    out
}

fn count_where(threads: &[Thread<'_>], pred: impl Fn(&Thread<'_>) -> bool) -> i64 {
    threads.iter().filter(|&t| pred(t)).count() as i64
}

pub fn compute(
    data: &MessagingDataset,
    window: &DateWindow,
    now: DateTime<Utc>,
    detector: &PlanDetector,
) -> MessagingStats {
    let gender_of = |profile_id: &Uuid| data.genders.get(profile_id).copied().unwrap_or(Gender::Other);

    let conversations: HashMap<Uuid, &Conversation> =
        data.conversations.iter().map(|c| (c.id, c)).collect();
    let conversation_by_match: HashMap<Uuid, Uuid> =
        data.conversations.iter().map(|c| (c.match_id, c.id)).collect();
    let matches: HashMap<Uuid, &Match> = data.matches.iter().map(|m| (m.id, m)).collect();

    let windowed_matches: Vec<&Match> = data
        .matches
        .iter()
        .filter(|m| window.contains(m.created_at))
        .collect();
    let total_matches = windowed_matches.len() as i64;

    let threads = group_threads(&data.messages, window);
    let total_conversations = threads.len() as i64;
    let total_messages: i64 = threads.iter().map(|t| t.messages.len() as i64).sum();
    let messaged: HashSet<Uuid> = threads.iter().map(|t| t.conversation_id).collect();

    let matches_with_messages = windowed_matches
        .iter()
        .filter(|m| {
            conversation_by_match
                .get(&m.id)
                .is_some_and(|c| messaged.contains(c))
        })
        .count() as i64;

    let response_hours: Vec<f64> = threads.iter().flat_map(|t| t.response_hours()).collect();

    let ghost_cutoff = now - Duration::days(GHOST_AFTER_DAYS);
    let live: Vec<&Thread<'_>> = threads
        .iter()
        .filter(|t| {
            conversations
                .get(&t.conversation_id)
                .and_then(|c| matches.get(&c.match_id))
                .is_some_and(|m| m.is_active())
        })
        .collect();
    let ghosted = live.iter().filter(|t| t.last().created_at < ghost_cutoff).count() as i64;

    let contact_exchanged = count_where(&threads, |t| {
        conversations
            .get(&t.conversation_id)
            .is_some_and(|c| c.contact_exchanged())
    });
    let with_plans = count_where(&threads, |t| {
        detector.conversation_has_plans(t.messages.iter().map(|m| m.content.as_str()))
    });

    let blocks = data.blocks.iter().filter(|b| window.contains(b.created_at)).count() as i64;
    let unmatched = windowed_matches.iter().filter(|m| !m.is_active()).count() as i64;
    let liked = threads
        .iter()
        .flat_map(|t| t.messages.iter())
        .filter(|m| m.is_liked)
        .count() as i64;

    // Latest active, conversed match per unordered pair.
    let mut conversed_pairs: HashMap<(Uuid, Uuid), DateTime<Utc>> = HashMap::new();
    for m in data.matches.iter().filter(|m| m.is_active() && conversation_by_match.contains_key(&m.id)) {
        conversed_pairs
            .entry(pair_key(m.profile1_id, m.profile2_id))
            .and_modify(|at| *at = (*at).max(m.created_at))
            .or_insert(m.created_at);
    }
    let standouts: Vec<&MatchCandidate> = data
        .candidates
        .iter()
        .filter(|c| c.is_standout && window.contains(c.created_at))
        .collect();
    let standouts_converted = standouts
        .iter()
        .filter(|c| {
            conversed_pairs
                .get(&pair_key(c.profile_id, c.candidate_profile_id))
                .is_some_and(|at| *at >= c.created_at)
        })
        .count() as i64;

    let rejection_by_gender: GenderCounts = data
        .requests
        .iter()
        .filter(|r| r.is_rejected() && window.contains(r.created_at))
        .map(|r| gender_of(&r.sender_profile_id))
        .collect();
    let first_message_by_gender: GenderCounts = threads
        .iter()
        .map(|t| gender_of(&t.first().sender_profile_id))
        .collect();

    let stats = MessagingStats {
        total_matches,
        total_conversations,
        total_messages,
        avg_messages_per_conversation: (total_conversations > 0)
            .then(|| total_messages as f64 / total_conversations as f64),
        matches_with_messages_pct: round2(pct(matches_with_messages, total_matches)),
        first_message_reply_rate: round2(pct(count_where(&threads, |t| t.replied()), total_conversations)),
        median_response_time_hours: median(response_hours.clone()),
        avg_response_time_hours: mean(response_hours),
        double_text_rate: round2(pct(count_where(&threads, |t| t.double_texted()), total_conversations)),
        ghost_rate: round2(pct(ghosted, live.len() as i64)),
        mutual_messaging_rate: round2(pct(count_where(&threads, |t| t.mutual()), total_conversations)),
        contact_exchange_rate: round2(pct(contact_exchanged, total_conversations)),
        block_rate: round2(pct(blocks, total_matches)),
        unmatch_rate: round2(pct(unmatched, total_matches)),
        plans_rate: round2(pct(with_plans, total_conversations)),
        liked_message_rate: round2(pct(liked, total_messages)),
        standout_conversion_rate: round2(pct(standouts_converted, standouts.len() as i64)),
        rejection_by_gender,
        first_message_by_gender,
    };

    tracing::debug!(
        conversations = stats.total_conversations,
        messages = stats.total_messages,
        ghost_rate = stats.ghost_rate,
        plans_rate = stats.plans_rate,
        "messaging stats computed"
    );

    stats
}
