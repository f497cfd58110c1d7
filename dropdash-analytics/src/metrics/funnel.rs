//! Activation funnel: signup → profile → complete → match → message.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::numeric::{hours_between, mean, pct, round2, zero_if_none};
use crate::metrics::period::DateWindow;
use crate::models::{Match, Profile, SentMessage, User};

/// Rows the funnel needs. `users` may be pre-filtered by the store; the
/// window is applied again here so the calculation stands on its own.
#[derive(Debug, Default)]
pub struct FunnelDataset {
    pub users: Vec<User>,
    pub profiles: Vec<Profile>,
    pub matches: Vec<Match>,
    pub sent_messages: Vec<SentMessage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FunnelStages {
    pub signups: i64,
    pub profiles_created: i64,
    pub profiles_completed: i64,
    pub with_match: i64,
    pub with_message: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FunnelRates {
    pub signup_to_profile: f64,
    pub profile_to_complete: f64,
    pub complete_to_match: f64,
    pub match_to_message: f64,
    pub overall: f64,
}

impl From<&FunnelStages> for FunnelRates {
    fn from(s: &FunnelStages) -> Self {
        Self {
            signup_to_profile: round2(pct(s.profiles_created, s.signups)),
            profile_to_complete: round2(pct(s.profiles_completed, s.profiles_created)),
            complete_to_match: round2(pct(s.with_match, s.profiles_completed)),
            match_to_message: round2(pct(s.with_message, s.with_match)),
            overall: round2(pct(s.with_message, s.signups)),
        }
    }
}

/// Mean hours from signup to each milestone, over users who reached it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FunnelTimings {
    #[serde(serialize_with = "zero_if_none")]
    pub avg_hours_to_profile: Option<f64>,
    #[serde(serialize_with = "zero_if_none")]
    pub avg_hours_to_complete: Option<f64>,
    #[serde(serialize_with = "zero_if_none")]
    pub avg_hours_to_first_match: Option<f64>,
    #[serde(serialize_with = "zero_if_none")]
    pub avg_hours_to_first_message: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunnelSnapshot {
    pub stages: FunnelStages,
    pub rates: FunnelRates,
    pub timings: FunnelTimings,
}

/// Earliest timestamp per key; ties on time keep the smaller id so the
/// choice does not depend on row order.
fn earliest_by<K, I>(rows: I) -> HashMap<K, (DateTime<Utc>, Uuid)>
where
    K: std::hash::Hash + Eq,
    I: IntoIterator<Item = (K, DateTime<Utc>, Uuid)>,
{
    let mut out: HashMap<K, (DateTime<Utc>, Uuid)> = HashMap::new();
    for (key, at, id) in rows {
        out.entry(key)
            .and_modify(|cur| {
                if (at, id) < *cur {
                    *cur = (at, id);
                }
            })
            .or_insert((at, id));
    }
    out
}

pub fn compute(data: &FunnelDataset, window: &DateWindow) -> FunnelSnapshot {
    let mut profile_by_user: HashMap<Uuid, &Profile> = HashMap::new();
    for p in &data.profiles {
        profile_by_user
            .entry(p.user_id)
            .and_modify(|cur| {
                if (p.created_at, p.id) < (cur.created_at, cur.id) {
                    *cur = p;
                }
            })
            .or_insert(p);
    }

    let first_match = earliest_by(data.matches.iter().flat_map(|m| {
        [
            (m.profile1_id, m.created_at, m.id),
            (m.profile2_id, m.created_at, m.id),
        ]
    }));
    // Only conversation openers count, so replying to someone else's
    // opener does not reach the message stage.
    let mut openers: HashMap<Uuid, &SentMessage> = HashMap::new();
    for m in &data.sent_messages {
        openers
            .entry(m.conversation_id)
            .and_modify(|cur| {
                if (m.created_at, m.id) < (cur.created_at, cur.id) {
                    *cur = m;
                }
            })
            .or_insert(m);
    }
    let first_message = earliest_by(
        openers
            .values()
            .map(|m| (m.sender_profile_id, m.created_at, m.id)),
    );

    let mut stages = FunnelStages::default();
    let mut to_profile = Vec::new();
    let mut to_complete = Vec::new();
    let mut to_match = Vec::new();
    let mut to_message = Vec::new();

    // Each stage only counts users who passed the previous one.
    for user in data.users.iter().filter(|u| window.contains(u.created_at)) {
        stages.signups += 1;
        let since_signup = |at: DateTime<Utc>| hours_between(user.created_at, at).max(0.0);

        let Some(profile) = profile_by_user.get(&user.id) else {
            continue;
        };
        stages.profiles_created += 1;
        to_profile.push(since_signup(profile.created_at));

        if !profile.completed {
            continue;
        }
        stages.profiles_completed += 1;
        if let Some(at) = profile.completed_at {
            to_complete.push(since_signup(at));
        }

        let Some((matched_at, _)) = first_match.get(&profile.id) else {
            continue;
        };
        stages.with_match += 1;
        to_match.push(since_signup(*matched_at));

        let Some((messaged_at, _)) = first_message.get(&profile.id) else {
            continue;
        };
        stages.with_message += 1;
        to_message.push(since_signup(*messaged_at));
    }

    let snapshot = FunnelSnapshot {
        rates: FunnelRates::from(&stages),
        stages,
        timings: FunnelTimings {
            avg_hours_to_profile: mean(to_profile),
            avg_hours_to_complete: mean(to_complete),
            avg_hours_to_first_match: mean(to_match),
            avg_hours_to_first_message: mean(to_message),
        },
    };

    tracing::debug!(
        signups = snapshot.stages.signups,
        with_message = snapshot.stages.with_message,
        overall = snapshot.rates.overall,
        "funnel computed"
    );

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
    }

    struct Builder {
        data: FunnelDataset,
    }

    impl Builder {
        fn new() -> Self {
            Self { data: FunnelDataset::default() }
        }

        /// Adds a user who reached `depth` stages (0 = signup only, 4 = messaged).
        fn user(&mut self, depth: u8) -> &mut Self {
            let user = User { id: Uuid::new_v4(), created_at: t0(), last_seen_at: None };
            if depth >= 1 {
                let profile = Profile {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    gender: "woman".into(),
                    bio: None,
                    school: None,
                    job_title: None,
                    hometown: None,
                    neighborhood: None,
                    height: None,
                    completed: depth >= 2,
                    status: "active".into(),
                    waitlist_city_id: None,
                    completed_at: (depth >= 2).then(|| t0() + Duration::hours(4)),
                    created_at: t0() + Duration::hours(2),
                };
                if depth >= 3 {
                    self.data.matches.push(Match {
                        id: Uuid::new_v4(),
                        profile1_id: profile.id,
                        profile2_id: Uuid::new_v4(),
                        drop_id: None,
                        created_at: t0() + Duration::hours(24),
                        profile1_unmatched_at: None,
                        profile2_unmatched_at: None,
                    });
                }
                if depth >= 4 {
                    for h in [30, 48] {
                        self.data.sent_messages.push(SentMessage {
                            id: Uuid::new_v4(),
                            conversation_id: Uuid::new_v4(),
                            sender_profile_id: profile.id,
                            created_at: t0() + Duration::hours(h),
                        });
                    }
                }
                self.data.profiles.push(profile);
            }
            self.data.users.push(user);
            self
        }

        fn many(&mut self, n: usize, depth: u8) -> &mut Self {
            for _ in 0..n {
                self.user(depth);
            }
            self
        }
    }

    #[test]
    fn reference_scenario_rates() {
        let mut b = Builder::new();
        // 100 signups, 80 profiles, 40 completed, 10 matched, 4 messaged
        b.many(20, 0).many(40, 1).many(30, 2).many(6, 3).many(4, 4);
        let snap = compute(&b.data, &DateWindow::unbounded());

        assert_eq!(
            snap.stages,
            FunnelStages {
                signups: 100,
                profiles_created: 80,
                profiles_completed: 40,
                with_match: 10,
                with_message: 4,
            }
        );
        assert_eq!(snap.rates.signup_to_profile, 80.0);
        assert_eq!(snap.rates.profile_to_complete, 50.0);
        assert_eq!(snap.rates.complete_to_match, 25.0);
        assert_eq!(snap.rates.match_to_message, 40.0);
        assert_eq!(snap.rates.overall, 4.0);
    }

    #[test]
    fn empty_population_has_zero_rates() {
        let snap = compute(&FunnelDataset::default(), &DateWindow::unbounded());
        assert_eq!(snap.rates, FunnelRates::default());
        assert_eq!(snap.timings.avg_hours_to_profile, None);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["timings"]["avg_hours_to_first_message"], 0.0);
        assert_eq!(json["rates"]["overall"], 0.0);
    }

    #[test]
    fn timings_ignore_users_who_never_reached_the_milestone() {
        let mut b = Builder::new();
        b.many(3, 0).many(1, 4);
        let snap = compute(&b.data, &DateWindow::unbounded());
        assert_eq!(snap.timings.avg_hours_to_profile, Some(2.0));
        assert_eq!(snap.timings.avg_hours_to_complete, Some(4.0));
        assert_eq!(snap.timings.avg_hours_to_first_match, Some(24.0));
        // earliest of the two messages
        assert_eq!(snap.timings.avg_hours_to_first_message, Some(30.0));
    }

    #[test]
    fn stages_never_increase_even_with_inconsistent_rows() {
        let mut b = Builder::new();
        b.many(5, 1);
        // incomplete profiles that somehow matched and messaged
        let ids: Vec<Uuid> = b.data.profiles.iter().map(|p| p.id).collect();
        for id in ids {
            b.data.matches.push(Match {
                id: Uuid::new_v4(),
                profile1_id: Uuid::new_v4(),
                profile2_id: id,
                drop_id: None,
                created_at: t0(),
                profile1_unmatched_at: None,
                profile2_unmatched_at: None,
            });
            b.data.sent_messages.push(SentMessage {
                id: Uuid::new_v4(),
                conversation_id: Uuid::new_v4(),
                sender_profile_id: id,
                created_at: t0(),
            });
        }
        let s = compute(&b.data, &DateWindow::unbounded()).stages;
        assert!(s.with_message <= s.with_match);
        assert!(s.with_match <= s.profiles_completed);
        assert!(s.profiles_completed <= s.profiles_created);
        assert!(s.profiles_created <= s.signups);
    }

    #[test]
    fn replying_to_an_opener_is_not_a_first_message() {
        let mut b = Builder::new();
        b.many(2, 3);
        let replier = b.data.profiles[0].id;
        let opener = b.data.profiles[1].id;
        let conversation_id = Uuid::new_v4();
        b.data.sent_messages.push(SentMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender_profile_id: opener,
            created_at: t0() + Duration::hours(30),
        });
        b.data.sent_messages.push(SentMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender_profile_id: replier,
            created_at: t0() + Duration::hours(31),
        });

        let snap = compute(&b.data, &DateWindow::unbounded());
        assert_eq!(snap.stages.with_match, 2);
        assert_eq!(snap.stages.with_message, 1);
        assert_eq!(snap.timings.avg_hours_to_first_message, Some(30.0));
    }

    #[test]
    fn opener_ties_break_on_message_id() {
        let mut b = Builder::new();
        // p matched, q completed but never matched
        b.many(1, 3).many(1, 2);
        let (p, q) = (b.data.profiles[0].id, b.data.profiles[1].id);
        let conversation_id = Uuid::new_v4();
        let (low, high) = {
            let x = Uuid::new_v4();
            let y = Uuid::new_v4();
            if x < y { (x, y) } else { (y, x) }
        };
        let at = t0() + Duration::hours(30);
        b.data.sent_messages.push(SentMessage { id: high, conversation_id, sender_profile_id: p, created_at: at });
        b.data.sent_messages.push(SentMessage { id: low, conversation_id, sender_profile_id: q, created_at: at });

        // Same timestamp: the smaller id opened, so p only replied.
        let snap = compute(&b.data, &DateWindow::unbounded());
        assert_eq!(snap.stages.with_match, 1);
        assert_eq!(snap.stages.with_message, 0);
    }

    #[test]
    fn window_bounds_signups() {
        let mut b = Builder::new();
        b.many(4, 1);
        b.data.users[0].created_at = t0() - Duration::days(60);
        let window = DateWindow { since: Some(t0() - Duration::days(30)), until: None };
        let snap = compute(&b.data, &window);
        assert_eq!(snap.stages.signups, 3);
        assert_eq!(snap.stages.profiles_created, 3);
    }
}
