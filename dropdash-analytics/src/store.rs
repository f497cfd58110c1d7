//! Read-only data access. Every query runs on the blocking pool with its own
//! pooled connection, so independent queries can be joined concurrently.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use dropdash_shared::clients::db::DbPool;
use dropdash_shared::errors::{AppError, AppResult};

use crate::metrics::period::DateWindow;
use crate::models::{
    Block, Conversation, Match, MatchCandidate, MatchDrop, MatchDropStats, MatchRequest, Message,
    Profile, ProfileAssetCounts, SentMessage, User, WaitlistCity,
};
use crate::schema::{
    blocks, conversations, match_candidates, match_drop_stats, match_drops, match_requests,
    matches, messages, profile_interests, profiles, prompt_responses, uploads, users,
    waitlist_cities,
};

/// Applies a half-open window to a boxed query on `$column`.
macro_rules! bounded {
    ($query:expr, $column:expr, $window:expr) => {{
        let mut q = $query;
        if let Some(since) = $window.since {
            q = q.filter($column.ge(since));
        }
        if let Some(until) = $window.until {
            q = q.filter($column.lt(until));
        }
        q
    }};
}

#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, query: &'static str, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;
            f(&mut conn).map_err(|e| {
                tracing::warn!(query, error = %e, "analytics query failed");
                AppError::from(e)
            })
        })
        .await
        .map_err(|e| AppError::unavailable(format!("{query} query did not complete: {e}")))?
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.run("ping", |conn| diesel::sql_query("SELECT 1").execute(conn).map(|_| ()))
            .await
    }

    // --- Users & profiles ---

    pub async fn users(&self, window: DateWindow) -> AppResult<Vec<User>> {
        self.run("users", move |conn| {
            bounded!(
                users::table.select(User::as_select()).into_boxed(),
                users::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    /// Profiles created in the window.
    pub async fn profiles(&self, window: DateWindow) -> AppResult<Vec<Profile>> {
        self.run("profiles", move |conn| {
            bounded!(
                profiles::table.select(Profile::as_select()).into_boxed(),
                profiles::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    /// Profiles of users who signed up in the window.
    pub async fn profiles_of_signups(&self, window: DateWindow) -> AppResult<Vec<Profile>> {
        self.run("profiles_of_signups", move |conn| {
            bounded!(
                profiles::table
                    .inner_join(users::table)
                    .select(Profile::as_select())
                    .into_boxed(),
                users::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    pub async fn profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        self.run("profile", move |conn| {
            profiles::table
                .find(id)
                .select(Profile::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    pub async fn city_profiles(&self, city_id: Uuid) -> AppResult<Vec<Profile>> {
        self.run("city_profiles", move |conn| {
            profiles::table
                .filter(profiles::waitlist_city_id.eq(city_id))
                .select(Profile::as_select())
                .load(conn)
        })
        .await
    }

    pub async fn genders(&self) -> AppResult<Vec<(Uuid, String)>> {
        self.run("genders", |conn| {
            profiles::table
                .select((profiles::id, profiles::gender))
                .load(conn)
        })
        .await
    }

    /// Photo, prompt and interest counts for the given profiles. Profiles
    /// with no assets are absent from the map.
    pub async fn asset_counts(&self, ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, ProfileAssetCounts>> {
        let photo_ids = ids.clone();
        let prompt_ids = ids.clone();
        let (photos, prompts, interests) = tokio::try_join!(
            self.run("photo_counts", move |conn| {
                uploads::table
                    .filter(uploads::upload_type.eq("photo"))
                    .filter(uploads::profile_id.eq_any(photo_ids))
                    .group_by(uploads::profile_id)
                    .select((uploads::profile_id, count_star()))
                    .load::<(Uuid, i64)>(conn)
            }),
            self.run("prompt_counts", move |conn| {
                prompt_responses::table
                    .filter(prompt_responses::profile_id.eq_any(prompt_ids))
                    .group_by(prompt_responses::profile_id)
                    .select((prompt_responses::profile_id, count_star()))
                    .load::<(Uuid, i64)>(conn)
            }),
            self.run("interest_counts", move |conn| {
                profile_interests::table
                    .filter(profile_interests::profile_id.eq_any(ids))
                    .group_by(profile_interests::profile_id)
                    .select((profile_interests::profile_id, count_star()))
                    .load::<(Uuid, i64)>(conn)
            }),
        )?;

        let mut counts: HashMap<Uuid, ProfileAssetCounts> = HashMap::new();
        for (id, n) in photos {
            counts.entry(id).or_default().photos = n;
        }
        for (id, n) in prompts {
            counts.entry(id).or_default().prompts = n;
        }
        for (id, n) in interests {
            counts.entry(id).or_default().interests = n;
        }
        Ok(counts)
    }

    // --- Matches & messaging ---

    pub async fn matches(&self, window: DateWindow) -> AppResult<Vec<Match>> {
        self.run("matches", move |conn| {
            bounded!(
                matches::table.select(Match::as_select()).into_boxed(),
                matches::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    pub async fn conversations(&self) -> AppResult<Vec<Conversation>> {
        self.run("conversations", |conn| {
            conversations::table.select(Conversation::as_select()).load(conn)
        })
        .await
    }

    pub async fn messages(&self, window: DateWindow) -> AppResult<Vec<Message>> {
        self.run("messages", move |conn| {
            bounded!(
                messages::table
                    .select(Message::as_select())
                    .order((messages::created_at.asc(), messages::id.asc()))
                    .into_boxed(),
                messages::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    pub async fn sent_messages(&self, window: DateWindow) -> AppResult<Vec<SentMessage>> {
        self.run("sent_messages", move |conn| {
            bounded!(
                messages::table.select(SentMessage::as_select()).into_boxed(),
                messages::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    pub async fn blocks(&self, window: DateWindow) -> AppResult<Vec<Block>> {
        self.run("blocks", move |conn| {
            bounded!(
                blocks::table.select(Block::as_select()).into_boxed(),
                blocks::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    pub async fn match_requests(&self, window: DateWindow) -> AppResult<Vec<MatchRequest>> {
        self.run("match_requests", move |conn| {
            bounded!(
                match_requests::table.select(MatchRequest::as_select()).into_boxed(),
                match_requests::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    pub async fn standout_candidates(&self, window: DateWindow) -> AppResult<Vec<MatchCandidate>> {
        self.run("standout_candidates", move |conn| {
            bounded!(
                match_candidates::table
                    .filter(match_candidates::is_standout.eq(true))
                    .select(MatchCandidate::as_select())
                    .into_boxed(),
                match_candidates::created_at,
                window
            )
            .load(conn)
        })
        .await
    }

    // --- Drops ---

    pub async fn drop(&self, id: Uuid) -> AppResult<Option<MatchDrop>> {
        self.run("drop", move |conn| {
            match_drops::table
                .find(id)
                .select(MatchDrop::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    /// Drops in the same city that started before `before`.
    pub async fn earlier_drops(&self, city_id: Option<Uuid>, before: DateTime<Utc>) -> AppResult<Vec<MatchDrop>> {
        self.run("earlier_drops", move |conn| {
            let query = match_drops::table
                .filter(match_drops::starts_at.lt(before))
                .select(MatchDrop::as_select())
                .into_boxed();
            let query = match city_id {
                Some(city) => query.filter(match_drops::city_id.eq(city)),
                None => query.filter(match_drops::city_id.is_null()),
            };
            query.load(conn)
        })
        .await
    }

    pub async fn drop_stats(&self, drop_id: Uuid) -> AppResult<Option<MatchDropStats>> {
        self.run("drop_stats", move |conn| {
            match_drop_stats::table
                .find(drop_id)
                .select(MatchDropStats::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    // --- Cities ---

    pub async fn cities(&self) -> AppResult<Vec<WaitlistCity>> {
        self.run("cities", |conn| {
            waitlist_cities::table
                .select(WaitlistCity::as_select())
                .order(waitlist_cities::name.asc())
                .load(conn)
        })
        .await
    }

    pub async fn city(&self, id: Uuid) -> AppResult<Option<WaitlistCity>> {
        self.run("city", move |conn| {
            waitlist_cities::table
                .find(id)
                .select(WaitlistCity::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    /// Waitlisted profiles per city, over profiles created in the window.
    pub async fn waitlist_counts(&self, window: DateWindow) -> AppResult<HashMap<Uuid, i64>> {
        let city_ids: Vec<Option<Uuid>> = self
            .run("waitlist_counts", move |conn| {
                bounded!(
                    profiles::table
                        .filter(profiles::waitlist_city_id.is_not_null())
                        .select(profiles::waitlist_city_id)
                        .into_boxed(),
                    profiles::created_at,
                    window
                )
                .load(conn)
            })
            .await?;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for id in city_ids.into_iter().flatten() {
            *counts.entry(id).or_default() += 1;
        }
        Ok(counts)
    }
}
