//! Loaders that fetch each calculator's rows with concurrent sub-queries.
//!
//! Sub-queries are joined with `try_join!`: the first failure fails the whole
//! dataset, so a calculator never runs on partial rows.

use std::collections::HashMap;

use dropdash_shared::errors::AppResult;

use crate::metrics::funnel::FunnelDataset;
use crate::metrics::messaging::MessagingDataset;
use crate::metrics::period::DateWindow;
use crate::models::{Gender, Profile, ProfileAssetCounts};
use crate::store::Store;

/// Milestones happen after signup, so only the lower bound carries over to
/// the milestone tables.
fn from_signup(window: &DateWindow) -> DateWindow {
    DateWindow {
        since: window.since,
        until: None,
    }
}

pub async fn funnel(store: &Store, window: DateWindow) -> AppResult<FunnelDataset> {
    let milestones = from_signup(&window);
    let (users, profiles, matches, sent_messages) = tokio::try_join!(
        store.users(window),
        store.profiles_of_signups(window),
        store.matches(milestones),
        store.sent_messages(milestones),
    )?;

    tracing::debug!(
        users = users.len(),
        profiles = profiles.len(),
        matches = matches.len(),
        messages = sent_messages.len(),
        "funnel dataset loaded"
    );

    Ok(FunnelDataset {
        users,
        profiles,
        matches,
        sent_messages,
    })
}

/// Profiles created in the window together with their asset counts.
pub async fn completeness(
    store: &Store,
    window: DateWindow,
) -> AppResult<(Vec<Profile>, HashMap<uuid::Uuid, ProfileAssetCounts>)> {
    let profiles = store.profiles(window).await?;
    let ids = profiles.iter().map(|p| p.id).collect();
    let counts = store.asset_counts(ids).await?;
    Ok((profiles, counts))
}

pub async fn messaging(store: &Store, window: DateWindow) -> AppResult<MessagingDataset> {
    // Matches and conversations are loaded unbounded: ghosting and standout
    // conversion look at the match behind a windowed conversation.
    let (matches, conversations, messages, blocks, requests, candidates, genders) = tokio::try_join!(
        store.matches(DateWindow::unbounded()),
        store.conversations(),
        store.messages(window),
        store.blocks(window),
        store.match_requests(window),
        store.standout_candidates(window),
        store.genders(),
    )?;

    tracing::debug!(
        matches = matches.len(),
        conversations = conversations.len(),
        messages = messages.len(),
        "messaging dataset loaded"
    );

    Ok(MessagingDataset {
        matches,
        conversations,
        messages,
        blocks,
        requests,
        candidates,
        genders: genders
            .into_iter()
            .map(|(id, raw)| (id, Gender::parse(&raw)))
            .collect(),
    })
}
