//! Profile completeness scoring.
//!
//! Fixed point allocation with no partial credit per field:
//!
//! | item                  | points            |
//! |-----------------------|-------------------|
//! | bio                   | 15                |
//! | school, job title     | 10 each           |
//! | hometown, neighborhood, height | 5 each   |
//! | photos                | 5 each, up to 6   |
//! | prompt responses      | 5 each, up to 3   |
//! | at least one interest | 5                 |
//!
//! The weights sum to exactly 100, so every score lies in `[0, 100]`.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::metrics::gender::{GenderAverages, ALL_GENDERS};
use crate::metrics::numeric::{mean, pct, zero_if_none};
use crate::models::{Gender, Profile, ProfileAssetCounts};

const BIO_POINTS: u32 = 15;
const SCHOOL_POINTS: u32 = 10;
const JOB_TITLE_POINTS: u32 = 10;
const HOMETOWN_POINTS: u32 = 5;
const NEIGHBORHOOD_POINTS: u32 = 5;
const HEIGHT_POINTS: u32 = 5;
const POINTS_PER_PHOTO: u32 = 5;
const MAX_SCORED_PHOTOS: i64 = 6;
const POINTS_PER_PROMPT: u32 = 5;
const MAX_SCORED_PROMPTS: i64 = 3;
const INTEREST_POINTS: u32 = 5;

/// Everything the score depends on, and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessInput<'a> {
    pub bio: Option<&'a str>,
    pub school: Option<&'a str>,
    pub job_title: Option<&'a str>,
    pub hometown: Option<&'a str>,
    pub neighborhood: Option<&'a str>,
    pub height: Option<i32>,
    pub photo_count: i64,
    pub prompt_count: i64,
    pub interest_count: i64,
}

impl<'a> CompletenessInput<'a> {
    pub fn from_profile(profile: &'a Profile, counts: ProfileAssetCounts) -> Self {
        Self {
            bio: profile.bio.as_deref(),
            school: profile.school.as_deref(),
            job_title: profile.job_title.as_deref(),
            hometown: profile.hometown.as_deref(),
            neighborhood: profile.neighborhood.as_deref(),
            height: profile.height,
            photo_count: counts.photos,
            prompt_count: counts.prompts,
            interest_count: counts.interests,
        }
    }
}

/// Which scored items a profile has filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldFlags {
    pub bio: bool,
    pub school: bool,
    pub job_title: bool,
    pub hometown: bool,
    pub neighborhood: bool,
    pub height: bool,
    pub photos: bool,
    pub photos_full: bool,
    pub prompts: bool,
    pub prompts_full: bool,
    pub interests: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletenessScore {
    pub score: u8,
    pub fields: FieldFlags,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileCompleteness {
    pub profile_id: Uuid,
    pub gender: Gender,
    #[serde(flatten)]
    pub completeness: CompletenessScore,
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Score a single profile.
pub fn score(input: &CompletenessInput<'_>) -> CompletenessScore {
    let photos = input.photo_count.clamp(0, MAX_SCORED_PHOTOS);
    let prompts = input.prompt_count.clamp(0, MAX_SCORED_PROMPTS);

    let fields = FieldFlags {
        bio: present(input.bio),
        school: present(input.school),
        job_title: present(input.job_title),
        hometown: present(input.hometown),
        neighborhood: present(input.neighborhood),
        height: input.height.is_some(),
        photos: photos > 0,
        photos_full: photos == MAX_SCORED_PHOTOS,
        prompts: prompts > 0,
        prompts_full: prompts == MAX_SCORED_PROMPTS,
        interests: input.interest_count > 0,
    };

    let points = |flag: bool, pts: u32| if flag { pts } else { 0 };
    let total = points(fields.bio, BIO_POINTS)
        + points(fields.school, SCHOOL_POINTS)
        + points(fields.job_title, JOB_TITLE_POINTS)
        + points(fields.hometown, HOMETOWN_POINTS)
        + points(fields.neighborhood, NEIGHBORHOOD_POINTS)
        + points(fields.height, HEIGHT_POINTS)
        + photos as u32 * POINTS_PER_PHOTO
        + prompts as u32 * POINTS_PER_PROMPT
        + points(fields.interests, INTEREST_POINTS);

    CompletenessScore {
        score: total.min(100) as u8,
        fields,
    }
}

pub fn score_profile(profile: &Profile, counts: ProfileAssetCounts) -> ProfileCompleteness {
    ProfileCompleteness {
        profile_id: profile.id,
        gender: profile.gender(),
        completeness: score(&CompletenessInput::from_profile(profile, counts)),
    }
}

/// Percentage of considered profiles with each item present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FieldCompletionRates {
    pub bio: f64,
    pub school: f64,
    pub job_title: f64,
    pub hometown: f64,
    pub neighborhood: f64,
    pub height: f64,
    pub photos: f64,
    pub prompts: f64,
    pub interests: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    #[serde(rename = "0-24")]
    pub below_25: i64,
    #[serde(rename = "25-49")]
    pub from_25: i64,
    #[serde(rename = "50-74")]
    pub from_50: i64,
    #[serde(rename = "75-99")]
    pub from_75: i64,
    #[serde(rename = "100")]
    pub complete: i64,
}

impl ScoreDistribution {
    fn add(&mut self, score: u8) {
        match score {
            0..=24 => self.below_25 += 1,
            25..=49 => self.from_25 += 1,
            50..=74 => self.from_50 += 1,
            75..=99 => self.from_75 += 1,
            _ => self.complete += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletenessSummary {
    pub total_profiles: i64,
    #[serde(serialize_with = "zero_if_none")]
    pub avg_score: Option<f64>,
    pub avg_score_by_gender: GenderAverages,
    pub field_completion_rates: FieldCompletionRates,
    pub distribution: ScoreDistribution,
}

/// Aggregate scores over a population. Profiles missing from `counts` are
/// scored as having no photos, prompts or interests.
pub fn summarize(profiles: &[Profile], counts: &HashMap<Uuid, ProfileAssetCounts>) -> CompletenessSummary {
    let scored: Vec<ProfileCompleteness> = profiles
        .iter()
        .map(|p| score_profile(p, counts.get(&p.id).copied().unwrap_or_default()))
        .collect();
    summarize_scores(&scored)
}

pub fn summarize_scores(scored: &[ProfileCompleteness]) -> CompletenessSummary {
    let total = scored.len() as i64;
    let as_f64 = |s: &ProfileCompleteness| f64::from(s.completeness.score);

    let mut by_gender = GenderAverages::default();
    for gender in ALL_GENDERS {
        by_gender.set(
            gender,
            mean(scored.iter().filter(|s| s.gender == gender).map(as_f64)),
        );
    }

    let rate = |flag: fn(&FieldFlags) -> bool| {
        let hits = scored.iter().filter(|s| flag(&s.completeness.fields)).count() as i64;
        pct(hits, total)
    };

    let field_completion_rates = FieldCompletionRates {
        bio: rate(|f| f.bio),
        school: rate(|f| f.school),
        job_title: rate(|f| f.job_title),
        hometown: rate(|f| f.hometown),
        neighborhood: rate(|f| f.neighborhood),
        height: rate(|f| f.height),
        photos: rate(|f| f.photos),
        prompts: rate(|f| f.prompts),
        interests: rate(|f| f.interests),
    };

    let mut distribution = ScoreDistribution::default();
    for s in scored {
        distribution.add(s.completeness.score);
    }

    CompletenessSummary {
        total_profiles: total,
        avg_score: mean(scored.iter().map(as_f64)),
        avg_score_by_gender: by_gender,
        field_completion_rates,
        distribution,
    }
}
