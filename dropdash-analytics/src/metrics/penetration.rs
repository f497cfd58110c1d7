//! Waitlist penetration per city and the world-domination roll-up.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::metrics::numeric::{finite_or_zero, precise_opt};
use crate::models::WaitlistCity;

pub const DOMINATING_AT: f64 = 1.0;
pub const STRONG_AT: f64 = 0.5;
pub const GROWING_AT: f64 = 0.1;
pub const EARLY_AT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DominationStatus {
    Dominating,
    Strong,
    Growing,
    Early,
    Starting,
    Unknown,
}

impl DominationStatus {
    pub fn from_rate(rate: Option<f64>) -> Self {
        match rate {
            None => DominationStatus::Unknown,
            Some(r) if r >= DOMINATING_AT => DominationStatus::Dominating,
            Some(r) if r >= STRONG_AT => DominationStatus::Strong,
            Some(r) if r >= GROWING_AT => DominationStatus::Growing,
            Some(r) if r >= EARLY_AT => DominationStatus::Early,
            Some(_) => DominationStatus::Starting,
        }
    }
}

/// Waitlisted share of the population, in percent. `None` when the
/// population is unknown or not positive.
pub fn penetration_rate(waitlist_count: i64, population: Option<i64>) -> Option<f64> {
    let population = population.filter(|p| *p > 0)?;
    Some(finite_or_zero(waitlist_count as f64 * 100.0 / population as f64))
}

#[derive(Debug, Clone, Serialize)]
pub struct CityPenetration {
    pub city_id: Uuid,
    pub name: String,
    pub country: Option<String>,
    pub population: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub waitlist_count: i64,
    #[serde(serialize_with = "precise_opt")]
    pub penetration_rate: Option<f64>,
    pub status: DominationStatus,
}

impl CityPenetration {
    pub fn new(city: &WaitlistCity, waitlist_count: i64) -> Self {
        let rate = penetration_rate(waitlist_count, city.population);
        Self {
            city_id: city.id,
            name: city.name.clone(),
            country: city.country.clone(),
            population: city.population,
            latitude: city.latitude,
            longitude: city.longitude,
            waitlist_count,
            penetration_rate: rate,
            status: DominationStatus::from_rate(rate),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub dominating: i64,
    pub strong: i64,
    pub growing: i64,
    pub early: i64,
    pub starting: i64,
    pub unknown: i64,
}

impl StatusCounts {
    fn add(&mut self, status: DominationStatus) {
        let slot = match status {
            DominationStatus::Dominating => &mut self.dominating,
            DominationStatus::Strong => &mut self.strong,
            DominationStatus::Growing => &mut self.growing,
            DominationStatus::Early => &mut self.early,
            DominationStatus::Starting => &mut self.starting,
            DominationStatus::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldDominationSummary {
    pub total_cities: i64,
    pub total_waitlist: i64,
    pub cities_with_population: i64,
    #[serde(serialize_with = "precise_opt")]
    pub overall_penetration_rate: Option<f64>,
    pub status_counts: StatusCounts,
    pub top_cities: Vec<CityPenetration>,
}

/// Highest rate first; cities without a rate go last, larger waitlists first.
fn by_rate_desc(a: &CityPenetration, b: &CityPenetration) -> Ordering {
    let by_rate = match (a.penetration_rate, b.penetration_rate) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rate
        .then_with(|| b.waitlist_count.cmp(&a.waitlist_count))
        .then_with(|| a.name.cmp(&b.name))
}

pub fn rank_cities(cities: &[WaitlistCity], waitlist: &HashMap<Uuid, i64>) -> Vec<CityPenetration> {
    let mut ranked: Vec<CityPenetration> = cities
        .iter()
        .map(|c| CityPenetration::new(c, waitlist.get(&c.id).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(by_rate_desc);
    ranked
}

pub fn summarize(cities: &[WaitlistCity], waitlist: &HashMap<Uuid, i64>, top: usize) -> WorldDominationSummary {
    let ranked = rank_cities(cities, waitlist);

    let mut status_counts = StatusCounts::default();
    let mut total_waitlist = 0;
    let mut known_waitlist = 0;
    let mut known_population = 0i64;
    let mut cities_with_population = 0;
    for city in &ranked {
        status_counts.add(city.status);
        total_waitlist += city.waitlist_count;
        if let Some(pop) = city.population.filter(|p| *p > 0) {
            cities_with_population += 1;
            known_population = known_population.saturating_add(pop);
            known_waitlist += city.waitlist_count;
        }
    }

    let summary = WorldDominationSummary {
        total_cities: ranked.len() as i64,
        total_waitlist,
        cities_with_population,
        overall_penetration_rate: penetration_rate(known_waitlist, Some(known_population)),
        status_counts,
        top_cities: ranked.into_iter().take(top).collect(),
    };

    tracing::debug!(
        cities = summary.total_cities,
        waitlist = summary.total_waitlist,
        overall = ?summary.overall_penetration_rate,
        "world domination computed"
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn city(name: &str, population: Option<i64>) -> WaitlistCity {
        WaitlistCity {
            id: Uuid::new_v4(),
            name: name.into(),
            country: Some("US".into()),
            population,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reference_city_penetration() {
        assert_eq!(penetration_rate(500, Some(500_000)), Some(0.1));
        assert_eq!(DominationStatus::from_rate(Some(0.1)), DominationStatus::Growing);

        assert_eq!(penetration_rate(500, None), None);
        assert_eq!(DominationStatus::from_rate(None), DominationStatus::Unknown);
    }

    #[test]
    fn non_positive_population_is_unknown() {
        assert_eq!(penetration_rate(10, Some(0)), None);
        assert_eq!(penetration_rate(10, Some(-5)), None);
    }

    #[test]
    fn status_bands() {
        let status = |r| DominationStatus::from_rate(Some(r));
        assert_eq!(status(2.5), DominationStatus::Dominating);
        assert_eq!(status(1.0), DominationStatus::Dominating);
        assert_eq!(status(0.5), DominationStatus::Strong);
        assert_eq!(status(0.099), DominationStatus::Early);
        assert_eq!(status(0.01), DominationStatus::Early);
        assert_eq!(status(0.001), DominationStatus::Starting);
        assert_eq!(status(0.0), DominationStatus::Starting);
    }

    #[test]
    fn serialized_city_keeps_null_rate() {
        let c = city("Atlantis", None);
        let json = serde_json::to_value(CityPenetration::new(&c, 42)).unwrap();
        assert!(json["penetration_rate"].is_null());
        assert_eq!(json["status"], "unknown");
        assert_eq!(json["waitlist_count"], 42);
    }

    #[test]
    fn small_rates_survive_serialization() {
        let c = city("Houston", Some(1_000_000));

        let json = serde_json::to_value(CityPenetration::new(&c, 80)).unwrap();
        assert_eq!(json["penetration_rate"], 0.008);
        assert!(json["penetration_rate"].as_f64().unwrap() < EARLY_AT);
        assert_eq!(json["status"], "starting");

        let json = serde_json::to_value(CityPenetration::new(&c, 40)).unwrap();
        assert_eq!(json["penetration_rate"], 0.004);

        let json = serde_json::to_value(CityPenetration::new(&c, 100)).unwrap();
        assert_eq!(json["penetration_rate"], 0.01);
        assert_eq!(json["status"], "early");
    }

    #[test]
    fn summary_orders_by_rate_with_unknown_last() {
        let austin = city("Austin", Some(1_000_000));
        let boise = city("Boise", Some(200_000));
        let nowhere = city("Nowhere", None);
        let cities = vec![nowhere.clone(), austin.clone(), boise.clone()];
        let waitlist = HashMap::from([(austin.id, 1_000), (boise.id, 1_000), (nowhere.id, 5_000)]);

        let s = summarize(&cities, &waitlist, 10);
        assert_eq!(s.total_cities, 3);
        assert_eq!(s.total_waitlist, 7_000);
        assert_eq!(s.cities_with_population, 2);
        // 2,000 / 1,200,000
        assert_eq!(s.overall_penetration_rate.map(|r| (r * 1000.0).round() / 1000.0), Some(0.167));
        let names: Vec<&str> = s.top_cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Boise", "Austin", "Nowhere"]);
        assert_eq!(s.status_counts.strong, 1);
        assert_eq!(s.status_counts.growing, 1);
        assert_eq!(s.status_counts.unknown, 1);

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["overall_penetration_rate"], 0.1667);
    }

    #[test]
    fn summary_without_population_has_null_overall() {
        let cities = vec![city("A", None), city("B", None)];
        let s = summarize(&cities, &HashMap::new(), 1);
        assert_eq!(s.overall_penetration_rate, None);
        assert_eq!(s.top_cities.len(), 1);
        assert_eq!(s.total_waitlist, 0);
        assert_eq!(s.status_counts.unknown, 2);
    }
}
