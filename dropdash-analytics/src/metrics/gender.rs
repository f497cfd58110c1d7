use serde::Serialize;

use crate::metrics::numeric::zero_if_none;
use crate::models::Gender;

/// Counts keyed by the dashboard's gender labels. Unknown genders land in
/// `other` so totals always add up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderCounts {
    pub women: i64,
    pub men: i64,
    pub nonbinary: i64,
    pub other: i64,
}

impl GenderCounts {
    pub fn add(&mut self, gender: Gender) {
        *self.slot(gender) += 1;
    }

    pub fn total(&self) -> i64 {
        self.women + self.men + self.nonbinary + self.other
    }

    fn slot(&mut self, gender: Gender) -> &mut i64 {
        match gender {
            Gender::Woman => &mut self.women,
            Gender::Man => &mut self.men,
            Gender::NonBinary => &mut self.nonbinary,
            Gender::Other => &mut self.other,
        }
    }
}

impl FromIterator<Gender> for GenderCounts {
    fn from_iter<I: IntoIterator<Item = Gender>>(iter: I) -> Self {
        let mut counts = GenderCounts::default();
        for g in iter {
            counts.add(g);
        }
        counts
    }
}

/// Per-gender averages; an empty bucket serializes as `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenderAverages {
    #[serde(serialize_with = "zero_if_none")]
    pub women: Option<f64>,
    #[serde(serialize_with = "zero_if_none")]
    pub men: Option<f64>,
    #[serde(serialize_with = "zero_if_none")]
    pub nonbinary: Option<f64>,
    #[serde(serialize_with = "zero_if_none")]
    pub other: Option<f64>,
}

impl GenderAverages {
    pub fn get(&self, gender: Gender) -> Option<f64> {
        match gender {
            Gender::Woman => self.women,
            Gender::Man => self.men,
            Gender::NonBinary => self.nonbinary,
            Gender::Other => self.other,
        }
    }

    pub(crate) fn set(&mut self, gender: Gender, value: Option<f64>) {
        match gender {
            Gender::Woman => self.women = value,
            Gender::Man => self.men = value,
            Gender::NonBinary => self.nonbinary = value,
            Gender::Other => self.other = value,
        }
    }
}

pub const ALL_GENDERS: [Gender; 4] = [Gender::Woman, Gender::Man, Gender::NonBinary, Gender::Other];
