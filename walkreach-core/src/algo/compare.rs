//! Side-by-side comparison of isochron and absolute POI reach

use itertools::{EitherOrBoth, Itertools};

use super::reach::PoiReach;
use crate::model::LocationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachTotals {
    pub buildings: usize,
    pub apartments: u64,
}

impl From<&PoiReach> for ReachTotals {
    fn from(row: &PoiReach) -> Self {
        Self {
            buildings: row.buildings_within_reach,
            apartments: row.apartments_within_reach,
        }
    }
}

/// One POI as seen by both strategies. `None` means the POI served no
/// building under that strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReachComparison {
    pub id: LocationId,
    pub subgroup: String,
    pub absolute: Option<ReachTotals>,
    pub isochron: Option<ReachTotals>,
}

impl ReachComparison {
    pub fn is_different(&self) -> bool {
        self.absolute != self.isochron
    }

    /// Isochron building count minus the exact one
    pub fn building_delta(&self) -> i64 {
        let count = |totals: Option<ReachTotals>| totals.map_or(0, |t| t.buildings as i64);
        count(self.isochron) - count(self.absolute)
    }
}

/// Joins two per-POI reach tables on POI id, ordered by id
pub fn compare_poi_reach(absolute: &[PoiReach], isochron: &[PoiReach]) -> Vec<ReachComparison> {
    let absolute = absolute.iter().sorted_by_key(|row| row.id);
    let isochron = isochron.iter().sorted_by_key(|row| row.id);

    absolute
        .merge_join_by(isochron, |a, b| a.id.cmp(&b.id))
        .map(|pair| {
            let (row, absolute, isochron) = match pair {
                EitherOrBoth::Both(a, i) => (a, Some(ReachTotals::from(a)), Some(i.into())),
                EitherOrBoth::Left(a) => (a, Some(ReachTotals::from(a)), None),
                EitherOrBoth::Right(i) => (i, None, Some(ReachTotals::from(i))),
            };
            ReachComparison {
                id: row.id,
                subgroup: row.subgroup.clone(),
                absolute,
                isochron,
            }
        })
        .collect()
}
