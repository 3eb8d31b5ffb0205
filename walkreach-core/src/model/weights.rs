//! Accessibility weight table

use hashbrown::HashMap;

use crate::Error;

/// Weight pair of one subgroup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubgroupWeight {
    pub group_weight: f64,
    pub subgroup_weight: f64,
}

impl SubgroupWeight {
    /// `group_weight × subgroup_weight`
    pub fn factor(&self) -> f64 {
        self.group_weight * self.subgroup_weight
    }
}

/// Mapping from subgroup to its weights, constant for a scoring run.
///
/// Keeps the table order, which is also the PCA feature order.
#[derive(Debug, Clone, Default)]
pub struct AccessibilityWeights {
    entries: Vec<(String, SubgroupWeight)>,
    positions: HashMap<String, usize>,
}

impl AccessibilityWeights {
    /// Builds the table. A repeated subgroup keeps its first position and
    /// takes the later weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is not a positive finite number
    pub fn new<I, S>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (subgroup, group_weight, subgroup_weight) in entries {
            let subgroup = subgroup.into();
            for (name, value) in [("group", group_weight), ("subgroup", subgroup_weight)] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(Error::InvalidData(format!(
                        "{name} weight of '{subgroup}' must be positive, got {value}"
                    )));
                }
            }

            let weight = SubgroupWeight {
                group_weight,
                subgroup_weight,
            };
            match table.positions.get(&subgroup) {
                Some(&position) => table.entries[position].1 = weight,
                None => {
                    table.positions.insert(subgroup.clone(), table.entries.len());
                    table.entries.push((subgroup, weight));
                }
            }
        }
        Ok(table)
    }

    pub fn get(&self, subgroup: &str) -> Option<&SubgroupWeight> {
        self.positions.get(subgroup).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SubgroupWeight)> {
        self.entries.iter().map(|(name, weight)| (name.as_str(), weight))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
