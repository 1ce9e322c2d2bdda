//! Read-only reference data shared by every computation in a process.

use std::collections::BTreeSet;

use anyhow::Result;

use crate::config::RaterConfig;
use crate::structure::{self, StructureRow};
use crate::topology::Topology;

/// Station topology, optional administrative structure and the direction
/// allow-list. Built once, then only borrowed.
#[derive(Debug, Clone, Default)]
pub struct ReferenceContext {
    topology: Topology,
    structure: Option<Vec<StructureRow>>,
    directions: BTreeSet<i64>,
}

impl ReferenceContext {
    pub fn new(topology: Topology, directions: impl IntoIterator<Item = i64>) -> Self {
        Self {
            topology,
            structure: None,
            directions: directions.into_iter().collect(),
        }
    }

    pub fn with_structure(mut self, rows: Vec<StructureRow>) -> Self {
        self.structure = Some(rows);
        self
    }

    /// Loads the reference sources named by `config`. A station or structure
    /// source that cannot be loaded halts the computation.
    pub fn load(config: &RaterConfig) -> Result<Self> {
        let topology = Topology::load(&config.stations)?;
        let context = Self::new(topology, config.directions.iter().copied());
        match &config.structure {
            Some(source) => Ok(context.with_structure(structure::load(source)?)),
            None => Ok(context),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn structure(&self) -> Option<&[StructureRow]> {
        self.structure.as_deref()
    }

    pub fn is_allowed(&self, direction_id: i64) -> bool {
        self.directions.contains(&direction_id)
    }

    /// Topology directions that are on the allow-list, ascending.
    pub fn directions(&self) -> impl Iterator<Item = i64> + '_ {
        self.topology.directions().filter(|d| self.is_allowed(*d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Station;

    fn station(direction_id: i64, position: f64, name: &str) -> Station {
        Station {
            direction_id,
            position,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_directions_filtered_by_allow_list() {
        let topology = Topology::from_stations(vec![
            station(24602, 1.0, "А"),
            station(11111, 1.0, "Б"),
            station(24701, 1.0, "В"),
        ]);
        let context = ReferenceContext::new(topology, [24602, 24701, 24603]);
        assert_eq!(context.directions().collect::<Vec<_>>(), vec![24602, 24701]);
        assert!(!context.is_allowed(11111));
    }

    #[test]
    fn test_structure_optional() {
        let context = ReferenceContext::new(Topology::default(), [1]);
        assert!(context.structure().is_none());
        let context = context.with_structure(vec![]);
        assert_eq!(context.structure().map(<[_]>::len), Some(0));
    }

    #[test]
    fn test_load_missing_stations_fails() {
        let config = RaterConfig {
            stations: "/nonexistent/track_rater/stations.csv".into(),
            ..Default::default()
        };
        assert!(ReferenceContext::load(&config).is_err());
    }
}
