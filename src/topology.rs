//! Station topology: the static reference table that defines segment
//! boundaries.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::table::{RawTable, TableSource, cell, coerce_integer, coerce_number};

pub const STATION_NAME: &[&str] = &["СТАНЦИЯ"];
pub const STATION_POSITION: &[&str] = &["КООРДИНАТА"];
pub const STATION_DIRECTION: &[&str] = &["НАПРАВЛЕНИЕ", "КОДНАПР"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub direction_id: i64,
    pub position: f64,
    pub name: String,
}

impl Station {
    /// Whole-kilometer part of the position, the value segment ranges use.
    pub fn km(&self) -> i64 {
        self.position.trunc() as i64
    }
}

/// Stations grouped by direction, each group ascending by position.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    directions: BTreeMap<i64, Vec<Station>>,
}

/// Per-direction overview used by `list-stations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionSummary {
    pub direction_id: i64,
    pub stations: usize,
    pub first: String,
    pub last: String,
    pub span_km: f64,
}

impl Topology {
    /// Groups stations by direction and sorts each group by position.
    /// Equal positions keep their input order.
    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Self {
        let mut directions: BTreeMap<i64, Vec<Station>> = BTreeMap::new();
        for station in stations {
            directions.entry(station.direction_id).or_default().push(station);
        }
        for group in directions.values_mut() {
            group.sort_by(|a, b| a.position.total_cmp(&b.position));
        }
        Self { directions }
    }

    /// Builds the topology from a station table. Rows without a numeric
    /// position or direction are dropped.
    pub fn from_table(table: &RawTable) -> Result<Self> {
        let cols = table
            .require(&[
                ("КООРДИНАТА", STATION_POSITION),
                ("НАПРАВЛЕНИЕ", STATION_DIRECTION),
            ])
            .context("station table is missing required columns")?;
        let (pos_col, dir_col) = (cols[0], cols[1]);
        let name_col = table.column(STATION_NAME);

        let mut dropped = 0usize;
        let stations: Vec<Station> = table
            .rows()
            .iter()
            .filter_map(|row| {
                let station = (|| {
                    Some(Station {
                        position: coerce_number(cell(row, pos_col)?)?,
                        direction_id: coerce_integer(cell(row, dir_col)?)?,
                        name: name_col
                            .and_then(|c| cell(row, c))
                            .unwrap_or_default()
                            .to_string(),
                    })
                })();
                if station.is_none() {
                    dropped += 1;
                }
                station
            })
            .collect();

        debug!(kept = stations.len(), dropped, "Station rows parsed");
        Ok(Self::from_stations(stations))
    }

    /// Loads the station reference source. Any failure here is fatal: without
    /// stations there are no segments to compute.
    #[tracing::instrument]
    pub fn load(source: &str) -> Result<Self> {
        let loaded = TableSource::load(source)
            .with_context(|| format!("station reference '{source}' is unavailable"))?;
        let table = loaded
            .primary()
            .with_context(|| format!("station reference '{source}' has no sheets"))?;

        let topology = Self::from_table(table)
            .with_context(|| format!("station reference '{source}' is unusable"))?;
        info!(
            directions = topology.directions.len(),
            stations = topology.station_count(),
            "Station reference loaded"
        );
        Ok(topology)
    }

    pub fn directions(&self) -> impl Iterator<Item = i64> + '_ {
        self.directions.keys().copied()
    }

    /// Stations of one direction, ascending by position.
    pub fn stations(&self, direction_id: i64) -> &[Station] {
        self.directions
            .get(&direction_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn station_count(&self) -> usize {
        self.directions.values().map(Vec::len).sum()
    }

    pub fn summary(&self) -> Vec<DirectionSummary> {
        self.directions
            .iter()
            .filter_map(|(direction_id, stations)| {
                let first = stations.first()?;
                let last = stations.last()?;
                Some(DirectionSummary {
                    direction_id: *direction_id,
                    stations: stations.len(),
                    first: first.name.clone(),
                    last: last.name.clone(),
                    span_km: last.position - first.position,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_groups_and_sorts_by_position() {
        let table = RawTable::new(
            &["СТАНЦИЯ", "КООРДИНАТА", "НАПРАВЛЕНИЕ"],
            vec![
                row(&["В", "30", "24602"]),
                row(&["А", "10", "24602"]),
                row(&["Б", "20.5", "24602"]),
                row(&["Г", "5", "24701"]),
            ],
        );
        let topology = Topology::from_table(&table).unwrap();

        let names: Vec<_> = topology.stations(24602).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["А", "Б", "В"]);
        assert_eq!(topology.stations(24701).len(), 1);
        assert_eq!(topology.directions().collect::<Vec<_>>(), vec![24602, 24701]);
        assert!(topology.stations(99999).is_empty());
    }

    #[test]
    fn test_latin_lookalike_headers_match() {
        // Latin K, O, P, A, T, C, B, E mixed into Cyrillic headers
        let table = RawTable::new(
            &["CTAНЦИЯ", "KOOPДИНATA", "НAПPABЛEНИE"],
            vec![row(&["А", "10", "1"])],
        );
        let topology = Topology::from_table(&table).unwrap();
        assert_eq!(topology.station_count(), 1);
        assert_eq!(topology.stations(1)[0].name, "А");
    }

    #[test]
    fn test_invalid_rows_dropped() {
        let table = RawTable::new(
            &["СТАНЦИЯ", "КООРДИНАТА", "НАПРАВЛЕНИЕ"],
            vec![
                row(&["А", "", "1"]),
                row(&["Б", "abc", "1"]),
                row(&["В", "10", ""]),
                row(&["Г", "10", "x"]),
                row(&["", "12", "1"]),
            ],
        );
        let topology = Topology::from_table(&table).unwrap();
        assert_eq!(topology.station_count(), 1);
        assert_eq!(topology.stations(1)[0].name, "");
    }

    #[test]
    fn test_missing_position_column_is_fatal() {
        let table = RawTable::new(&["СТАНЦИЯ", "НАПРАВЛЕНИЕ"], vec![]);
        let err = Topology::from_table(&table).unwrap_err();
        assert!(format!("{err:#}").contains("КООРДИНАТА"));
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let err = Topology::load("/nonexistent/track_rater/stations.csv").unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_station_km_truncates() {
        let station = Station {
            direction_id: 1,
            position: 20.9,
            name: "Б".into(),
        };
        assert_eq!(station.km(), 20);
    }

    #[test]
    fn test_summary() {
        let topology = Topology::from_stations([(10.0, "А"), (42.0, "В"), (20.0, "Б")].map(
            |(position, name)| Station {
                direction_id: 1,
                position,
                name: name.to_string(),
            },
        ));
        let summary = topology.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].first, "А");
        assert_eq!(summary[0].last, "В");
        assert_eq!(summary[0].stations, 3);
        assert_eq!(summary[0].span_km, 32.0);
    }
}
