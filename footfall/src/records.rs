use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{GPSBounds, LonLat, Ring};

use crate::{HourOfWeek, TagSet};

/// A point with direct crowdedness measurements for every hour of the week.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tags: TagSet,
    /// Indexed by `HourOfWeek`. Missing trailing hours read as 0.
    pub hourly: Vec<f64>,
}

impl TelemetryRecord {
    pub fn pt(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }

    /// The crowdedness at some hour. Missing, non-finite, and negative samples become 0.
    pub fn strength(&self, hour: HourOfWeek) -> f64 {
        match self.hourly.get(hour.idx()) {
            Some(x) if x.is_finite() && *x > 0.0 => *x,
            _ => 0.0,
        }
    }
}

/// A tagged location without telemetry. The name and category are just carried along.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateSpot {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl CandidateSpot {
    pub fn pt(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaID(pub String);

impl fmt::Display for AreaID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Area {}", self.0)
    }
}

/// A polygon with a historical average presence count per hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaID,
    /// [longitude, latitude] pairs, open or closed
    pub ring: Vec<[f64; 2]>,
    /// Indexed by `HourOfWeek`. None if no historical data covers this area.
    #[serde(default)]
    pub average_presence: Option<Vec<f64>>,
}

impl Area {
    /// None if there's no average for this area at all, or for this particular hour.
    pub fn average_presence(&self, hour: HourOfWeek) -> Option<f64> {
        let x = *self.average_presence.as_ref()?.get(hour.idx())?;
        if x.is_finite() {
            Some(x)
        } else {
            None
        }
    }

    /// Validates the polygon.
    pub fn polygon(&self) -> Result<Ring> {
        Ring::from_lon_lat_pairs(&self.ring)
    }
}

/// Valid area polygons, looked up by ID. Malformed areas are left out.
pub struct AreaIndex {
    rings: BTreeMap<AreaID, Ring>,
    num_malformed: usize,
}

impl AreaIndex {
    pub fn new(areas: &[Area]) -> AreaIndex {
        let mut rings = BTreeMap::new();
        let mut num_malformed = 0;
        for area in areas {
            match area.polygon() {
                Ok(ring) => {
                    rings.insert(area.id.clone(), ring);
                }
                Err(err) => {
                    debug!("Skipping {}: {}", area.id, err);
                    num_malformed += 1;
                }
            }
        }
        if num_malformed > 0 {
            warn!(
                "{} of {} areas have malformed polygons and are ignored",
                abstutil::prettyprint_usize(num_malformed),
                abstutil::prettyprint_usize(areas.len())
            );
        }
        AreaIndex {
            rings,
            num_malformed,
        }
    }

    pub fn get(&self, id: &AreaID) -> Option<&Ring> {
        self.rings.get(id)
    }

    pub fn num_malformed(&self) -> usize {
        self.num_malformed
    }

    /// The union of all valid polygons' bounds; empty if there are none.
    pub fn bounds(&self) -> GPSBounds {
        let mut b = GPSBounds::new();
        for ring in self.rings.values() {
            b.union(ring.get_bounds());
        }
        b
    }
}

/// Everything the engine consumes from the ingestion layer, as one JSON document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default)]
    pub telemetry: Vec<TelemetryRecord>,
    #[serde(default)]
    pub spots: Vec<CandidateSpot>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl Inputs {
    pub fn load(path: &str) -> Result<Inputs> {
        let inputs: Inputs = abstutil::read_json(path)?;
        info!(
            "Loaded {} telemetry records, {} candidate spots, and {} areas from {}",
            abstutil::prettyprint_usize(inputs.telemetry.len()),
            abstutil::prettyprint_usize(inputs.spots.len()),
            abstutil::prettyprint_usize(inputs.areas.len()),
            path
        );
        Ok(inputs)
    }
}
