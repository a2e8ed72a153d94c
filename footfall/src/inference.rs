use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use geom::LonLat;

use crate::{jaccard, CancelFlag, CandidateSpot, Config, HourOfWeek, TagSet, TelemetryRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttractorSource {
    /// Measured directly by telemetry
    Observed,
    /// Borrowed from similar telemetry nearby
    Inferred,
}

/// A location pulling people towards it at one specific hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attractor {
    pub id: String,
    pub pt: LonLat,
    pub tags: TagSet,
    /// Crowdedness at the selected hour; never negative
    pub strength: f64,
    pub source: AttractorSource,
}

impl Attractor {
    /// Zero-strength or misplaced attractors don't pull on anything.
    pub fn is_active(&self) -> bool {
        self.strength > 0.0 && self.strength.is_finite() && self.pt.is_valid()
    }
}

/// Every telemetry record with valid coordinates, with its measured strength at this hour.
pub fn observed_attractors(telemetry: &[TelemetryRecord], hour: HourOfWeek) -> Vec<Attractor> {
    telemetry
        .iter()
        .filter(|t| t.pt().is_valid())
        .map(|t| Attractor {
            id: t.id.clone(),
            pt: t.pt(),
            tags: t.tags.clone(),
            strength: t.strength(hour),
            source: AttractorSource::Observed,
        })
        .collect()
}

/// Gives every tagged spot with valid coordinates a synthetic crowdedness for this hour: the
/// weighted mean over the K telemetry points with the highest `jaccard / (km + epsilon)` weight.
/// Spots sharing no tag with any active telemetry point get 0. The result is in spot order, and
/// the same inputs always produce the same output.
pub fn infer(
    telemetry: &[TelemetryRecord],
    spots: &[CandidateSpot],
    hour: HourOfWeek,
    config: &Config,
) -> Vec<Attractor> {
    infer_cancellable(telemetry, spots, hour, config, &CancelFlag::new()).unwrap_or_default()
}

/// Like `infer`, but gives up and returns None as soon as `cancel` is set.
pub fn infer_cancellable(
    telemetry: &[TelemetryRecord],
    spots: &[CandidateSpot],
    hour: HourOfWeek,
    config: &Config,
    cancel: &CancelFlag,
) -> Option<Vec<Attractor>> {
    // Only telemetry that's actually crowded at this hour can lend its strength.
    let sources: Vec<Source> = telemetry
        .iter()
        .filter(|t| t.pt().is_valid())
        .filter_map(|t| {
            let strength = t.strength(hour);
            if strength > 0.0 && !t.tags.is_empty() {
                Some(Source {
                    pt: t.pt(),
                    tags: &t.tags,
                    strength,
                })
            } else {
                None
            }
        })
        .collect();

    let mut results = Vec::new();
    let mut skipped = 0;
    for spot in spots {
        if cancel.is_cancelled() {
            debug!("Inference for {} cancelled", hour);
            return None;
        }
        if spot.tags.is_empty() || !spot.pt().is_valid() {
            skipped += 1;
            continue;
        }
        results.push(Attractor {
            id: spot.id.clone(),
            pt: spot.pt(),
            tags: spot.tags.clone(),
            strength: knn_strength(spot, &sources, config),
            source: AttractorSource::Inferred,
        });
    }
    if skipped > 0 {
        debug!(
            "{} spots have no tags or bad coordinates, skipped them",
            abstutil::prettyprint_usize(skipped)
        );
    }
    Some(results)
}

struct Source<'a> {
    pt: LonLat,
    tags: &'a TagSet,
    strength: f64,
}

struct Neighbor {
    weight: f64,
    strength: f64,
}

fn knn_strength(spot: &CandidateSpot, sources: &[Source], config: &Config) -> f64 {
    let mut neighbors: Vec<Neighbor> = sources
        .iter()
        .filter_map(|src| {
            let similarity = jaccard(&spot.tags, src.tags);
            if similarity == 0.0 {
                return None;
            }
            let dist_km = spot.pt().gps_dist(src.pt).to_kilometers();
            let weight = similarity / (dist_km + config.distance_epsilon_km);
            if weight > 0.0 && weight.is_finite() {
                Some(Neighbor {
                    weight,
                    strength: src.strength,
                })
            } else {
                None
            }
        })
        .collect();
    // sort_by is stable, so equal weights keep input order
    neighbors.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    neighbors.truncate(config.knn_k);
    weighted_mean(&neighbors)
}

fn weighted_mean(neighbors: &[Neighbor]) -> f64 {
    if neighbors.is_empty() {
        return 0.0;
    }
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for n in neighbors {
        weighted_sum += n.weight * n.strength;
        weight_sum += n.weight;
        min = min.min(n.strength);
        max = max.max(n.strength);
    }
    if weight_sum <= 0.0 {
        return 0.0;
    }
    // Rounding error mustn't push the mean outside its inputs
    (weighted_sum / weight_sum).clamp(min, max)
}
