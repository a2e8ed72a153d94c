use std::f64::consts::PI;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use geom::{LonLat, Ring};

use crate::{Area, AreaID, Attractor, Config, HourOfWeek};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PresencePointID(pub usize);

/// One synthetic person. Only the animator changes `pt`, and only ever to somewhere inside the
/// owning area or back to `origin`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresencePoint {
    pub id: PresencePointID,
    pub pt: LonLat,
    pub origin: LonLat,
    pub area: AreaID,
    /// The attractor this point was placed around, if any
    pub attractor: Option<String>,
    pub anchored: bool,
    /// Static points never move
    pub is_static: bool,
    pub noise_seed_x: f64,
    pub noise_seed_y: f64,
    pub color: Option<String>,
}

/// Scatters presence points inside every area with a positive average presence at this hour.
/// `anchored_fraction` of the presence is split among the active attractors inside the area,
/// proportional to strength, and jittered around them. Independently, `random_fraction` of the
/// presence is sampled uniformly inside the polygon. Output order is not meaningful.
pub fn synthesize(
    areas: &[Area],
    attractors: &[Attractor],
    hour: HourOfWeek,
    config: &Config,
    rng: &mut XorShiftRng,
) -> Vec<PresencePoint> {
    let active: Vec<&Attractor> = attractors.iter().filter(|a| a.is_active()).collect();
    let mut points = Vec::new();
    let mut num_malformed = 0;
    let mut num_short = 0;
    for area in areas {
        let presence = match area.average_presence(hour) {
            Some(x) if x > 0.0 => x,
            _ => continue,
        };
        let ring = match area.polygon() {
            Ok(ring) => ring,
            Err(err) => {
                debug!("Not placing anybody in {}: {}", area.id, err);
                num_malformed += 1;
                continue;
            }
        };
        let mut placer = Placer {
            area: &area.id,
            ring: &ring,
            config,
            rng: &mut *rng,
            points: &mut points,
        };

        let inside: Vec<&Attractor> = active
            .iter()
            .filter(|a| ring.contains_pt(a.pt))
            .cloned()
            .collect();
        let total: f64 = inside.iter().map(|a| a.strength).sum();
        for attractor in &inside {
            let n = if total > 0.0 {
                ((attractor.strength / total) * presence * config.anchored_fraction).round()
            } else {
                (presence / (inside.len() as f64) * config.anchored_fraction).floor()
            } as usize;
            for _ in 0..n {
                placer.near_attractor(attractor);
            }
        }

        let num_random = (presence * config.random_fraction).round() as usize;
        if placer.scatter(num_random) < num_random {
            num_short += 1;
        }
    }

    if num_malformed > 0 {
        warn!(
            "{} areas have malformed polygons; nobody placed there",
            abstutil::prettyprint_usize(num_malformed)
        );
    }
    if num_short > 0 {
        warn!(
            "{} areas ran out of attempts scattering random points",
            abstutil::prettyprint_usize(num_short)
        );
    }
    info!(
        "Synthesized {} presence points for {}",
        abstutil::prettyprint_usize(points.len()),
        hour
    );
    points
}

struct Placer<'a> {
    area: &'a AreaID,
    ring: &'a Ring,
    config: &'a Config,
    rng: &'a mut XorShiftRng,
    points: &'a mut Vec<PresencePoint>,
}

impl<'a> Placer<'a> {
    fn near_attractor(&mut self, attractor: &Attractor) {
        let angle = self.rng.gen_range(0.0..(2.0 * PI));
        let radius = self.rng.gen::<f64>() * self.config.jitter_meters;
        let mut pt = attractor
            .pt
            .offset_meters(angle.cos() * radius, angle.sin() * radius);
        // Attractors right at the edge could jitter out. The attractor itself is inside.
        if !self.ring.contains_pt(pt) {
            pt = attractor.pt;
        }
        self.add(pt, Some(attractor.id.clone()), true);
    }

    // Rejection sampling over the bounding box. Returns how many points were placed.
    fn scatter(&mut self, num_points: usize) -> usize {
        let bounds = *self.ring.get_bounds();
        let max_attempts = num_points * self.config.rejection_attempts_factor;
        let mut placed = 0;
        let mut attempts = 0;
        while placed < num_points && attempts < max_attempts {
            attempts += 1;
            let pt = LonLat::new(
                bounds.min_lon + self.rng.gen::<f64>() * bounds.width(),
                bounds.min_lat + self.rng.gen::<f64>() * bounds.height(),
            );
            if self.ring.contains_pt(pt) {
                self.add(pt, None, false);
                placed += 1;
            }
        }
        placed
    }

    fn add(&mut self, pt: LonLat, attractor: Option<String>, anchored: bool) {
        let noise_seed_x = self.rng.gen_range(0.0..self.config.noise_seed_range);
        let noise_seed_y = self.rng.gen_range(0.0..self.config.noise_seed_range);
        let is_static =
            self.config.static_fraction > 0.0 && self.rng.gen_bool(self.config.static_fraction);
        let color = self.config.palette.choose(&mut *self.rng).cloned();
        self.points.push(PresencePoint {
            id: PresencePointID(self.points.len()),
            pt,
            origin: pt,
            area: self.area.clone(),
            attractor,
            anchored,
            is_static,
            noise_seed_x,
            noise_seed_y,
            color,
        });
    }
}
