use geom::LonLat;

use crate::noise::value_noise;
use crate::records::AreaIndex;
use crate::{Config, ForceField, PresencePoint};

/// Computes one frame. Every moving point wanders around its origin by smooth noise plus the
/// force at its origin. A candidate that leaves the owning area reverts to the origin for this
/// frame, so no point is ever returned outside its polygon. The input isn't modified.
pub fn step(
    points: &[PresencePoint],
    field: &ForceField,
    areas: &AreaIndex,
    time: f64,
    config: &Config,
) -> Vec<PresencePoint> {
    let amplitude = config.noise_amplitude_degrees;
    let mut num_reverted = 0;
    let result = points
        .iter()
        .map(|p| {
            if p.is_static {
                return p.clone();
            }
            let dx = (value_noise(p.noise_seed_x, time) - 0.5) * 2.0 * amplitude;
            let dy = (value_noise(p.noise_seed_y, time) - 0.5) * 2.0 * amplitude;
            let (fx, fy) = field.force_at(p.origin);
            let candidate = LonLat::new(p.origin.longitude + dx + fx, p.origin.latitude + dy + fy);

            let inside = areas
                .get(&p.area)
                .map(|ring| ring.contains_pt(candidate))
                .unwrap_or(false);
            let mut moved = p.clone();
            if inside {
                moved.pt = candidate;
            } else {
                moved.pt = p.origin;
                num_reverted += 1;
            }
            moved
        })
        .collect();
    if num_reverted > 0 {
        trace!("{} points reverted to their origin at t={}", num_reverted, time);
    }
    result
}

/// Paces animation frames against a wall clock. If the caller falls behind, the missed frames
/// collapse into a single one.
pub struct Ticker {
    interval: f64,
    last: Option<f64>,
}

impl Ticker {
    pub fn new(frames_per_second: f64) -> Ticker {
        Ticker {
            interval: 1.0 / frames_per_second,
            last: None,
        }
    }

    /// Is a frame due at `now`, in seconds? If so, it's counted as produced.
    pub fn due(&mut self, now: f64) -> bool {
        match self.last {
            // Frames scheduled exactly one interval apart shouldn't lose to rounding
            Some(last) if now - last < self.interval - 1e-9 => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
