use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Every tuning knob of the pipeline. Missing fields in a JSON file take their default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many of the most similar telemetry points contribute to a spot's crowdedness
    pub knn_k: usize,
    /// Added to the distance in the inference weight, so a spot sitting exactly on a telemetry
    /// point doesn't divide by zero
    pub distance_epsilon_km: f64,

    /// Spacing of the force field grid
    pub field_resolution_meters: f64,
    /// Attractors further than this from a grid point don't pull on it
    pub attraction_radius_km: f64,
    /// Attractors closer than this to a grid point don't pull on it either
    pub min_attraction_distance_km: f64,
    pub strength_multiplier: f64,
    /// The force falls off with distance^decay
    pub decay: f64,

    /// Anchored points land uniformly within this radius of their attractor
    pub jitter_meters: f64,
    /// This share of an area's average presence is placed around attractors
    pub anchored_fraction: f64,
    /// This share of an area's average presence is scattered uniformly over the area
    pub random_fraction: f64,
    /// Rejection sampling gives up after this many attempts per requested point
    pub rejection_attempts_factor: usize,
    /// Noise seeds are drawn uniformly from [0, noise_seed_range)
    pub noise_seed_range: f64,
    /// The probability that a synthesized point never moves
    pub static_fraction: f64,
    /// If nonempty, every point gets a random color from here
    pub palette: Vec<String>,
    /// Applied after synthesis to the total over all areas
    pub max_presence_points: Option<usize>,

    /// How far points wander from their origin, independently per axis, in degrees
    pub noise_amplitude_degrees: f64,
    /// Noise time units elapsed per second of wall-clock time
    pub noise_time_scale: f64,
    pub frames_per_second: f64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            knn_k: 5,
            distance_epsilon_km: 0.01,

            field_resolution_meters: 100.0,
            attraction_radius_km: 2.0,
            min_attraction_distance_km: 0.0001,
            strength_multiplier: 20.0,
            decay: 1.0,

            jitter_meters: 10.0,
            anchored_fraction: 0.3,
            random_fraction: 0.1,
            rejection_attempts_factor: 10,
            noise_seed_range: 10_000.0,
            static_fraction: 0.0,
            palette: Vec::new(),
            max_presence_points: Some(50_000),

            noise_amplitude_degrees: 3e-4,
            noise_time_scale: 0.05,
            frames_per_second: 5.0,
        }
    }
}

impl Config {
    /// Reads and validates a config from a JSON file.
    pub fn load(path: &str) -> Result<Config> {
        let config: Config = abstutil::read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.knn_k == 0 {
            bail!("knn_k must be at least 1");
        }
        for (name, value) in [
            ("distance_epsilon_km", self.distance_epsilon_km),
            ("field_resolution_meters", self.field_resolution_meters),
            ("attraction_radius_km", self.attraction_radius_km),
            ("noise_seed_range", self.noise_seed_range),
            ("frames_per_second", self.frames_per_second),
        ] {
            if !(value.is_finite() && value > 0.0) {
                bail!("{} must be positive, not {}", name, value);
            }
        }
        for (name, value) in [
            ("min_attraction_distance_km", self.min_attraction_distance_km),
            ("strength_multiplier", self.strength_multiplier),
            ("decay", self.decay),
            ("jitter_meters", self.jitter_meters),
            ("anchored_fraction", self.anchored_fraction),
            ("random_fraction", self.random_fraction),
            ("noise_amplitude_degrees", self.noise_amplitude_degrees),
            ("noise_time_scale", self.noise_time_scale),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                bail!("{} must be non-negative, not {}", name, value);
            }
        }
        if !(0.0..=1.0).contains(&self.static_fraction) {
            bail!(
                "static_fraction must be a probability, not {}",
                self.static_fraction
            );
        }
        if self.min_attraction_distance_km >= self.attraction_radius_km {
            bail!(
                "min_attraction_distance_km {} must be less than attraction_radius_km {}",
                self.min_attraction_distance_km,
                self.attraction_radius_km
            );
        }
        Ok(())
    }
}
