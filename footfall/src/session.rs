use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use abstutil::Timer;

use crate::field::build_field_cancellable;
use crate::inference::infer_cancellable;
use crate::records::AreaIndex;
use crate::{
    animate, synthesize, Attractor, Config, FieldCache, FieldKey, ForceField, HourOfWeek, Inputs,
    PresencePoint,
};

/// Shared between a long-running computation and whoever might want to abandon it.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> CancelFlag {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A request to switch to some hour. Superseded by the next `begin_hour`.
#[derive(Clone, Debug)]
pub struct HourJob {
    pub generation: usize,
    pub hour: HourOfWeek,
    cancel: CancelFlag,
}

impl HourJob {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// The expensive part of switching hours, not yet visible to anybody.
pub struct HourOutputs {
    pub generation: usize,
    pub hour: HourOfWeek,
    pub attractors: Vec<Attractor>,
    /// None when the cached field still matches
    pub field: Option<(FieldKey, ForceField)>,
}

/// Owns the inputs and everything derived from them for the currently selected hour. Changing
/// the hour is split into `begin_hour`, `compute` and `install`, so a caller can abandon work
/// that a newer selection made pointless. Each install fully replaces the point set.
pub struct Session {
    inputs: Inputs,
    config: Config,
    areas: AreaIndex,
    rng: XorShiftRng,

    generation: usize,
    pending: Option<CancelFlag>,
    field_cache: FieldCache,

    hour: Option<HourOfWeek>,
    attractors: Vec<Attractor>,
    points: Vec<PresencePoint>,
}

impl Session {
    pub fn new(inputs: Inputs, config: Config, rng_seed: u64) -> Session {
        let areas = AreaIndex::new(&inputs.areas);
        Session {
            inputs,
            config,
            areas,
            rng: XorShiftRng::seed_from_u64(rng_seed),

            generation: 0,
            pending: None,
            field_cache: FieldCache::new(),

            hour: None,
            attractors: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Cancels whatever was in progress and starts a new generation.
    pub fn begin_hour(&mut self, hour: HourOfWeek) -> HourJob {
        if let Some(cancel) = self.pending.take() {
            cancel.cancel();
        }
        self.generation += 1;
        let cancel = CancelFlag::new();
        self.pending = Some(cancel.clone());
        HourJob {
            generation: self.generation,
            hour,
            cancel,
        }
    }

    /// Infers attractors and, unless the cached one still applies, builds the force field. None
    /// if the job was cancelled partway.
    pub fn compute(&self, job: &HourJob) -> Option<HourOutputs> {
        let mut timer = Timer::new(format!("compute {}", job.hour));

        timer.start("infer attractors");
        let attractors = infer_cancellable(
            &self.inputs.telemetry,
            &self.inputs.spots,
            job.hour,
            &self.config,
            &job.cancel,
        )?;
        timer.stop("infer attractors");

        let key = FieldKey {
            bounds: self.areas.bounds(),
            hour: job.hour,
            resolution_meters: self.config.field_resolution_meters,
        };
        let field = if self.field_cache.is_stale(&key) {
            timer.start("build force field");
            let field = build_field_cancellable(
                &attractors,
                &key.bounds,
                key.resolution_meters,
                &self.config,
                &job.cancel,
            )?;
            timer.stop("build force field");
            Some((key, field))
        } else {
            None
        };

        if job.is_cancelled() {
            return None;
        }
        Some(HourOutputs {
            generation: job.generation,
            hour: job.hour,
            attractors,
            field,
        })
    }

    /// Makes the outputs current, unless a newer `begin_hour` superseded them. Returns whether
    /// anything was installed.
    pub fn install(&mut self, outputs: HourOutputs) -> bool {
        if outputs.generation != self.generation {
            debug!(
                "Discarding results for {} from generation {}; now on {}",
                outputs.hour, outputs.generation, self.generation
            );
            return false;
        }
        self.pending = None;
        if let Some((key, field)) = outputs.field {
            self.field_cache.install(key, field);
        }
        self.hour = Some(outputs.hour);
        self.attractors = outputs.attractors;
        self.resynthesize();
        true
    }

    /// Switches hours synchronously.
    pub fn set_hour(&mut self, hour: HourOfWeek) -> bool {
        let job = self.begin_hour(hour);
        match self.compute(&job) {
            Some(outputs) => self.install(outputs),
            None => false,
        }
    }

    /// Throws away the current points and scatters a fresh set for the current hour.
    pub fn resynthesize(&mut self) {
        let hour = match self.hour {
            Some(hour) => hour,
            None => {
                self.points.clear();
                return;
            }
        };
        let mut points = synthesize(
            &self.inputs.areas,
            &self.attractors,
            hour,
            &self.config,
            &mut self.rng,
        );
        if let Some(max) = self.config.max_presence_points {
            if points.len() > max {
                warn!(
                    "{} presence points for {}, only keeping a random {}",
                    abstutil::prettyprint_usize(points.len()),
                    hour,
                    abstutil::prettyprint_usize(max)
                );
                points.shuffle(&mut self.rng);
                points.truncate(max);
                points.sort_by_key(|p| p.id);
            }
        }
        self.points = points;
    }

    /// Advances the animation to `time_seconds` of wall clock.
    pub fn tick(&mut self, time_seconds: f64) -> &[PresencePoint] {
        let time = time_seconds * self.config.noise_time_scale;
        self.points = animate::step(
            &self.points,
            self.field_cache.field(),
            &self.areas,
            time,
            &self.config,
        );
        &self.points
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn areas(&self) -> &AreaIndex {
        &self.areas
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn hour(&self) -> Option<HourOfWeek> {
        self.hour
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    pub fn field(&self) -> &ForceField {
        self.field_cache.field()
    }

    pub fn points(&self) -> &[PresencePoint] {
        &self.points
    }
}
