//! Turns sparse crowdedness telemetry into something that looks like people walking around.
//!
//! The pipeline per hour-of-week:
//!
//! 1. `inference` gives every tagged candidate spot a crowdedness, borrowed from the telemetry
//!    points with similar tags nearby.
//! 2. `field` discretizes the study area into a grid of attraction vectors pulling towards those
//!    spots.
//! 3. `synthesize` scatters presence points inside each area, mostly around the spots.
//! 4. `animate` wiggles the points every frame, pulled by the field, never letting them leave
//!    their area.
//!
//! `Session` ties these together with caching and cancellation for interactive use.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub use crate::animate::{step, Ticker};
pub use crate::config::Config;
pub use crate::field::{
    build_field, build_field_cancellable, study_area_bounds, FieldCache, FieldKey, ForceCell,
    ForceField,
};
pub use crate::hour::{HourOfWeek, Weekday};
pub use crate::inference::{
    infer, infer_cancellable, observed_attractors, Attractor, AttractorSource,
};
pub use crate::records::{Area, AreaID, AreaIndex, CandidateSpot, Inputs, TelemetryRecord};
pub use crate::session::{CancelFlag, HourJob, HourOutputs, Session};
pub use crate::synthesize::{synthesize, PresencePoint, PresencePointID};
pub use crate::tags::{jaccard, TagSet};

mod animate;
mod config;
pub mod export;
mod field;
mod hour;
mod inference;
pub mod noise;
mod records;
mod session;
mod synthesize;
mod tags;
