//! Runs the footfall engine over a JSON bundle of telemetry, candidate spots and areas, writing
//! GeoJSON for each stage.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod animate;

use anyhow::Result;
use structopt::StructOpt;

use abstutil::Timer;
use footfall::{Config, HourOfWeek, Inputs};

#[derive(StructOpt)]
#[structopt(name = "footfall", about = "Synthesizes crowds from sparse telemetry")]
enum Command {
    /// Infer a crowdedness for every candidate spot at one hour
    Infer {
        #[structopt(flatten)]
        common: Common,
        /// Also include the telemetry points themselves
        #[structopt(long)]
        include_observed: bool,
        /// The GeoJSON file to write
        #[structopt(long)]
        output: String,
    },
    /// Build the force field over the study area
    Field {
        #[structopt(flatten)]
        common: Common,
        /// Override the configured grid resolution
        #[structopt(long)]
        resolution_meters: Option<f64>,
        /// Also write grid cells with no force
        #[structopt(long)]
        include_zero: bool,
        /// The GeoJSON file to write
        #[structopt(long)]
        output: String,
    },
    /// Scatter presence points inside every area
    Synthesize {
        #[structopt(flatten)]
        common: Common,
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
        /// The GeoJSON file to write
        #[structopt(long)]
        output: String,
    },
    /// Synthesize, then write a sequence of animation frames
    Animate {
        #[structopt(flatten)]
        common: Common,
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
        /// How many frames to write
        #[structopt(long, default_value = "25")]
        frames: usize,
        /// Frames are written here, as frame_0000.geojson and so on
        #[structopt(long)]
        output_dir: String,
    },
    /// Write the well-formed areas with their average presence
    Areas {
        #[structopt(flatten)]
        common: Common,
        /// The GeoJSON file to write
        #[structopt(long)]
        output: String,
    },
}

#[derive(StructOpt)]
struct Common {
    /// The path to a JSON file with telemetry, spots, and areas
    #[structopt(long)]
    input: String,
    /// The hour of the week, either 0 to 167 starting Monday midnight, or like `tuesday-18`
    #[structopt(long, parse(try_from_str = parse_hour))]
    hour: HourOfWeek,
    /// An optional JSON file overriding some of the default settings
    #[structopt(long)]
    config: Option<String>,
}

impl Common {
    fn load(&self) -> Result<(Inputs, Config)> {
        let config = match self.config {
            Some(ref path) => Config::load(path)?,
            None => Config::default(),
        };
        Ok((Inputs::load(&self.input)?, config))
    }
}

fn parse_hour(raw: &str) -> Result<HourOfWeek> {
    match raw.parse::<usize>() {
        Ok(idx) => HourOfWeek::new(idx),
        Err(_) => HourOfWeek::from_column_name(raw),
    }
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    match Command::from_args() {
        Command::Infer {
            common,
            include_observed,
            output,
        } => infer(common, include_observed, output),
        Command::Field {
            common,
            resolution_meters,
            include_zero,
            output,
        } => field(common, resolution_meters, include_zero, output),
        Command::Synthesize {
            common,
            rng_seed,
            output,
        } => synthesize(common, rng_seed, output),
        Command::Animate {
            common,
            rng_seed,
            frames,
            output_dir,
        } => {
            let (inputs, config) = common.load()?;
            animate::run(inputs, config, common.hour, rng_seed, frames, output_dir)
        }
        Command::Areas { common, output } => {
            let (inputs, _) = common.load()?;
            abstutil::write_json(
                &output,
                &footfall::export::areas_to_geojson(&inputs.areas, common.hour),
            )
        }
    }
}

fn infer(common: Common, include_observed: bool, output: String) -> Result<()> {
    let (inputs, config) = common.load()?;
    let mut timer = Timer::new(format!("infer attractors for {}", common.hour));
    let mut attractors = footfall::infer(&inputs.telemetry, &inputs.spots, common.hour, &config);
    let num_active = attractors.iter().filter(|a| a.is_active()).count();
    timer.note(format!(
        "{} of {} candidate spots attract anybody",
        abstutil::prettyprint_usize(num_active),
        abstutil::prettyprint_usize(attractors.len())
    ));
    if include_observed {
        attractors.extend(footfall::observed_attractors(
            &inputs.telemetry,
            common.hour,
        ));
    }
    abstutil::write_json(
        &output,
        &footfall::export::attractors_to_geojson(&attractors),
    )
}

fn field(
    common: Common,
    resolution_meters: Option<f64>,
    include_zero: bool,
    output: String,
) -> Result<()> {
    let (inputs, config) = common.load()?;
    let resolution = resolution_meters.unwrap_or(config.field_resolution_meters);
    if resolution.is_nan() || resolution <= 0.0 {
        bail!("--resolution-meters must be positive, not {}", resolution);
    }
    let mut timer = Timer::new(format!("build force field for {}", common.hour));
    timer.start("infer attractors");
    let attractors = footfall::infer(&inputs.telemetry, &inputs.spots, common.hour, &config);
    timer.stop("infer attractors");

    timer.start("build field");
    let bounds = footfall::study_area_bounds(&inputs.areas);
    let field = footfall::build_field(&attractors, &bounds, resolution, &config);
    timer.stop("build field");
    if field.is_empty() {
        timer.warn("No well-formed areas, so the field is empty");
    } else {
        timer.note(format!(
            "{} grid cells",
            abstutil::prettyprint_usize(field.cells().len())
        ));
    }
    abstutil::write_json(
        &output,
        &footfall::export::field_to_geojson(&field, include_zero),
    )
}

fn synthesize(common: Common, rng_seed: u64, output: String) -> Result<()> {
    let (inputs, config) = common.load()?;
    let mut session = footfall::Session::new(inputs, config, rng_seed);
    session.set_hour(common.hour);
    abstutil::write_json(
        &output,
        &footfall::export::points_to_geojson(session.points()),
    )
}
