use anyhow::Result;

use abstutil::Timer;
use footfall::{Config, HourOfWeek, Inputs, Session, Ticker};

/// Writes `num_frames` GeoJSON snapshots, spaced at the configured frame rate.
pub fn run(
    inputs: Inputs,
    config: Config,
    hour: HourOfWeek,
    rng_seed: u64,
    num_frames: usize,
    output_dir: String,
) -> Result<()> {
    let frames_per_second = config.frames_per_second;
    let mut session = Session::new(inputs, config, rng_seed);
    let mut timer = Timer::new(format!("animate {}", hour));

    timer.start("set hour");
    session.set_hour(hour);
    timer.stop("set hour");
    if session.points().is_empty() {
        timer.warn(format!("Nobody's around at {}", hour));
    }

    // There's no real clock here, so every frame lands exactly on schedule.
    let mut ticker = Ticker::new(frames_per_second);
    let mut written = 0;
    let mut frame = 0;
    while written < num_frames {
        let now = (frame as f64) / frames_per_second;
        frame += 1;
        if !ticker.due(now) {
            continue;
        }
        let points = session.tick(now);
        let path = format!("{}/frame_{:04}.geojson", output_dir, written);
        abstutil::write_json(&path, &footfall::export::points_to_geojson(points))?;
        written += 1;
    }
    info!(
        "Wrote {} frames of {} points to {}",
        written,
        abstutil::prettyprint_usize(session.points().len()),
        output_dir
    );
    Ok(())
}
