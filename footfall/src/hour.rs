use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn all() -> Vec<Weekday> {
        vec![
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
            Weekday::Sunday,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

/// One of the 168 (day, hour) buckets of a week, starting Monday at midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HourOfWeek(u8);

impl HourOfWeek {
    pub const NUM_HOURS: usize = 7 * 24;

    pub fn new(idx: usize) -> Result<HourOfWeek> {
        if idx >= HourOfWeek::NUM_HOURS {
            bail!(
                "Hour-of-week must be in [0, {}), not {}",
                HourOfWeek::NUM_HOURS,
                idx
            );
        }
        Ok(HourOfWeek(idx as u8))
    }

    pub fn from_day_hour(day: Weekday, hour: usize) -> Result<HourOfWeek> {
        if hour >= 24 {
            bail!("Hour of day must be in [0, 24), not {}", hour);
        }
        HourOfWeek::new((day as usize) * 24 + hour)
    }

    pub fn all() -> Vec<HourOfWeek> {
        (0..HourOfWeek::NUM_HOURS as u8).map(HourOfWeek).collect()
    }

    pub fn idx(self) -> usize {
        self.0 as usize
    }

    pub fn day(self) -> Weekday {
        Weekday::all()[self.idx() / 24]
    }

    pub fn hour_of_day(self) -> usize {
        self.idx() % 24
    }

    /// The name of the column holding this hour in crowdedness exports, like `tuesday-07`.
    pub fn column_name(self) -> String {
        format!("{}-{:02}", self.day().name(), self.hour_of_day())
    }

    pub fn from_column_name(name: &str) -> Result<HourOfWeek> {
        let (day, hour) = match name.split_once('-') {
            Some(pair) => pair,
            None => bail!("Column {} isn't day-hour", name),
        };
        let day = match Weekday::all().into_iter().find(|d| d.name() == day) {
            Some(d) => d,
            None => bail!("Column {} has unknown day {}", name, day),
        };
        let hour: usize = hour
            .parse()
            .map_err(|err| anyhow!("Column {} has bad hour: {}", name, err))?;
        HourOfWeek::from_day_hour(day, hour)
    }
}

impl fmt::Display for HourOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.column_name(), self.0)
    }
}
