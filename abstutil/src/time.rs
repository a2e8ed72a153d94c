use std::time::Instant;

use crate::prettyprint_usize;

pub fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

pub fn prettyprint_time(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.1}ms", seconds * 1000.0)
    } else {
        format!("{:.4}s", seconds)
    }
}

struct TimerSpan {
    name: String,
    started_at: Instant,
    nested_results: Vec<String>,
}

/// Hierarchial magic. Nested phases are measured with `start` and `stop`; the summary, notes and
/// warnings are logged when the outermost span finishes.
pub struct Timer {
    results: Vec<String>,
    stack: Vec<TimerSpan>,

    outermost_name: String,

    notes: Vec<String>,
    warnings: Vec<String>,
}

impl Timer {
    pub fn new<I: Into<String>>(name: I) -> Timer {
        let name = name.into();
        let mut t = Timer {
            results: Vec::new(),
            stack: Vec::new(),
            outermost_name: name.clone(),
            notes: Vec::new(),
            warnings: Vec::new(),
        };
        t.start(name);
        t
    }

    /// Log immediately, but also repeat at the end, to avoid having to scroll up and find
    /// interesting debug stuff.
    pub fn note<I: Into<String>>(&mut self, line: I) {
        let line = line.into();
        info!("{}", line);
        self.notes.push(line);
    }

    pub fn warn<I: Into<String>>(&mut self, line: I) {
        self.warnings.push(line.into());
    }

    pub fn num_warnings(&self) -> usize {
        self.warnings.len()
    }

    /// Used to end the scope of a timer early.
    pub fn done(self) {}

    pub fn start<I: Into<String>>(&mut self, name: I) {
        let name = name.into();
        debug!("{}...", name);
        self.stack.push(TimerSpan {
            name,
            started_at: Instant::now(),
            nested_results: Vec::new(),
        });
    }

    pub fn stop<I: Into<String>>(&mut self, name: I) {
        let name = name.into();
        let span = match self.stack.pop() {
            Some(span) => span,
            None => {
                warn!("Timer stop({}) with nothing started", name);
                return;
            }
        };
        if span.name != name {
            warn!("Timer stop({}) doesn't match start({})", name, span.name);
        }
        let elapsed = elapsed_seconds(span.started_at);
        let line = format!("{} took {}", span.name, prettyprint_time(elapsed));
        debug!("{}", line);

        let padding = "  ".repeat(self.stack.len());
        let results = match self.stack.last_mut() {
            Some(parent) => &mut parent.nested_results,
            None => &mut self.results,
        };
        results.push(format!("{}- {}", padding, line));
        results.extend(span.nested_results);
    }
}

impl std::ops::Drop for Timer {
    fn drop(&mut self) {
        // Close any span somebody forgot about, then the outermost one.
        while self.stack.len() > 1 {
            let name = self.stack.last().map(|s| s.name.clone()).unwrap_or_default();
            self.stop(name);
        }
        let stop_name = self.outermost_name.clone();
        self.stop(stop_name);

        for line in &self.results {
            info!("{}", line);
        }

        if !self.notes.is_empty() {
            info!("{} notes:", prettyprint_usize(self.notes.len()));
            for line in &self.notes {
                info!("  {}", line);
            }
        }

        if !self.warnings.is_empty() {
            warn!("{} warnings:", prettyprint_usize(self.warnings.len()));
            for line in &self.warnings {
                warn!("  {}", line);
            }
        }
    }
}
