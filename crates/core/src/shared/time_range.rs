use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("invalid clip range: start {start:.3}s must be before end {end:.3}s")]
pub struct InvalidRangeError {
    pub start: f64,
    pub end: f64,
}

/// A non-empty span of media time in seconds.
///
/// Only constructible through [`TimeRange::new`], so holders can rely on
/// `0 <= start < end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Result<Self, InvalidRangeError> {
        let valid = start.is_finite() && end.is_finite() && start >= 0.0 && start < end;
        if !valid {
            return Err(InvalidRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}
