//! Time series and logged tables.

use std::collections::BTreeMap;

use lp_core::units;

use crate::error::{SignalError, SignalResult};

/// Samples `(t, value)` with non-decreasing `t` in seconds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> SignalResult<Self> {
        if times.len() != values.len() {
            return Err(SignalError::LengthMismatch {
                what: "time series values".into(),
                expected: times.len(),
                got: values.len(),
            });
        }
        if let Some(&t) = times.iter().find(|t| !t.is_finite()) {
            return Err(SignalError::NonFinite {
                what: "timestamp",
                value: t,
            });
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(SignalError::InvalidArg {
                what: "timestamps must be non-decreasing",
            });
        }
        Ok(Self { times, values })
    }

    /// Build from integer-microsecond timestamps.
    pub fn from_micros(timestamps_us: &[i64], values: Vec<f64>) -> SignalResult<Self> {
        let times = timestamps_us
            .iter()
            .map(|&us| units::micros_to_seconds(us as f64))
            .collect();
        Self::new(times, values)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first_time(&self) -> Option<f64> {
        self.times.first().copied()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// `t[1] - t[0]`, if there are two samples.
    pub fn sample_spacing(&self) -> Option<f64> {
        match self.times.as_slice() {
            [a, b, ..] => Some(b - a),
            _ => None,
        }
    }

    fn filtered(&self, keep: impl Fn(f64) -> bool) -> TimeSeries {
        let (times, values) = self
            .times
            .iter()
            .zip(&self.values)
            .filter(|(t, _)| keep(**t))
            .map(|(t, v)| (*t, *v))
            .unzip();
        TimeSeries { times, values }
    }

    /// Samples with `start <= t <= end`.
    pub fn window(&self, start: f64, end: f64) -> TimeSeries {
        self.filtered(|t| t >= start && t <= end)
    }

    /// Samples with `t >= start`.
    pub fn since(&self, start: f64) -> TimeSeries {
        self.filtered(|t| t >= start)
    }

    /// Everything but the final sample, which a recorder may have left half
    /// written.
    pub fn drop_last(&self) -> TimeSeries {
        let n = self.len().saturating_sub(1);
        TimeSeries {
            times: self.times[..n].to_vec(),
            values: self.values[..n].to_vec(),
        }
    }

    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> TimeSeries {
        TimeSeries {
            times: self.times.clone(),
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    pub fn negated(&self) -> TimeSeries {
        self.map_values(|v| -v)
    }

    /// Shift time so the first sample sits at zero. Applying it twice is the
    /// same as applying it once.
    pub fn rezeroed(&self) -> TimeSeries {
        let t0 = self.first_time().unwrap_or(0.0);
        TimeSeries {
            times: self.times.iter().map(|t| t - t0).collect(),
            values: self.values.clone(),
        }
    }
}

/// One recorded CSV log: microsecond timestamps plus named value columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogTable {
    timestamps_us: Vec<i64>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl LogTable {
    pub fn new(timestamps_us: Vec<i64>) -> Self {
        Self {
            timestamps_us,
            columns: BTreeMap::new(),
        }
    }

    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> SignalResult<()> {
        let name = name.into();
        if values.len() != self.timestamps_us.len() {
            return Err(SignalError::LengthMismatch {
                what: format!("column '{name}'"),
                expected: self.timestamps_us.len(),
                got: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> SignalResult<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.timestamps_us.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps_us.is_empty()
    }

    pub fn timestamps_us(&self) -> &[i64] {
        &self.timestamps_us
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> SignalResult<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SignalError::MissingColumn {
                name: name.to_string(),
            })
    }

    /// One column against time in seconds.
    pub fn series(&self, name: &str) -> SignalResult<TimeSeries> {
        let values = self.column(name)?.to_vec();
        TimeSeries::from_micros(&self.timestamps_us, values)
    }
}
