//! Per-pixel reductions used by vector aggregation.

use serde::{Deserialize, Serialize};

use map_common::{MapError, MapResult};

/// How the values of features covering a pixel are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Sum,
    #[default]
    Count,
    Min,
    Max,
    Mean,
    Any,
}

impl Reduction {
    pub fn parse(s: &str) -> MapResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(Reduction::Sum),
            "count" => Ok(Reduction::Count),
            "min" => Ok(Reduction::Min),
            "max" => Ok(Reduction::Max),
            "mean" => Ok(Reduction::Mean),
            "any" => Ok(Reduction::Any),
            other => Err(MapError::invalid_config(
                "agg_func",
                format!("unknown reduction '{}'", other),
            )),
        }
    }

    /// Value of a pixel no feature touched.
    pub fn empty_value(&self) -> f64 {
        match self {
            Reduction::Sum | Reduction::Count | Reduction::Any => 0.0,
            Reduction::Min | Reduction::Max | Reduction::Mean => f64::NAN,
        }
    }
}

/// Running per-pixel state for a reduction.
pub(crate) struct Accumulator {
    reduction: Reduction,
    values: Vec<f64>,
    counts: Vec<u32>,
}

impl Accumulator {
    pub(crate) fn new(reduction: Reduction, len: usize) -> Self {
        let init = match reduction {
            Reduction::Min => f64::INFINITY,
            Reduction::Max => f64::NEG_INFINITY,
            _ => 0.0,
        };
        Self {
            reduction,
            values: vec![init; len],
            counts: vec![0; len],
        }
    }

    /// Fold one feature value into pixel `idx`.
    #[inline]
    pub(crate) fn add(&mut self, idx: usize, value: f64) {
        if value.is_nan() {
            return;
        }
        let slot = &mut self.values[idx];
        match self.reduction {
            Reduction::Sum | Reduction::Mean => *slot += value,
            Reduction::Count => *slot += 1.0,
            Reduction::Min => *slot = slot.min(value),
            Reduction::Max => *slot = slot.max(value),
            Reduction::Any => *slot = 1.0,
        }
        self.counts[idx] += 1;
    }

    pub(crate) fn finish(self) -> Vec<f64> {
        let empty = self.reduction.empty_value();
        let reduction = self.reduction;
        self.values
            .into_iter()
            .zip(self.counts)
            .map(|(value, count)| {
                if count == 0 {
                    empty
                } else if reduction == Reduction::Mean {
                    value / count as f64
                } else {
                    value
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(reduction: Reduction, values: &[f64]) -> f64 {
        let mut acc = Accumulator::new(reduction, 1);
        for &v in values {
            acc.add(0, v);
        }
        acc.finish()[0]
    }

    #[test]
    fn test_reductions() {
        let values = [4.0, 1.0, 7.0];
        assert_eq!(reduce(Reduction::Sum, &values), 12.0);
        assert_eq!(reduce(Reduction::Count, &values), 3.0);
        assert_eq!(reduce(Reduction::Min, &values), 1.0);
        assert_eq!(reduce(Reduction::Max, &values), 7.0);
        assert_eq!(reduce(Reduction::Mean, &values), 4.0);
        assert_eq!(reduce(Reduction::Any, &values), 1.0);
    }

    #[test]
    fn test_empty_pixels() {
        assert_eq!(reduce(Reduction::Sum, &[]), 0.0);
        assert_eq!(reduce(Reduction::Count, &[]), 0.0);
        assert_eq!(reduce(Reduction::Any, &[]), 0.0);
        assert!(reduce(Reduction::Min, &[]).is_nan());
        assert!(reduce(Reduction::Max, &[]).is_nan());
        assert!(reduce(Reduction::Mean, &[]).is_nan());
    }

    #[test]
    fn test_nan_values_skipped() {
        assert_eq!(reduce(Reduction::Mean, &[f64::NAN, 2.0]), 2.0);
        assert!(reduce(Reduction::Max, &[f64::NAN]).is_nan());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Reduction::parse("MEAN").unwrap(), Reduction::Mean);
        assert!(matches!(
            Reduction::parse("median"),
            Err(MapError::InvalidConfig { .. })
        ));
    }
}
