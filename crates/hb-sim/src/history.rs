//! Bounded credit history
//!
//! Keeps a running ledger at a fixed number of points no matter how long the
//! run is. Samples are averaged into equal buckets; whenever the point buffer
//! fills, neighbouring points are merged pairwise and the bucket size doubles.

/// Points kept by a simulation's credit history
pub const DEFAULT_HISTORY_POINTS: usize = 1_024;

/// Down-sampled running ledger
#[derive(Debug, Clone, PartialEq)]
pub struct CreditHistory {
    points: Vec<f64>,
    capacity: usize,
    /// Samples averaged into one point
    bucket: u64,
    open_sum: f64,
    open_count: u64,
    samples: u64,
    last: Option<f64>,
}

impl CreditHistory {
    /// History holding at most `capacity` points (rounded to an even number,
    /// at least 4)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(4) / 2 * 2;
        Self {
            points: Vec::with_capacity(capacity),
            capacity,
            bucket: 1,
            open_sum: 0.0,
            open_count: 0,
            samples: 0,
            last: None,
        }
    }

    /// Record the ledger after one more game (the first sample is the
    /// balance before the run)
    pub fn push(&mut self, value: f64) {
        self.samples += 1;
        self.last = Some(value);
        self.open_sum += value;
        self.open_count += 1;

        if self.open_count < self.bucket {
            return;
        }
        self.points.push(self.open_sum / self.open_count as f64);
        self.open_sum = 0.0;
        self.open_count = 0;

        if self.points.len() >= self.capacity {
            self.points = self
                .points
                .chunks(2)
                .map(|pair| pair.iter().sum::<f64>() / pair.len() as f64)
                .collect();
            self.bucket *= 2;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Games covered, not counting the starting balance
    pub fn games(&self) -> u64 {
        self.samples.saturating_sub(1)
    }

    /// Most recent ledger value
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Bucket means in order, the partly filled bucket last
    pub fn points(&self) -> Vec<f64> {
        let mut points = self.points.clone();
        if self.open_count > 0 {
            points.push(self.open_sum / self.open_count as f64);
        }
        points
    }
}

impl Default for CreditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_POINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_history_kept_exactly() {
        let mut history = CreditHistory::new(16);
        for v in [0.0, -3.0, 7.0] {
            history.push(v);
        }
        assert_eq!(history.points(), vec![0.0, -3.0, 7.0]);
        assert_eq!(history.games(), 2);
        assert_eq!(history.last(), Some(7.0));
    }

    #[test]
    fn test_merges_into_equal_buckets() {
        let mut history = CreditHistory::new(4);
        for v in 0..8 {
            history.push(f64::from(v));
        }
        assert_eq!(history.points(), vec![1.5, 5.5]);

        history.push(8.0);
        assert_eq!(history.points(), vec![1.5, 5.5, 8.0]);
        assert_eq!(history.games(), 8);
    }

    #[test]
    fn test_point_count_stays_bounded() {
        let mut history = CreditHistory::new(100);
        for v in 0..1_000_000 {
            history.push(f64::from(v));
        }
        assert!(history.points().len() <= 100);
        assert!(history.points().len() >= 50);
        assert_eq!(history.games(), 999_999);
        // bucket means stay increasing for a rising ledger
        let points = history.points();
        assert!(points.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty() {
        let history = CreditHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.games(), 0);
        assert!(history.points().is_empty());
        assert_eq!(history.last(), None);
    }
}
