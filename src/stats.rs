//! Running mean and deviation of a sample.

use std::fmt;

/// Incremental statistics (Welford's algorithm).
#[derive(Clone, Debug, Default)]
pub struct Statistics {
    count: f32,
    mean: f32,
    m2: f32,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn add(&mut self, x: f32) {
        self.count += 1.0;
        let delta = x - self.mean;
        self.mean += delta / self.count;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> f32 {
        self.count
    }

    pub fn mean(&self) -> f32 {
        self.mean
    }

    pub fn variance(&self) -> f32 {
        if self.count > 0.0 {
            (self.m2 / self.count).max(0.0)
        } else {
            0.0
        }
    }

    /// Standard deviation of the sample (population form).
    pub fn deviation(&self) -> f32 {
        self.variance().sqrt()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} dev={:.1}", self.mean, self.deviation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_deviation() {
        let mut s = Statistics::new();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            s.add(x);
        }
        assert_eq!(s.count(), 8.0);
        assert!((s.mean() - 5.0).abs() < 1e-5);
        assert!((s.deviation() - 2.0).abs() < 1e-5);
        s.clear();
        assert_eq!(s.deviation(), 0.0);
    }
}
