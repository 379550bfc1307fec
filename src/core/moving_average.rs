// Fixed-length moving average window over recent angle samples

use std::collections::VecDeque;

/// Rolling window that keeps the last `capacity` samples in arrival order
#[derive(Debug, Clone)]
pub struct MovingAverage {
    samples: VecDeque<f32>,
    capacity: usize,
    sum: f64,
}

impl MovingAverage {
    /// `capacity` is clamped to at least one sample
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    /// Append a sample, evicting the oldest once the window is full
    pub fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= f64::from(oldest);
            }
        }
        self.samples.push_back(sample);
        self.sum += f64::from(sample);
    }

    /// Mean of the samples currently held, `None` when empty
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some((self.sum / self.samples.len() as f64) as f32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_average_of_partial_window() {
        let mut window = MovingAverage::new(10);
        assert_eq!(window.average(), None);

        window.push(90.0);
        window.push(120.0);
        assert_eq!(window.len(), 2);
        assert!((window.average().unwrap() - 105.0).abs() < 1e-4);
    }

    #[test]
    fn test_oldest_sample_is_evicted() {
        let mut window = MovingAverage::new(3);
        for sample in [10.0, 20.0, 30.0, 40.0] {
            window.push(sample);
        }
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![20.0, 30.0, 40.0]);
        assert!((window.average().unwrap() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = MovingAverage::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.average(), Some(2.0));
    }

    #[test]
    fn test_clear() {
        let mut window = MovingAverage::new(4);
        window.push(5.0);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.average(), None);
    }

    proptest! {
        #[test]
        fn prop_window_keeps_last_n_in_order(
            capacity in 1usize..20,
            samples in proptest::collection::vec(0.0f32..180.0, 0..60),
        ) {
            let mut window = MovingAverage::new(capacity);
            for sample in &samples {
                window.push(*sample);
                prop_assert!(window.len() <= capacity);
            }

            let expected: Vec<f32> = samples
                .iter()
                .copied()
                .skip(samples.len().saturating_sub(capacity))
                .collect();
            prop_assert_eq!(window.samples().collect::<Vec<_>>(), expected);
        }
    }
}
