//! Bounded FIFO ring of motion samples.

use std::collections::VecDeque;

/// One 3-axis motion reading. Ordering is the buffer's insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionSample {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector.
    #[inline]
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Fixed-capacity buffer; pushing into a full buffer drops the oldest sample.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<MotionSample>,
    capacity: usize,
}

impl SampleBuffer {
    /// A zero capacity is bumped to 1 so the newest sample is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: MotionSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// The `k` most recent samples, oldest first. Fewer when not enough accumulated.
    pub fn last_n(&self, k: usize) -> Vec<MotionSample> {
        let skip = self.samples.len().saturating_sub(k);
        self.samples.iter().skip(skip).copied().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(i: usize) -> MotionSample {
        MotionSample::new(i as f32, 0.0, 0.0)
    }

    #[test]
    fn fifty_first_push_evicts_first() {
        let mut buf = SampleBuffer::with_capacity(50);
        for i in 1..=51 {
            buf.push(s(i));
        }
        assert_eq!(buf.len(), 50);
        let all = buf.last_n(50);
        let xs: Vec<usize> = all.iter().map(|m| m.x as usize).collect();
        assert_eq!(xs, (2..=51).collect::<Vec<_>>());
    }

    #[test]
    fn last_n_returns_newest_window_oldest_first() {
        let mut buf = SampleBuffer::with_capacity(10);
        for i in 0..7 {
            buf.push(s(i));
        }
        let w: Vec<usize> = buf.last_n(3).iter().map(|m| m.x as usize).collect();
        assert_eq!(w, vec![4, 5, 6]);
        // Asking for more than available yields everything.
        assert_eq!(buf.last_n(100).len(), 7);
        assert!(buf.last_n(0).is_empty());
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut buf = SampleBuffer::with_capacity(0);
        buf.push(s(1));
        buf.push(s(2));
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.last_n(5), vec![s(2)]);
    }

    #[test]
    fn magnitude_is_euclidean_norm() {
        assert_eq!(MotionSample::new(3.0, 4.0, 0.0).magnitude(), 5.0);
        assert_eq!(MotionSample::default().magnitude(), 0.0);
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buf = SampleBuffer::with_capacity(4);
        buf.push(s(1));
        buf.clear();
        assert!(buf.is_empty());
    }
}
