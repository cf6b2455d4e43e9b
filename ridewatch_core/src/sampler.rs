//! Motion sample intake.
//!
//! `MotionBuffers` is the sink handed to the `MotionSource`: events are pushed
//! from the sensor's delivery context while the tick worker reads windows.
//! Each buffer sits behind its own narrow lock that is held only for a push,
//! a window copy or a clear, never across a collaborator call.
use crate::buffer::{MotionSample, SampleBuffer};
use ridewatch_traits::{MotionKind, MotionSink};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct MotionBuffers {
    accel: Mutex<SampleBuffer>,
    gyro: Mutex<SampleBuffer>,
    /// Closed while idle so a late event from a source that is being
    /// unregistered cannot refill the buffers after `clear`. Read and
    /// written only under the buffer locks.
    accepting: AtomicBool,
    received: AtomicU64,
}

impl core::fmt::Debug for MotionBuffers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionBuffers")
            .field("accel_len", &self.len(MotionKind::Accel))
            .field("gyro_len", &self.len(MotionKind::Gyro))
            .field("accepting", &self.is_accepting())
            .field("received", &self.received())
            .finish()
    }
}

#[inline]
fn lock(m: &Mutex<SampleBuffer>) -> MutexGuard<'_, SampleBuffer> {
    // A panic while holding the guard cannot leave a VecDeque half-updated.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MotionBuffers {
    /// Buffers start closed; `open` them when monitoring begins.
    pub fn new(capacity: usize) -> Self {
        Self {
            accel: Mutex::new(SampleBuffer::with_capacity(capacity)),
            gyro: Mutex::new(SampleBuffer::with_capacity(capacity)),
            accepting: AtomicBool::new(false),
            received: AtomicU64::new(0),
        }
    }

    fn buffer(&self, kind: MotionKind) -> &Mutex<SampleBuffer> {
        match kind {
            MotionKind::Accel => &self.accel,
            MotionKind::Gyro => &self.gyro,
        }
    }

    /// Append a sample. Dropped silently while the buffers are closed.
    pub fn push(&self, kind: MotionKind, sample: MotionSample) {
        let mut buf = lock(self.buffer(kind));
        if !self.accepting.load(Ordering::Acquire) {
            return;
        }
        buf.push(sample);
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy of the `k` most recent samples, oldest first.
    pub fn window(&self, kind: MotionKind, k: usize) -> Vec<MotionSample> {
        lock(self.buffer(kind)).last_n(k)
    }

    pub fn len(&self, kind: MotionKind) -> usize {
        lock(self.buffer(kind)).len()
    }

    pub fn open(&self) {
        self.set_accepting(true);
    }

    /// Once this returns no push is mid-flight, so a following `clear`
    /// leaves both buffers empty.
    pub fn close(&self) {
        self.set_accepting(false);
    }

    // Same lock order as `clear`.
    fn set_accepting(&self, on: bool) {
        let _accel = lock(&self.accel);
        let _gyro = lock(&self.gyro);
        self.accepting.store(on, Ordering::Release);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Drop every buffered sample of both kinds.
    pub fn clear(&self) {
        lock(&self.accel).clear();
        lock(&self.gyro).clear();
    }

    /// Total samples accepted since construction (diagnostics).
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

impl MotionSink for MotionBuffers {
    fn deliver(&self, kind: MotionKind, x: f32, y: f32, z: f32) {
        self.push(kind, MotionSample::new(x, y, z));
    }
}
