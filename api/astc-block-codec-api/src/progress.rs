//! Progress reporting for whole-image compression.

use core::sync::atomic::{AtomicU32, Ordering};

/// Receiver for compression progress callbacks.
///
/// Reports arrive from whichever worker thread finishes a block, so the sink
/// must be safe to call concurrently. Percentages are monotonic and the final
/// report is always exactly 100.0.
pub trait ProgressSink: Sync {
    /// Called with the completed fraction of the image, in percent.
    fn report(&self, percent: f32);
}

impl<F: Fn(f32) + Sync> ProgressSink for F {
    fn report(&self, percent: f32) {
        self(percent)
    }
}

/// Tracks completed blocks and forwards rate-limited reports to a sink.
pub(crate) struct ProgressMeter<'a> {
    sink: &'a dyn ProgressSink,
    total: usize,
    /// Minimum percentage step between reports, so huge images do not drown
    /// the sink in callbacks.
    min_diff: f32,
    /// Bit pattern of the last percentage reported.
    last_bits: AtomicU32,
    #[cfg(feature = "std")]
    report_lock: std::sync::Mutex<()>,
}

impl<'a> ProgressMeter<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, total_blocks: usize) -> Self {
        let total = total_blocks.max(1);
        let min_diff = (4096.0 / total as f32 * 100.0).max(1.0);
        let meter = Self {
            sink,
            total,
            min_diff,
            last_bits: AtomicU32::new((-100.0f32).to_bits()),
            #[cfg(feature = "std")]
            report_lock: std::sync::Mutex::new(()),
        };
        meter.emit(0.0);
        meter
    }

    /// Records `done` completed blocks and reports if the step is large
    /// enough. Safe to call from multiple threads.
    pub(crate) fn completed(&self, done: usize) {
        let percent = (done as f32 / self.total as f32 * 100.0).min(100.0);

        // Cheap unlocked check first; most blocks change nothing.
        let last = f32::from_bits(self.last_bits.load(Ordering::Relaxed));
        if percent - last < self.min_diff && percent != 100.0 {
            return;
        }

        #[cfg(feature = "std")]
        let _guard = match self.report_lock.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Recheck under the lock; another thread may have raced past us.
        let last = f32::from_bits(self.last_bits.load(Ordering::Relaxed));
        if percent - last < self.min_diff && percent != 100.0 {
            return;
        }
        if percent <= last {
            return;
        }
        self.emit(percent);
    }

    /// Reports completion. Called once after the last block is stored.
    pub(crate) fn finish(&self) {
        if f32::from_bits(self.last_bits.load(Ordering::Relaxed)) < 100.0 {
            self.emit(100.0);
        }
    }

    fn emit(&self, percent: f32) {
        self.last_bits.store(percent.to_bits(), Ordering::Relaxed);
        self.sink.report(percent);
    }
}
