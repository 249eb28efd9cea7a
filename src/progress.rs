//! Progress-callback trait for per-row generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to hear
//! about each row as it is rendered. The CLI uses this to drive its progress
//! bar; a web handler could forward the same events to a socket.
//!
//! # Example
//!
//! ```rust
//! use xlsx2payslip::{GenerationConfig, GenerationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     rendered: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_row_complete(&self, row: usize, total_rows: usize, filename: &str, _bytes: usize) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Row {}/{} → {}", row, total_rows, filename);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { rendered: AtomicUsize::new(0) });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch orchestrator as it renders each row.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// Rows render concurrently, so `on_row_start`, `on_row_complete` and
/// `on_row_error` may be called from different threads and out of row order.
/// Protect shared mutable state with `Mutex` or atomics.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once after validation, before any row is rendered.
    fn on_batch_start(&self, total_rows: usize) {
        let _ = total_rows;
    }

    /// Called before a row is rendered.
    ///
    /// # Arguments
    /// * `row`       : 1-indexed data row
    /// * `total_rows`: data rows in the batch
    fn on_row_start(&self, row: usize, total_rows: usize) {
        let _ = (row, total_rows);
    }

    /// Called when a row produced its document.
    ///
    /// # Arguments
    /// * `filename`: name the document will carry (inside the zip, if any)
    /// * `bytes`   : size of the rendered PDF
    fn on_row_complete(&self, row: usize, total_rows: usize, filename: &str, bytes: usize) {
        let _ = (row, total_rows, filename, bytes);
    }

    /// Called when a row failed. The batch fails with it.
    fn on_row_error(&self, row: usize, total_rows: usize, error: &str) {
        let _ = (row, total_rows, error);
    }

    /// Called once after every row has been attempted.
    fn on_batch_complete(&self, total_rows: usize, success_count: usize) {
        let _ = (total_rows, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        started_total: AtomicUsize,
        completed_total: AtomicUsize,
        filenames: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_rows: usize) {
            self.started_total.store(total_rows, Ordering::SeqCst);
        }

        fn on_row_start(&self, _row: usize, _total_rows: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_row_complete(&self, _row: usize, _total_rows: usize, filename: &str, _bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.filenames.lock().unwrap().push(filename.to_string());
        }

        fn on_row_error(&self, _row: usize, _total_rows: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total_rows: usize, success_count: usize) {
            self.completed_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_row_start(1, 2);
        cb.on_row_complete(1, 2, "payslip_A_1.pdf", 1024);
        cb.on_row_error(2, 2, "boom");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_row_start(1, 3);
        tracker.on_row_complete(1, 3, "payslip_Jane_Doe_E001.pdf", 2048);
        tracker.on_row_start(2, 3);
        tracker.on_row_complete(2, 3, "payslip_Raj_E002.pdf", 2048);
        tracker.on_row_start(3, 3);
        tracker.on_row_error(3, 3, "render failed");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.filenames.lock().unwrap().len(), 2);

        tracker.on_batch_complete(3, 2);
        assert_eq!(tracker.completed_total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_row_start(1, 10);
    }
}
