//! Progress side-channel and cooperative cancellation.
//!
//! Both pipelines report after each file/section and poll the cancel flag
//! between items. Neither is required: `()` is a valid no-op sink and a
//! fresh `CancelToken` never fires.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use indicatif::ProgressBar;

/// Receives one notification per completed file or section
pub trait ProgressSink {
    fn item_done(&self, done: usize, total: Option<usize>, label: &str);
}

impl ProgressSink for () {
    fn item_done(&self, _done: usize, _total: Option<usize>, _label: &str) {}
}

impl ProgressSink for ProgressBar {
    fn item_done(&self, done: usize, total: Option<usize>, label: &str) {
        if let Some(total) = total {
            self.set_length(total as u64);
        }
        self.set_position(done as u64);
        self.set_message(label.to_string());
    }
}

impl<F> ProgressSink for F
where
    F: Fn(usize, Option<usize>, &str),
{
    fn item_done(&self, done: usize, total: Option<usize>, label: &str) {
        self(done, total, label)
    }
}

/// Shared flag checked between items; cloning shares the same flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Trip this token from a Ctrl-C handler (process-wide, first caller wins)
    pub fn install_ctrlc(&self) -> anyhow::Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, stopping after the current item");
            token.cancel();
        })?;
        Ok(())
    }
}
