use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag set when the user interrupts a run.
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

    /// Cancel this token on Ctrl-C.
    pub fn install_ctrlc_handler(&self) {
        let token = self.clone();
        if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
            tracing::debug!("could not install Ctrl-C handler: {e}");
        }
    }
}
