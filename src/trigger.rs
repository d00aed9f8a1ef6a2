// src/trigger.rs
//
// Execution trigger adapter: the seam between an external event source and
// the pipeline. The process has exactly one trigger slot, so a second attach
// fails while the first adapter is alive. Events may arrive on any thread,
// concurrently; each one runs exactly one pass.

use crate::inference_core::{InferencePipeline, PassOutcome};
use log::{debug, info};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static TRIGGER_SLOT: AtomicBool = AtomicBool::new(false);

#[derive(Debug, PartialEq)]
pub enum TriggerError {
    AlreadyAttached,
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerError::AlreadyAttached => {
                write!(f, "An engine is already attached to the trigger slot")
            }
        }
    }
}

impl std::error::Error for TriggerError {}

/// Holds the trigger slot for as long as it lives; dropping it detaches.
pub struct TriggerAdapter {
    pipeline: Arc<InferencePipeline>,
}

impl TriggerAdapter {
    pub fn attach(pipeline: Arc<InferencePipeline>) -> Result<Self, TriggerError> {
        if TRIGGER_SLOT.swap(true, Ordering::SeqCst) {
            return Err(TriggerError::AlreadyAttached);
        }
        info!("inference engine attached to trigger slot");
        Ok(TriggerAdapter { pipeline })
    }

    /// One event, one pass. The outcome is advisory; event sources do not
    /// inspect it.
    pub fn fire(&self) -> PassOutcome {
        let outcome = self.pipeline.run_pass();
        if outcome == PassOutcome::Skipped {
            debug!("trigger event produced no output");
        }
        outcome
    }
}

impl Drop for TriggerAdapter {
    fn drop(&mut self) {
        TRIGGER_SLOT.store(false, Ordering::SeqCst);
        info!("inference engine detached from trigger slot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor_store::ExchangeStore;
    use std::sync::Mutex;

    // The trigger slot is process-wide; serialize the tests that claim it.
    static SLOT_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn pipeline() -> Arc<InferencePipeline> {
        Arc::new(InferencePipeline::new(ExchangeStore::shared()))
    }

    #[test]
    fn test_attach_is_exclusive_until_drop() {
        let _guard = SLOT_TEST_LOCK.lock().unwrap();

        let adapter = match TriggerAdapter::attach(pipeline()) {
            Ok(adapter) => adapter,
            Err(e) => panic!("first attach failed: {}", e),
        };
        assert!(matches!(
            TriggerAdapter::attach(pipeline()),
            Err(TriggerError::AlreadyAttached)
        ));

        drop(adapter);
        // Slot released: attach succeeds again.
        assert!(TriggerAdapter::attach(pipeline()).is_ok());
    }

    #[test]
    fn test_fire_on_empty_store_skips_silently() {
        let _guard = SLOT_TEST_LOCK.lock().unwrap();

        let adapter = TriggerAdapter::attach(pipeline()).unwrap();
        // No tensors provisioned: every event is a silent no-op.
        for _ in 0..3 {
            assert_eq!(adapter.fire(), PassOutcome::Skipped);
        }
    }
}
