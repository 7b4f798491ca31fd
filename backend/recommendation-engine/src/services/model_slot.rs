use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Holder of a recommender's current model.
///
/// Readers clone the `Arc` and query it without holding the lock, so a swap
/// never blocks or tears an in-flight query. The lock only guards the pointer.
pub struct ModelSlot<M> {
    current: RwLock<Option<Arc<M>>>,
    training: AtomicBool,
}

impl<M> ModelSlot<M> {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            training: AtomicBool::new(false),
        }
    }

    pub fn current(&self) -> Option<Arc<M>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    pub fn replace(&self, model: M) {
        let model = Arc::new(model);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    /// Claim the training flag; `None` when a run is already in flight.
    pub fn try_begin_training(&self) -> Option<TrainingGuard<'_>> {
        self.training
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TrainingGuard {
                flag: &self.training,
            })
    }
}

impl<M> Default for ModelSlot<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the training flag on drop, including on error paths.
pub struct TrainingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for TrainingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_training_claim_is_refused_until_release() {
        let slot: ModelSlot<u32> = ModelSlot::new();
        let guard = slot.try_begin_training();
        assert!(guard.is_some());
        assert!(slot.try_begin_training().is_none());
        drop(guard);
        assert!(slot.try_begin_training().is_some());
    }

    #[test]
    fn readers_keep_the_snapshot_they_took() {
        let slot = ModelSlot::new();
        assert!(!slot.is_ready());
        slot.replace(1u32);
        let before = slot.current().unwrap();
        slot.replace(2u32);
        assert_eq!(*before, 1);
        assert_eq!(*slot.current().unwrap(), 2);
    }
}
