use tokio::sync::Mutex;

struct Slot<T> {
    generation: u64,
    value: Option<T>,
}

/// Cached device view, replaced whole and invalidated by generation bumps.
pub(crate) struct Cached<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Clone> Cached<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                value: None,
            }),
        }
    }

    /// A copy of the cached value.
    pub(crate) async fn get(&self) -> Option<T> {
        self.slot.lock().await.value.clone()
    }

    pub(crate) async fn generation(&self) -> u64 {
        self.slot.lock().await.generation
    }

    pub(crate) async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.generation += 1;
        slot.value = None;
    }

    /// Stores a value fetched during `generation`. A fetch that raced an
    /// invalidation is not cached.
    pub(crate) async fn store(&self, generation: u64, value: T) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.generation != generation {
            return false;
        }
        slot.value = Some(value);
        true
    }
}
