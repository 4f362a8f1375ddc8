//! Queued values and the handles used to address them.

/// A value paired with its priority.
///
/// Higher `priority` values dequeue first. The priority carries no meaning
/// beyond ordering; callers pick whatever scale fits (path length, a
/// timestamp, a severity level).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item<T> {
    /// The payload.
    pub value: T,
    /// Ordering key; higher sorts first.
    pub priority: i64,
}

impl<T> Item<T> {
    /// Creates a new item.
    pub fn new(value: T, priority: i64) -> Self {
        Self { value, priority }
    }

    /// Consumes the item, returning its payload.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Handle to an item that is still inside a heap.
///
/// Keys are generation-checked: once the item is popped or removed, the key
/// goes stale and will never resolve to a later item that reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub(crate) slot: usize,
    pub(crate) generation: u32,
}
