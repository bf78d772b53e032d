//! Circular interpolation window.
//!
//! Holds the last `capacity` values pushed for one channel, oldest first.
//! Storage is mirrored (every value is written at `i` and `i + capacity`),
//! so the live window is always a contiguous slice regardless of where the
//! ring head sits, and pushes never compact.

pub struct InterpolationWindow {
    storage: Vec<f64>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl InterpolationWindow {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "interpolation window capacity must be non-zero");
        Self {
            storage: vec![0.0; capacity * 2],
            capacity,
            head: 0,
            len: 0,
        }
    }

    /// Append a value, evicting the oldest once the window is full.
    #[inline]
    pub fn push(&mut self, value: f64) {
        let slot = if self.len < self.capacity {
            let slot = (self.head + self.len) % self.capacity;
            self.len += 1;
            slot
        } else {
            let slot = self.head;
            self.head = (self.head + 1) % self.capacity;
            slot
        };

        self.storage[slot] = value;
        self.storage[slot + self.capacity] = value;
    }

    /// The live window, oldest value first.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.storage[self.head..self.head + self.len]
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
