//! # Session Registry
//!
//! Fixed-capacity, unordered collection of live sessions.
//!
//! Occupied slots are always `0..len()`. Removing a slot moves the last
//! session into it, so removal is O(1) but indices are not stable across
//! removals.

/// Most sessions served at once; further connections are closed on accept
pub const SESSION_CAPACITY: usize = 32;

/// Bounded registry with swap-with-last removal
#[derive(Debug)]
pub struct SessionRegistry<T> {
    slots: Vec<T>,
}

impl<T> SessionRegistry<T> {
    pub fn new() -> Self {
        Self { slots: Vec::with_capacity(SESSION_CAPACITY) }
    }

    /// Append a session, returning its slot
    ///
    /// Hands the session back when the registry is full.
    pub fn try_add(&mut self, session: T) -> Result<usize, T> {
        if self.is_full() {
            return Err(session);
        }
        self.slots.push(session);
        Ok(self.slots.len() - 1)
    }

    /// Remove the session at `index`, relocating the last one into its slot
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.slots.len() {
            Some(self.slots.swap_remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    /// Take every session out, leaving the registry empty
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.slots.drain(..)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= SESSION_CAPACITY
    }
}

impl<T> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
