//! Bounded undo/redo stacks of snapshots

use std::collections::VecDeque;
use std::mem;

/// Undo and redo stacks. The undo stack holds at most `capacity`
/// snapshots; the oldest is evicted first.
#[derive(Clone, Debug)]
pub struct History<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    capacity: usize,
}

impl<T> History<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(capacity.min(64)),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Record the state before a mutation. Clears the redo stack.
    pub fn record(&mut self, snapshot: T) {
        self.push_undo(snapshot);
        self.redo.clear();
    }

    fn push_undo(&mut self, snapshot: T) {
        if self.capacity == 0 {
            return;
        }
        while self.undo.len() >= self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
    }

    /// Swap `current` with the most recent undo snapshot, moving the
    /// replaced state onto the redo stack. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self, current: &mut T) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(mem::replace(current, previous));
        true
    }

    /// Mirror of [`History::undo`]
    pub fn redo(&mut self, current: &mut T) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let replaced = mem::replace(current, next);
        self.push_undo(replaced);
        true
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
