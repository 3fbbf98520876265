use std::collections::VecDeque;

pub const DEFAULT_UNDO_DEPTH: usize = 100;

/// Bounded stack of snapshots. The oldest snapshot is dropped once the stack
/// holds `max_depth` entries.
#[derive(Clone, Debug)]
pub struct UndoStack<T> {
    entries: VecDeque<T>,
    max_depth: usize,
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl<T> UndoStack<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn push(&mut self, snapshot: T) {
        if self.entries.len() == self.max_depth {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_most_recent_first() {
        let mut stack = UndoStack::new(10);
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn drops_oldest_beyond_depth() {
        let mut stack = UndoStack::new(3);
        for n in 0..5 {
            stack.push(n);
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some(4));
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert!(stack.is_empty());
    }
}
