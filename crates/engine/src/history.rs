/// Linear undo/redo history over full-state snapshots.
///
/// `stack[0..=cursor]` is the committed past and `stack[cursor]` is the
/// current state. Pushing drops everything after the cursor first.

#[derive(Debug, Clone)]
pub struct History<T> {
    stack: Vec<T>,
    cursor: usize,
    /// Maximum retained entries, 0 = unbounded
    limit: usize,
}

impl<T: Clone> History<T> {
    pub fn new(initial: T) -> Self {
        Self::with_limit(initial, 0)
    }

    pub fn with_limit(initial: T, limit: usize) -> Self {
        Self {
            stack: vec![initial],
            cursor: 0,
            limit,
        }
    }

    pub fn current(&self) -> &T {
        &self.stack[self.cursor]
    }

    /// Record a new state as current, discarding any redoable future.
    pub fn push(&mut self, state: T) {
        self.stack.truncate(self.cursor + 1);
        self.stack.push(state);
        self.cursor = self.stack.len() - 1;

        // Limit history size; the cursor is always the last entry here
        if self.limit > 0 && self.stack.len() > self.limit {
            let excess = self.stack.len() - self.limit;
            self.stack.drain(..excess);
            self.cursor = self.stack.len() - 1;
        }
        log::debug!("history push: {} entries, cursor {}", self.stack.len(), self.cursor);
    }

    /// Step back one entry. Returns the new current state, or `None` at the start.
    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        log::debug!("history undo: cursor {}", self.cursor);
        Some(&self.stack[self.cursor])
    }

    /// Step forward one entry. Returns the new current state, or `None` at the end.
    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.stack.len() {
            return None;
        }
        self.cursor += 1;
        log::debug!("history redo: cursor {}", self.cursor);
        Some(&self.stack[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    /// Replace the whole history with a single entry.
    pub fn reset(&mut self, state: T) {
        self.stack.clear();
        self.stack.push(state);
        self.cursor = 0;
    }

    /// Stored states, the current one included. Never zero.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_undo_redo() {
        let mut h = History::new(0);
        h.push(1);
        h.push(2);
        assert_eq!(*h.current(), 2);
        assert_eq!(h.undo(), Some(&1));
        assert_eq!(h.undo(), Some(&0));
        assert_eq!(h.undo(), None);
        assert_eq!(*h.current(), 0);
        assert_eq!(h.redo(), Some(&1));
        assert_eq!(h.redo(), Some(&2));
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn test_push_truncates_future() {
        let mut h = History::new("a");
        h.push("b");
        h.push("c");
        h.undo();
        h.undo();
        h.push("x");
        assert_eq!(*h.current(), "x");
        assert!(!h.can_redo());
        assert_eq!(h.redo(), None);
        assert_eq!(h.depth(), 2);
    }

    #[test]
    fn test_can_flags() {
        let mut h = History::new(0);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        h.push(1);
        assert!(h.can_undo());
        h.undo();
        assert!(h.can_redo());
    }

    #[test]
    fn test_reset() {
        let mut h = History::new(0);
        h.push(1);
        h.push(2);
        h.reset(9);
        assert_eq!(*h.current(), 9);
        assert_eq!(h.depth(), 1);
        assert!(!h.can_undo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut h = History::with_limit(0, 3);
        for i in 1..=5 {
            h.push(i);
        }
        assert_eq!(h.depth(), 3);
        assert_eq!(*h.current(), 5);
        assert_eq!(h.undo(), Some(&4));
        assert_eq!(h.undo(), Some(&3));
        assert_eq!(h.undo(), None);
    }
}
