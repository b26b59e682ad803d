//! Keyboard focus over an ordered set of targets.

/// Cycles focus through `len` targets, wrapping at both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusRing {
    len: usize,
    current: usize,
}

/// Which way focus moved, and what it left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusMove {
    pub from: usize,
    pub to: usize,
}

impl FocusRing {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Focused index, `None` when there is nothing to focus.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.current)
    }

    pub fn next(&mut self) -> Option<FocusMove> {
        self.step(1)
    }

    pub fn prev(&mut self) -> Option<FocusMove> {
        self.step(self.len.saturating_sub(1))
    }

    pub fn focus(&mut self, index: usize) -> Option<FocusMove> {
        if index >= self.len {
            return None;
        }
        let from = self.current;
        self.current = index;
        Some(FocusMove { from, to: index })
    }

    /// Change the number of targets, keeping focus in range.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if self.current >= len {
            self.current = len.saturating_sub(1);
        }
    }

    fn step(&mut self, offset: usize) -> Option<FocusMove> {
        if self.len == 0 {
            return None;
        }
        let from = self.current;
        self.current = (self.current + offset) % self.len;
        Some(FocusMove {
            from,
            to: self.current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_in_both_directions() {
        let mut ring = FocusRing::new(3);
        assert_eq!(ring.prev(), Some(FocusMove { from: 0, to: 2 }));
        assert_eq!(ring.next(), Some(FocusMove { from: 2, to: 0 }));
        assert_eq!(ring.next(), Some(FocusMove { from: 0, to: 1 }));
    }

    #[test]
    fn empty_ring_has_no_focus() {
        let mut ring = FocusRing::new(0);
        assert_eq!(ring.current(), None);
        assert_eq!(ring.next(), None);
        assert_eq!(ring.focus(0), None);
    }

    #[test]
    fn resize_clamps_focus() {
        let mut ring = FocusRing::new(6);
        ring.focus(5);
        ring.resize(4);
        assert_eq!(ring.current(), Some(3));
    }
}
