//! Renderer chains: ordered override functions for a named element.
//!
//! The newest registration runs first and may delegate to the next-older
//! renderer through a cursor the chain keeps internally. Once the chain
//! is exhausted the delegation proxy falls back to a pass-through, so a
//! renderer can always call "continue" without knowing its position.

use std::cell::Cell;

/// An ordered renderer list with a delegation cursor.
///
/// Generic over the renderer function type; the component runtime
/// instantiates it with its own closure signature.
pub struct RendererChain<F> {
    /// Newest first.
    fns: Vec<F>,
    cursor: Cell<usize>,
}

impl<F> RendererChain<F> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fns: Vec::new(),
            cursor: Cell::new(0),
        }
    }

    /// Registers a renderer ahead of every existing one.
    pub fn prepend(&mut self, f: F) {
        self.fns.insert(0, f);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fns.len()
    }

    /// Resets the cursor and returns the newest renderer.
    pub fn start(&self) -> Option<&F> {
        self.cursor.set(0);
        self.advance()
    }

    /// Returns the next-older renderer, or `None` once exhausted.
    ///
    /// Callers translate `None` into the untouched element, which gives
    /// every chain an implicit pass-through at its end.
    pub fn advance(&self) -> Option<&F> {
        let at = self.cursor.get();
        let f = self.fns.get(at)?;
        self.cursor.set(at + 1);
        Some(f)
    }
}

impl<F> Default for RendererChain<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> std::fmt::Debug for RendererChain<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererChain")
            .field("len", &self.fns.len())
            .field("cursor", &self.cursor.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_registration_runs_first() {
        let mut chain: RendererChain<&'static str> = RendererChain::new();
        chain.prepend("a");
        chain.prepend("b");
        assert_eq!(chain.start().copied(), Some("b"));
        assert_eq!(chain.advance().copied(), Some("a"));
        assert_eq!(chain.advance().copied(), None);
    }

    #[test]
    fn start_resets_the_cursor() {
        let mut chain: RendererChain<i32> = RendererChain::new();
        chain.prepend(1);
        assert_eq!(chain.start().copied(), Some(1));
        assert_eq!(chain.advance(), None);
        assert_eq!(chain.start().copied(), Some(1));
    }

    #[test]
    fn empty_chain_is_exhausted_immediately() {
        let chain: RendererChain<i32> = RendererChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.start(), None);
    }
}
