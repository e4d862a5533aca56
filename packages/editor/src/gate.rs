//! Capability gate deciding whether the current user may edit.
//!
//! The engine only asks the question; how elevation is granted (a password
//! prompt on the page, a CLI flag) lives with the caller.

use std::cell::Cell;
use std::rc::Rc;

pub trait AccessGate {
    fn is_elevated(&self) -> bool;
}

/// Fixed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticGate(pub bool);

impl AccessGate for StaticGate {
    fn is_elevated(&self) -> bool {
        self.0
    }
}

impl<F> AccessGate for F
where
    F: Fn() -> bool,
{
    fn is_elevated(&self) -> bool {
        self()
    }
}

/// Toggle shared between the session and whoever grants access
#[derive(Debug, Clone, Default)]
pub struct SharedGate(Rc<Cell<bool>>);

impl SharedGate {
    pub fn new(elevated: bool) -> Self {
        Self(Rc::new(Cell::new(elevated)))
    }

    pub fn grant(&self) {
        self.0.set(true);
    }

    pub fn revoke(&self) {
        self.0.set(false);
    }
}

impl AccessGate for SharedGate {
    fn is_elevated(&self) -> bool {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_gate_is_shared() {
        let gate = SharedGate::new(false);
        let handle = gate.clone();
        assert!(!gate.is_elevated());
        handle.grant();
        assert!(gate.is_elevated());
        handle.revoke();
        assert!(!gate.is_elevated());
    }

    #[test]
    fn test_closure_gate() {
        let gate = || true;
        assert!(gate.is_elevated());
        assert!(!StaticGate(false).is_elevated());
    }
}
