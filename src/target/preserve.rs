//! Preserve guard - keep an interpreter's state alive across a scope
//!
//! Deleting an interpreter while a guard is outstanding only marks it;
//! teardown runs when the last guard drops.

use super::engine::Engine;
use std::rc::Rc;

/// RAII guard for automatic preserve/release
///
/// Usage:
/// ```ignore
/// let guard = PreserveGuard::new(&engine);
/// engine.delete();
/// // state still alive here
/// drop(guard); // disposal runs now
/// ```
pub struct PreserveGuard {
    engine: Rc<Engine>,
}

impl PreserveGuard {
    #[inline]
    pub fn new(engine: &Rc<Engine>) -> Self {
        engine.preserve();
        Self {
            engine: Rc::clone(engine),
        }
    }

    #[inline]
    pub fn engine(&self) -> &Rc<Engine> {
        &self.engine
    }
}

impl Clone for PreserveGuard {
    fn clone(&self) -> Self {
        Self::new(&self.engine)
    }
}

impl Drop for PreserveGuard {
    #[inline]
    fn drop(&mut self) {
        self.engine.release();
    }
}
