//! Argument bundles - pre-converted, reusable call arguments
//!
//! A bundle holds one reference to each converted value and a preserve
//! guard on the interpreter that built it. Teardown drops both exactly
//! once; dropping the bundle tears it down if nobody did before.

use super::call::CallArgs;
use super::marshal;
use super::repr;
use crate::errors::{BridgeError, Result};
use crate::host::{HostValue, UserData};
use crate::logging;
use crate::target::{Engine, Obj, PreserveGuard};
use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

pub const BUNDLE_TYPE_NAME: &str = "ltcl.Vals";

struct Pinned {
    values: Vec<Obj>,
    _guard: PreserveGuard,
}

pub struct ArgBundle {
    pinned: RefCell<Option<Pinned>>,
}

impl ArgBundle {
    /// Convert `values` for `engine`. Nothing is pinned unless every value
    /// converts.
    pub fn build(engine: &Rc<Engine>, values: &[HostValue]) -> Result<Self> {
        if values.is_empty() {
            return Err(BridgeError::argument("vals", 2, "not enough arguments"));
        }
        let converted = values
            .iter()
            .map(marshal::to_target)
            .collect::<Result<Vec<Obj>>>()?;

        logging::log_bundle_build(converted.len());
        Ok(Self {
            pinned: RefCell::new(Some(Pinned {
                values: converted,
                _guard: PreserveGuard::new(engine),
            })),
        })
    }

    /// Release the values and the preserve guard; later calls do nothing
    pub fn teardown(&self) {
        let pinned = self.pinned.borrow_mut().take();
        if let Some(pinned) = pinned {
            logging::log_bundle_teardown(pinned.values.len());
            drop(pinned);
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.pinned.borrow().is_none()
    }

    pub fn len(&self) -> usize {
        self.pinned.borrow().as_ref().map_or(0, |p| p.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// New references to the held values
    pub fn values(&self) -> Vec<Obj> {
        self.pinned
            .borrow()
            .as_ref()
            .map(|p| p.values.clone())
            .unwrap_or_default()
    }

    /// Append the held values to `args`, taking a reference to each
    pub fn splice_into(&self, args: &mut CallArgs) -> Result<usize> {
        let pinned = self.pinned.borrow();
        let Some(pinned) = pinned.as_ref() else {
            return Err(BridgeError::conversion("attempt to use a released argument bundle"));
        };
        args.extend(pinned.values.iter().cloned());
        Ok(pinned.values.len())
    }

    /// Wrap the bundle for the host; the host dropping it tears it down
    pub fn into_userdata(self) -> UserData {
        UserData::new(BUNDLE_TYPE_NAME, self)
    }

    /// The bundle carried by `value`, if it is one
    pub fn from_value(value: &HostValue) -> Option<&ArgBundle> {
        value
            .as_userdata()
            .filter(|u| u.type_name() == BUNDLE_TYPE_NAME)
            .and_then(|u| u.downcast_ref::<ArgBundle>())
    }

    pub fn to_repr(&self) -> Result<String> {
        repr::bounded(format!("{}: {:#x}", BUNDLE_TYPE_NAME, self as *const Self as usize))
    }
}

impl Drop for ArgBundle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ArgBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgBundle")
            .field("len", &self.len())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
