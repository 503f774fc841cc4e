//! Opaque destinations: typed write capability into caller-owned storage.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;

/// A runtime-tagged reference to a caller's variable.
///
/// The destination never owns the value it points at; it borrows it for
/// `'a`. Every typed access checks the tag against the requested type and
/// panics on a mismatch, which can only happen through a bug in the code
/// driving the destination.
#[derive(Default)]
pub struct OpaqueDestination<'a> {
    slot: Option<Slot<'a>>,
}

struct Slot<'a> {
    target: RefCell<&'a mut dyn Any>,
    type_id: TypeId,
    type_name: &'static str,
}

impl<'a> OpaqueDestination<'a> {
    pub fn new<T: Any>(target: &'a mut T) -> Self {
        Self {
            slot: Some(Slot {
                target: RefCell::new(target as &'a mut dyn Any),
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
            }),
        }
    }

    /// `false` for the default, unbound destination.
    pub fn is_bound(&self) -> bool {
        self.slot.is_some()
    }

    pub fn type_is<T: Any>(&self) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|slot| slot.type_id == TypeId::of::<T>())
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.slot.as_ref().map(|slot| slot.type_id)
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.slot.as_ref().map(|slot| slot.type_name)
    }

    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let slot = self.checked::<T>();
        let target = slot.target.borrow();
        match target.downcast_ref::<T>() {
            Some(value) => f(value),
            None => unreachable!("destination tag and target disagree"),
        }
    }

    /// Run `f` with mutable access to the referenced variable.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let slot = self.checked::<T>();
        let mut target = slot.target.borrow_mut();
        match target.downcast_mut::<T>() {
            Some(value) => f(value),
            None => unreachable!("destination tag and target disagree"),
        }
    }

    pub fn load<T: Any + Clone>(&self) -> T {
        self.with(T::clone)
    }

    pub fn store<T: Any>(&self, value: T) {
        self.with_mut(|slot: &mut T| *slot = value);
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.slot, &mut other.slot);
    }

    /// Unbind, returning to the default state.
    pub fn reset(&mut self) {
        self.slot = None;
    }

    #[track_caller]
    fn checked<T: Any>(&self) -> &Slot<'a> {
        let Some(slot) = &self.slot else {
            panic!(
                "access through an unbound destination (requested `{}`)",
                std::any::type_name::<T>()
            );
        };
        if slot.type_id != TypeId::of::<T>() {
            panic!(
                "destination type mismatch: requested `{}`, destination holds `{}`",
                std::any::type_name::<T>(),
                slot.type_name
            );
        }
        slot
    }
}

impl fmt::Debug for OpaqueDestination<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Some(slot) => write!(f, "OpaqueDestination<{}>", slot.type_name),
            None => f.write_str("OpaqueDestination(unbound)"),
        }
    }
}
