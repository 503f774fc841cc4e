//! Type-erased value container.

use std::any::{Any, TypeId};
use std::fmt;

/// Owns exactly one value whose concrete type is only known at runtime.
///
/// Recovering the value requires naming its exact type. Asking for any
/// other type is a bug in the caller and panics.
pub struct AnyValue {
    value: Box<dyn Any>,
    type_name: &'static str,
}

impl AnyValue {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether the stored value is exactly a `T`.
    pub fn type_is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn type_id(&self) -> TypeId {
        self.value.as_ref().type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn cast<T: Any>(&self) -> &T {
        match self.value.downcast_ref::<T>() {
            Some(v) => v,
            None => self.mismatch::<T>(),
        }
    }

    pub fn cast_mut<T: Any>(&mut self) -> &mut T {
        let type_name = self.type_name;
        match self.value.downcast_mut::<T>() {
            Some(v) => v,
            None => mismatch_panic::<T>(type_name),
        }
    }

    /// Move the value out. The container is consumed.
    pub fn into_inner<T: Any>(self) -> T {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(v) => *v,
            Err(_) => mismatch_panic::<T>(type_name),
        }
    }

    pub(crate) fn as_any(&self) -> &dyn Any {
        self.value.as_ref()
    }

    fn mismatch<T: Any>(&self) -> ! {
        mismatch_panic::<T>(self.type_name)
    }
}

#[track_caller]
fn mismatch_panic<T: Any>(actual: &str) -> ! {
    panic!(
        "AnyValue type mismatch: requested `{}`, but the value holds `{}`",
        std::any::type_name::<T>(),
        actual
    )
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::AnyValue;
    use std::rc::Rc;

    #[test]
    fn cast_returns_stored_value() {
        let mut v = AnyValue::new(41_i32);
        assert!(v.type_is::<i32>());
        assert!(!v.type_is::<i64>());
        *v.cast_mut::<i32>() += 1;
        assert_eq!(*v.cast::<i32>(), 42);
        assert_eq!(v.type_name(), "i32");
    }

    #[test]
    fn into_inner_moves_value_out() {
        let v = AnyValue::new(vec!["a".to_string(), "b".to_string()]);
        let inner: Vec<String> = v.into_inner();
        assert_eq!(inner, ["a", "b"]);
    }

    #[test]
    fn drop_runs_the_right_destructor() {
        let shared = Rc::new(());
        let v = AnyValue::new(Rc::clone(&shared));
        assert_eq!(Rc::strong_count(&shared), 2);
        drop(v);
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    #[should_panic(expected = "AnyValue type mismatch")]
    fn cast_to_other_type_panics() {
        let v = AnyValue::new(1_u8);
        let _ = v.cast::<i8>();
    }

    #[test]
    #[should_panic(expected = "requested `alloc::string::String`")]
    fn into_inner_of_other_type_panics() {
        let v = AnyValue::new(1.5_f64);
        let _: String = v.into_inner();
    }
}
