//! # Reference-Counted Context Values
//!
//! Provides [`RefCountedValue`], the ownership wrapper for everything stored in an
//! [`EventContext`](crate::EventContext).
//!
//! Handles share one slot through an `Rc`. The optional cleanup closure owns the
//! value's teardown and runs exactly once, when the last handle goes away. Because
//! [`RefCountedValue::release`] consumes the handle, releasing the same reference
//! twice cannot be expressed.
//!
//! # Example
//!
//! ```rust,ignore
//! let value = RefCountedValue::with_cleanup(vec![1u8, 2, 3], |bytes| drop(bytes));
//! let extra = value.retain()?; // count = 2
//! assert!(!extra.release());   // count = 1
//! assert!(value.release());    // cleanup runs here
//! ```

use crate::error::ChainError;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

type Cleanup = Box<dyn FnOnce(Box<dyn Any>)>;

/// Highest count [`RefCountedValue::retain`] will hand out.
const MAX_REF_COUNT: usize = isize::MAX as usize;

struct Slot {
    data: Option<Box<dyn Any>>,
    type_name: &'static str,
    cleanup: Option<Cleanup>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let (Some(cleanup), Some(data)) = (self.cleanup.take(), self.data.take()) {
            cleanup(data);
        }
    }
}

/// A shared, reference-counted value with an optional cleanup callback.
///
/// - **Retain**: [`retain`](Self::retain) or `clone` adds a handle
/// - **Release**: [`release`](Self::release) or dropping a handle removes one
/// - **Cleanup**: runs once, on the 1 → 0 transition
pub struct RefCountedValue(Rc<Slot>);

impl RefCountedValue {
    /// Wrap a value with no cleanup callback. The count starts at 1.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(Slot {
            data: Some(Box::new(value)),
            type_name: std::any::type_name::<T>(),
            cleanup: None,
        }))
    }

    /// Wrap a value whose teardown is handled by `cleanup`.
    ///
    /// `cleanup` receives the value by ownership once the last handle is released.
    pub fn with_cleanup<T, F>(value: T, cleanup: F) -> Self
    where
        T: Any,
        F: FnOnce(T) + 'static,
    {
        let cleanup: Cleanup = Box::new(move |data: Box<dyn Any>| {
            if let Ok(value) = data.downcast::<T>() {
                cleanup(*value);
            }
        });
        Self(Rc::new(Slot {
            data: Some(Box::new(value)),
            type_name: std::any::type_name::<T>(),
            cleanup: Some(cleanup),
        }))
    }

    /// Add a handle, failing instead of wrapping when the count is saturated.
    pub fn retain(&self) -> Result<Self, ChainError> {
        let next = Rc::strong_count(&self.0)
            .checked_add(1)
            .ok_or(ChainError::Overflow("reference count"))?;
        if next > MAX_REF_COUNT {
            return Err(ChainError::Overflow("reference count"));
        }
        Ok(Self(Rc::clone(&self.0)))
    }

    /// Release this handle.
    ///
    /// Returns `true` when this was the last handle, in which case the cleanup
    /// callback (if any) has run by the time this returns.
    pub fn release(self) -> bool {
        let last = Rc::strong_count(&self.0) == 1;
        drop(self);
        last
    }

    /// Borrow the wrapped value as `T`.
    ///
    /// Returns `None` if the value is of a different type.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.data.as_deref()?.downcast_ref::<T>()
    }

    /// Current number of live handles.
    pub fn count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Whether a cleanup callback is attached.
    pub fn has_cleanup(&self) -> bool {
        self.0.cleanup.is_some()
    }

    /// Name of the wrapped value's type.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    /// Whether two handles share the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Clone for RefCountedValue {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl fmt::Debug for RefCountedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCountedValue")
            .field("type", &self.0.type_name)
            .field("count", &self.count())
            .field("cleanup", &self.has_cleanup())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<usize>>, impl FnOnce(String) + 'static) {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        (calls, move |_value: String| seen.set(seen.get() + 1))
    }

    #[test]
    fn test_new_value_has_count_one() {
        let value = RefCountedValue::new(42i64);
        assert_eq!(value.count(), 1);
        assert_eq!(value.get::<i64>(), Some(&42));
        assert!(!value.has_cleanup());
    }

    #[test]
    fn test_get_with_wrong_type() {
        let value = RefCountedValue::new(42i64);
        assert!(value.get::<String>().is_none());
        assert_eq!(value.type_name(), "i64");
    }

    #[test]
    fn test_retain_and_release() {
        let value = RefCountedValue::new("data".to_string());
        let second = value.retain().expect("retain");
        assert_eq!(value.count(), 2);
        assert!(second.ptr_eq(&value));

        assert!(!second.release());
        assert_eq!(value.count(), 1);
        assert!(value.release());
    }

    #[test]
    fn test_cleanup_runs_once_at_last_release() {
        let (calls, cleanup) = counter();
        let value = RefCountedValue::with_cleanup("secret".to_string(), cleanup);
        let a = value.retain().unwrap();
        let b = value.clone();

        assert!(!a.release());
        assert_eq!(calls.get(), 0);
        assert!(!value.release());
        assert_eq!(calls.get(), 0);
        assert!(b.release());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_cleanup_receives_value() {
        let seen = Rc::new(Cell::new(0u32));
        let sink = Rc::clone(&seen);
        let value = RefCountedValue::with_cleanup(7u32, move |v| sink.set(v));
        drop(value);
        assert_eq!(seen.get(), 7);
    }
}
