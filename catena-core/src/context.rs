//! # Event Context
//!
//! The bounded key/value store shared by every event and middleware in a chain.
//!
//! Entries keep their insertion order and keys are unique. Every admission is
//! checked against the entry ceiling and the accounted-memory ceiling *before*
//! anything changes, so a rejected `set` leaves the context exactly as it was.
//!
//! # Accessors
//!
//! - [`EventContext::get`] borrows a value for the duration of the current call
//! - [`EventContext::get_ref`] retains the value so it can outlive the slot
//!
//! # Memory accounting
//!
//! Accounted bytes are the context header, one slot per allocated capacity and,
//! per entry, the key length plus terminator plus the value handle.

use crate::cancel::CancellationToken;
use crate::error::{ChainError, scrub};
use crate::limits::{INITIAL_CAPACITY, Limits};
use crate::value::RefCountedValue;
use std::any::Any;
use std::fmt;
use std::mem::size_of;

/// Fixed bytes charged per entry on top of its key.
pub const ENTRY_OVERHEAD: usize = size_of::<RefCountedValue>();

/// Bytes charged per allocated slot.
pub const SLOT_BYTES: usize = size_of::<Entry>();

struct Entry {
    key: String,
    value: RefCountedValue,
}

impl Drop for Entry {
    fn drop(&mut self) {
        scrub(&mut self.key);
    }
}

/// Bounded, ordered key/value store with reference-counted values.
pub struct EventContext {
    entries: Vec<Entry>,
    capacity: usize,
    memory: usize,
    limits: Limits,
    cancel: CancellationToken,
}

impl EventContext {
    /// Create an empty context with the default [`Limits`].
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create an empty context with explicit limits.
    pub fn with_limits(limits: Limits) -> Self {
        let capacity = INITIAL_CAPACITY.min(limits.max_context_entries);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            memory: base_memory(capacity),
            limits,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the cancellation token events observe through this context.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Store `value` under `key` without a cleanup callback.
    pub fn set<T: Any>(&mut self, key: &str, value: T) -> Result<(), ChainError> {
        self.set_value(key, RefCountedValue::new(value))
    }

    /// Store `value` under `key`; `cleanup` runs once the last reference is released.
    pub fn set_with_cleanup<T, F>(&mut self, key: &str, value: T, cleanup: F) -> Result<(), ChainError>
    where
        T: Any,
        F: FnOnce(T) + 'static,
    {
        self.set_value(key, RefCountedValue::with_cleanup(value, cleanup))
    }

    /// Install a prepared handle under `key`.
    ///
    /// An existing entry keeps its position; its previous value is released once
    /// and replaced. A new key is appended after the ceilings are checked.
    pub fn set_value(&mut self, key: &str, value: RefCountedValue) -> Result<(), ChainError> {
        self.validate_key(key)?;

        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            let previous = std::mem::replace(&mut entry.value, value);
            previous.release();
            return Ok(());
        }

        if self.entries.len() >= self.limits.max_context_entries {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                key,
                limit = self.limits.max_context_entries,
                "context entry limit reached"
            );
            return Err(ChainError::CapacityExceeded {
                what: "context",
                limit: self.limits.max_context_entries,
            });
        }

        let growth = self.next_capacity()?;
        let growth_bytes = match growth {
            Some(new_capacity) => (new_capacity - self.capacity)
                .checked_mul(SLOT_BYTES)
                .ok_or(ChainError::Overflow("context growth"))?,
            None => 0,
        };
        let requested = self
            .memory
            .checked_add(entry_cost(key)?)
            .and_then(|m| m.checked_add(growth_bytes))
            .ok_or(ChainError::Overflow("context memory"))?;

        if requested > self.limits.max_context_memory {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                key,
                requested,
                limit = self.limits.max_context_memory,
                "context memory limit reached"
            );
            return Err(ChainError::MemoryLimitExceeded {
                requested,
                limit: self.limits.max_context_memory,
            });
        }

        if let Some(new_capacity) = growth {
            self.entries.reserve_exact(new_capacity - self.entries.len());
            self.capacity = new_capacity;
        }
        self.entries.push(Entry {
            key: key.to_owned(),
            value,
        });
        self.memory = requested;
        Ok(())
    }

    /// Borrow the value stored under `key` as `T`.
    ///
    /// The reference count is not touched; the borrow ends with the current call.
    pub fn get<T: Any>(&self, key: &str) -> Result<&T, ChainError> {
        let entry = self.find(key)?;
        entry.value.get::<T>().ok_or_else(|| {
            ChainError::InvalidParameter(format!(
                "value for `{key}` is {}, not {}",
                entry.value.type_name(),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Retain the value stored under `key`.
    ///
    /// The returned handle keeps the value alive after the entry is replaced or
    /// removed; releasing it is the caller's job.
    pub fn get_ref(&self, key: &str) -> Result<RefCountedValue, ChainError> {
        self.find(key)?.value.retain()
    }

    /// Whether `key` is present.
    ///
    /// With `constant_time` set every entry is compared in full, so the time taken
    /// does not depend on whether or where the key matches. Use it for keys whose
    /// presence is sensitive.
    pub fn has(&self, key: &str, constant_time: bool) -> bool {
        if !constant_time {
            return self.entries.iter().any(|e| e.key == key);
        }

        let mut found = 0u8;
        for entry in &self.entries {
            found |= u8::from(constant_time_eq(
                entry.key.as_bytes(),
                key.as_bytes(),
                self.limits.max_key_length,
            ));
        }
        std::hint::black_box(found) != 0
    }

    /// Remove `key`, releasing its value and compacting the remaining entries.
    pub fn remove(&mut self, key: &str) -> Result<(), ChainError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.key == key)
            .ok_or_else(|| ChainError::NotFound(key.to_owned()))?;

        let charged = entry_cost(&self.entries[index].key)?;
        let entry = self.entries.remove(index);
        self.memory = self.memory.saturating_sub(charged);
        drop(entry);
        Ok(())
    }

    /// Release every value. Allocated capacity is kept for reuse.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.memory = base_memory(self.capacity);
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accounted memory in bytes.
    pub fn memory_usage(&self) -> usize {
        self.memory
    }

    /// Number of allocated entry slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The limits this context enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// The token of the chain this context belongs to.
    ///
    /// Cancelling it stops the run before the next event starts.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn find(&self, key: &str) -> Result<&Entry, ChainError> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .ok_or_else(|| ChainError::NotFound(key.to_owned()))
    }

    fn validate_key(&self, key: &str) -> Result<(), ChainError> {
        if key.is_empty() {
            return Err(ChainError::InvalidParameter("context key is empty".into()));
        }
        if key.len() > self.limits.max_key_length {
            return Err(ChainError::KeyTooLong {
                len: key.len(),
                max: self.limits.max_key_length,
            });
        }
        Ok(())
    }

    /// The capacity to grow to before the next append, if growth is needed.
    fn next_capacity(&self) -> Result<Option<usize>, ChainError> {
        if self.entries.len() < self.capacity {
            return Ok(None);
        }
        let doubled = self
            .capacity
            .max(1)
            .checked_mul(2)
            .ok_or(ChainError::Overflow("context capacity"))?;
        Ok(Some(doubled.min(self.limits.max_context_entries)))
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .field("memory", &self.memory)
            .finish()
    }
}

fn base_memory(capacity: usize) -> usize {
    size_of::<EventContext>() + capacity * SLOT_BYTES
}

fn entry_cost(key: &str) -> Result<usize, ChainError> {
    key.len()
        .checked_add(1 + ENTRY_OVERHEAD)
        .ok_or(ChainError::Overflow("entry size"))
}

/// Compare two keys in time that depends only on `max_len`.
fn constant_time_eq(a: &[u8], b: &[u8], max_len: usize) -> bool {
    let mut diff = a.len() ^ b.len();
    for i in 0..max_len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    std::hint::black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_set_get_roundtrip() {
        let mut ctx = EventContext::new();
        ctx.set("value", 42i64).unwrap();
        assert_eq!(*ctx.get::<i64>("value").unwrap(), 42);
        assert_eq!(ctx.count(), 1);
    }

    #[test]
    fn test_get_missing_and_mismatched() {
        let mut ctx = EventContext::new();
        assert_eq!(ctx.get::<i64>("nope").unwrap_err().code(), ErrorCode::NotFound);

        ctx.set("value", 42i64).unwrap();
        let err = ctx.get::<String>("value").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_replace_releases_previous_value_once() {
        let released = Rc::new(Cell::new(0));
        let seen = Rc::clone(&released);

        let mut ctx = EventContext::new();
        ctx.set_with_cleanup("k", 1u32, move |_| seen.set(seen.get() + 1))
            .unwrap();
        let before = ctx.memory_usage();
        ctx.set("k", 2u32).unwrap();

        assert_eq!(released.get(), 1);
        assert_eq!(ctx.count(), 1);
        assert_eq!(*ctx.get::<u32>("k").unwrap(), 2);
        assert_eq!(ctx.memory_usage(), before);
    }

    #[test]
    fn test_replace_keeps_outstanding_reference_alive() {
        let mut ctx = EventContext::new();
        ctx.set("k", "old".to_string()).unwrap();
        let held = ctx.get_ref("k").unwrap();
        assert_eq!(held.count(), 2);

        ctx.set("k", "new".to_string()).unwrap();
        assert_eq!(held.count(), 1);
        assert_eq!(held.get::<String>().unwrap(), "old");
        assert_eq!(ctx.get::<String>("k").unwrap(), "new");
    }

    #[test]
    fn test_key_validation() {
        let mut ctx = EventContext::new();
        assert_eq!(ctx.set("", 1).unwrap_err().code(), ErrorCode::InvalidParameter);

        let long = "k".repeat(257);
        assert_eq!(ctx.set(&long, 1).unwrap_err().code(), ErrorCode::KeyTooLong);

        let max = "k".repeat(256);
        assert!(ctx.set(&max, 1).is_ok());
    }

    #[test]
    fn test_entry_ceiling() {
        let mut ctx = EventContext::new();
        for i in 0..512 {
            ctx.set(&format!("key_{i}"), i).unwrap();
        }
        let err = ctx.set("key_512", 512).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CapacityExceeded);
        assert_eq!(ctx.count(), 512);

        // Replacing an existing key is still allowed at the ceiling.
        assert!(ctx.set("key_0", -1).is_ok());
    }

    #[test]
    fn test_memory_ceiling_rejects_before_mutation() {
        let limits = Limits::default().with_max_context_memory(base_memory(8) + 64);
        let mut ctx = EventContext::with_limits(limits);
        ctx.set("a", 1).unwrap();
        let before = ctx.memory_usage();

        let err = ctx.set(&"b".repeat(64), 2).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MemoryLimitExceeded);
        assert_eq!(ctx.count(), 1);
        assert_eq!(ctx.memory_usage(), before);
    }

    #[test]
    fn test_growth_doubles_and_accounts_slots() {
        let mut ctx = EventContext::new();
        assert_eq!(ctx.capacity(), 8);
        for i in 0..8 {
            ctx.set(&format!("k{i}"), i).unwrap();
        }
        let before = ctx.memory_usage();
        ctx.set("k8", 8).unwrap();
        assert_eq!(ctx.capacity(), 16);
        assert_eq!(
            ctx.memory_usage(),
            before + 8 * SLOT_BYTES + entry_cost("k8").unwrap()
        );
    }

    #[test]
    fn test_has_fast_and_constant_time() {
        let mut ctx = EventContext::new();
        ctx.set("api_token", "secret").unwrap();
        ctx.set("user", "alice").unwrap();

        for constant_time in [false, true] {
            assert!(ctx.has("api_token", constant_time));
            assert!(ctx.has("user", constant_time));
            assert!(!ctx.has("api_toke", constant_time));
            assert!(!ctx.has("api_token_", constant_time));
            assert!(!ctx.has("missing", constant_time));
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc", 256));
        assert!(!constant_time_eq(b"abc", b"abd", 256));
        assert!(!constant_time_eq(b"abc", b"abc\0", 256));
        assert!(!constant_time_eq(b"", b"a", 256));
    }

    #[test]
    fn test_remove_compacts_and_refunds_memory() {
        let mut ctx = EventContext::new();
        ctx.set("a", 1).unwrap();
        let after_a = ctx.memory_usage();
        ctx.set("bb", 2).unwrap();
        ctx.set("c", 3).unwrap();

        ctx.remove("bb").unwrap();
        assert_eq!(ctx.keys().collect::<Vec<_>>(), ["a", "c"]);
        assert_eq!(ctx.memory_usage(), after_a + entry_cost("c").unwrap());
        assert!(!ctx.has("bb", false));
    }

    #[test]
    fn test_second_remove_is_not_found_and_cleanup_runs_once() {
        let released = Rc::new(Cell::new(0));
        let seen = Rc::clone(&released);

        let mut ctx = EventContext::new();
        ctx.set_with_cleanup("k", (), move |_| seen.set(seen.get() + 1))
            .unwrap();
        ctx.remove("k").unwrap();
        assert_eq!(ctx.remove("k").unwrap_err().code(), ErrorCode::NotFound);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut ctx = EventContext::new();
        for i in 0..20 {
            ctx.set(&format!("k{i}"), i).unwrap();
        }
        let capacity = ctx.capacity();
        ctx.clear();
        assert_eq!(ctx.count(), 0);
        assert_eq!(ctx.capacity(), capacity);
        assert_eq!(ctx.memory_usage(), base_memory(capacity));
    }

    #[test]
    fn test_drop_releases_all_values() {
        let released = Rc::new(Cell::new(0));
        {
            let mut ctx = EventContext::new();
            for i in 0..3 {
                let seen = Rc::clone(&released);
                ctx.set_with_cleanup(&format!("k{i}"), i, move |_| seen.set(seen.get() + 1))
                    .unwrap();
            }
        }
        assert_eq!(released.get(), 3);
    }
}
