#![allow(dead_code)]

use catena::{ChainableEvent, EventContext, EventError, EventResult};
use std::sync::{Arc, Mutex};

// ============================================================================
// Arithmetic Events
// ============================================================================

pub const VALUE_KEY: &str = "value";

fn apply(ctx: &mut EventContext, op: impl Fn(i64) -> Option<i64>) -> EventResult {
    let current = *ctx.get::<i64>(VALUE_KEY)?;
    let next = op(current).ok_or_else(|| EventError::failed("arithmetic overflow"))?;
    ctx.set(VALUE_KEY, next)?;
    Ok(())
}

pub fn add(n: i64) -> ChainableEvent {
    ChainableEvent::from_fn(format!("Add{n}"), move |ctx| apply(ctx, |v| v.checked_add(n)))
}

pub fn multiply(n: i64) -> ChainableEvent {
    ChainableEvent::from_fn(format!("Multiply{n}"), move |ctx| apply(ctx, |v| v.checked_mul(n)))
}

pub fn subtract(n: i64) -> ChainableEvent {
    ChainableEvent::from_fn(format!("Subtract{n}"), move |ctx| apply(ctx, |v| v.checked_sub(n)))
}

// ============================================================================
// Order Recording
// ============================================================================

pub type OrderLog = Arc<Mutex<Vec<String>>>;

pub fn order_log() -> OrderLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// An event that appends its name to `log` and optionally fails.
pub fn logged_event(name: &str, log: &OrderLog, fail: bool) -> ChainableEvent {
    let log = Arc::clone(log);
    let label = name.to_string();
    ChainableEvent::from_fn(name.to_string(), move |_ctx| {
        log.lock().unwrap().push(label.clone());
        if fail {
            Err(EventError::failed(format!("{label} failed")))
        } else {
            Ok(())
        }
    })
}

pub fn entries(log: &OrderLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
