//! Callback Bridge
//!
//! Turns native per-entry callback invocations into calls of a Rust closure.
//!
//! ## Responsibilities
//! - Route the caller's closure through the engine as an opaque context pointer
//! - Convert raw `(pointer, length)` pairs into `View`s scoped to one invocation
//! - Translate the closure's continuation signal into the engine's 0 / nonzero
//! - Catch callback errors and panics at the `extern "C"` frame, stop the engine,
//!   and re-surface them once the native call has returned
//!
//! ## Flow
//! ```text
//!  Database::get_keys(f)
//!        │  ScanBridge { callback: f, failure: None }
//!        ▼
//!  kv_get_all(db, key_trampoline::<F, R>, &mut bridge)
//!        │
//!        ├──► key_trampoline(key, kb, _, _, arg) ──► f(View) ──► Continue → 0
//!        ├──► key_trampoline(...)                ──► f(View) ──► Err(e)   → stash, 1
//!        │
//!        ▼  status (STOPPED_BY_CB)
//!  bridge.finish(status) ──► Err(ScanError::Callback(e))
//! ```
//!
//! No unwind ever crosses the native frame: a panic is stashed and resumed
//! with `resume_unwind` after the engine call has returned.

use std::any::Any;
use std::convert::Infallible;
use std::ops::ControlFlow;
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::error::{KvError, ScanError};
use crate::ffi::{self, kv_get_kv_cb, kv_get_v_cb};
use crate::status::Status;
use crate::view::View;

/// Value returned to the engine to continue a scan
const CONTINUE: c_int = 0;

/// Value returned to the engine to stop a scan
const STOP: c_int = 1;

// =============================================================================
// Continuation Signal
// =============================================================================

/// What a scan callback wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Deliver the next entry
    Continue,

    /// End the scan without visiting further entries
    Stop,
}

/// Return types accepted from scan callbacks
///
/// Implemented for `Continuation`, `ControlFlow<()>`, `bool` (`true` means
/// continue), `()` (always continue), and `Result<C, E>` over any of those. An
/// `Err` stops the scan and is handed back to the caller as
/// `ScanError::Callback`.
pub trait IntoContinuation {
    /// Error the callback may return
    type Error;

    fn into_continuation(self) -> Result<Continuation, Self::Error>;
}

impl IntoContinuation for Continuation {
    type Error = Infallible;

    fn into_continuation(self) -> Result<Continuation, Infallible> {
        Ok(self)
    }
}

impl IntoContinuation for () {
    type Error = Infallible;

    fn into_continuation(self) -> Result<Continuation, Infallible> {
        Ok(Continuation::Continue)
    }
}

impl IntoContinuation for bool {
    type Error = Infallible;

    fn into_continuation(self) -> Result<Continuation, Infallible> {
        Ok(if self {
            Continuation::Continue
        } else {
            Continuation::Stop
        })
    }
}

impl IntoContinuation for ControlFlow<()> {
    type Error = Infallible;

    fn into_continuation(self) -> Result<Continuation, Infallible> {
        Ok(match self {
            ControlFlow::Continue(()) => Continuation::Continue,
            ControlFlow::Break(()) => Continuation::Stop,
        })
    }
}

impl<C, E> IntoContinuation for Result<C, E>
where
    C: IntoContinuation<Error = Infallible>,
{
    type Error = E;

    fn into_continuation(self) -> Result<Continuation, E> {
        match self {
            Ok(signal) => match signal.into_continuation() {
                Ok(continuation) => Ok(continuation),
                Err(never) => match never {},
            },
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Scan Outcome
// =============================================================================

/// How a scan ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every matching entry was delivered
    Completed,

    /// The callback asked to stop before the end
    StoppedByUser,
}

impl ScanOutcome {
    pub fn is_completed(self) -> bool {
        self == ScanOutcome::Completed
    }

    pub fn is_stopped(self) -> bool {
        self == ScanOutcome::StoppedByUser
    }

    /// The engine status this outcome was reported with
    pub fn status(self) -> Status {
        match self {
            ScanOutcome::Completed => Status::Ok,
            ScanOutcome::StoppedByUser => Status::StoppedByUser,
        }
    }
}

// =============================================================================
// Scan Bridge
// =============================================================================

/// What went wrong inside a callback
enum Failure<E> {
    Callback(E),
    Panic(Box<dyn Any + Send + 'static>),
}

/// Per-scan context handed to the engine as the opaque `arg` pointer
///
/// Lives on the stack of the scanning call; the engine only ever sees it as
/// `*mut c_void`.
pub(crate) struct ScanBridge<F, E> {
    callback: F,
    failure: Option<Failure<E>>,
    delivered: usize,
}

impl<F, E> ScanBridge<F, E> {
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            failure: None,
            delivered: 0,
        }
    }

    /// Run one callback invocation and produce the engine's return value
    fn dispatch(&mut self, call: impl FnOnce(&mut F) -> Result<Continuation, E>) -> c_int {
        // The engine should have stopped already; never re-enter after a failure.
        if self.failure.is_some() {
            return STOP;
        }
        self.delivered += 1;

        let callback = &mut self.callback;
        match panic::catch_unwind(AssertUnwindSafe(|| call(callback))) {
            Ok(Ok(Continuation::Continue)) => CONTINUE,
            Ok(Ok(Continuation::Stop)) => STOP,
            Ok(Err(e)) => {
                self.failure = Some(Failure::Callback(e));
                STOP
            }
            Err(payload) => {
                self.failure = Some(Failure::Panic(payload));
                STOP
            }
        }
    }

    /// Number of entries handed to the callback so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Resolve the scan once the native call has returned `code`
    ///
    /// A stashed panic is resumed here, on the caller's side of the boundary.
    pub fn finish(self, op: &'static str, code: c_int) -> Result<ScanOutcome, ScanError<E>> {
        let delivered = self.delivered;
        match self.failure {
            Some(Failure::Panic(payload)) => panic::resume_unwind(payload),
            Some(Failure::Callback(e)) => {
                debug!(op, delivered, "scan stopped by callback error");
                Err(ScanError::Callback(e))
            }
            None => match Status::from_raw(code) {
                Status::Ok => {
                    debug!(op, delivered, "scan completed");
                    Ok(ScanOutcome::Completed)
                }
                Status::StoppedByUser => {
                    debug!(op, delivered, "scan stopped by callback");
                    Ok(ScanOutcome::StoppedByUser)
                }
                _ => Err(ScanError::Engine(KvError::engine_failure(op, code))),
            },
        }
    }
}

/// Native trampoline for keys-only callbacks
///
/// The value pointer and length are never read.
pub(crate) unsafe extern "C" fn key_trampoline<F, R>(
    key: *const c_char,
    keybytes: usize,
    _value: *const c_char,
    _valuebytes: usize,
    arg: *mut c_void,
) -> c_int
where
    F: FnMut(View<'_>) -> R,
    R: IntoContinuation,
{
    let bridge = &mut *arg.cast::<ScanBridge<F, R::Error>>();
    let key = View::from_raw_parts(key, keybytes);
    bridge.dispatch(|callback| callback(key).into_continuation())
}

/// Native trampoline for key and value callbacks
pub(crate) unsafe extern "C" fn entry_trampoline<F, R>(
    key: *const c_char,
    keybytes: usize,
    value: *const c_char,
    valuebytes: usize,
    arg: *mut c_void,
) -> c_int
where
    F: FnMut(View<'_>, View<'_>) -> R,
    R: IntoContinuation,
{
    let bridge = &mut *arg.cast::<ScanBridge<F, R::Error>>();
    let key = View::from_raw_parts(key, keybytes);
    let value = View::from_raw_parts(value, valuebytes);
    bridge.dispatch(|callback| callback(key, value).into_continuation())
}

/// Drive a keys-only scan
///
/// `native` receives the trampoline and context pointer and performs the
/// engine call, returning its raw status.
pub(crate) fn drive_keys<F, R>(
    op: &'static str,
    callback: F,
    native: impl FnOnce(kv_get_kv_cb, *mut c_void) -> c_int,
) -> Result<ScanOutcome, ScanError<R::Error>>
where
    F: FnMut(View<'_>) -> R,
    R: IntoContinuation,
{
    let mut bridge = ScanBridge::<F, R::Error>::new(callback);
    let arg = (&mut bridge as *mut ScanBridge<F, R::Error>).cast::<c_void>();
    let code = native(key_trampoline::<F, R>, arg);
    bridge.finish(op, code)
}

/// Drive a key and value scan
pub(crate) fn drive_entries<F, R>(
    op: &'static str,
    callback: F,
    native: impl FnOnce(kv_get_kv_cb, *mut c_void) -> c_int,
) -> Result<ScanOutcome, ScanError<R::Error>>
where
    F: FnMut(View<'_>, View<'_>) -> R,
    R: IntoContinuation,
{
    let mut bridge = ScanBridge::<F, R::Error>::new(callback);
    let arg = (&mut bridge as *mut ScanBridge<F, R::Error>).cast::<c_void>();
    let code = native(entry_trampoline::<F, R>, arg);
    bridge.finish(op, code)
}

// =============================================================================
// Value Bridge
// =============================================================================

/// Context for a single-value `get`
pub(crate) struct ValueBridge<F, T> {
    callback: Option<F>,
    output: Option<T>,
    panic: Option<Box<dyn Any + Send + 'static>>,
}

unsafe extern "C" fn value_trampoline<F, T>(value: *const c_char, valuebytes: usize, arg: *mut c_void)
where
    F: FnOnce(View<'_>) -> T,
{
    let bridge = &mut *arg.cast::<ValueBridge<F, T>>();
    let Some(callback) = bridge.callback.take() else {
        return;
    };
    let value = View::from_raw_parts(value, valuebytes);
    match panic::catch_unwind(AssertUnwindSafe(|| callback(value))) {
        Ok(output) => bridge.output = Some(output),
        Err(payload) => bridge.panic = Some(payload),
    }
}

/// Drive a single-value lookup
///
/// Returns the raw status and the callback's result, if the engine delivered
/// a value. A panic inside `callback` is resumed after `native` returns.
pub(crate) fn drive_value<F, T>(callback: F, native: impl FnOnce(kv_get_v_cb, *mut c_void) -> c_int) -> (c_int, Option<T>)
where
    F: FnOnce(View<'_>) -> T,
{
    let mut bridge = ValueBridge {
        callback: Some(callback),
        output: None,
        panic: None,
    };
    let arg = (&mut bridge as *mut ValueBridge<F, T>).cast::<c_void>();
    let code = native(value_trampoline::<F, T>, arg);

    if let Some(payload) = bridge.panic {
        panic::resume_unwind(payload);
    }
    (code, bridge.output)
}
