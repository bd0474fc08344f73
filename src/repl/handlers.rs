//! Scoped error and shutdown handlers
//!
//! Handlers live on a thread-local stack. [`install`] pushes a frame and
//! returns a [`HandlerGuard`]; dropping the guard removes that frame again,
//! so a finished session leaves the previous handlers (if any) in charge.
//! Reports always go to the innermost frame.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{trace, warn};

use super::backend_trait::{FatalError, E_ERROR, E_NOTICE, E_WARNING};

/// How serious a reported error is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Notice,
    Warning,
    /// The statement was abandoned
    Error,
}

impl Severity {
    /// Numeric error level
    pub fn code(self) -> u32 {
        match self {
            Severity::Notice => E_NOTICE,
            Severity::Warning => E_WARNING,
            Severity::Error => E_ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Severity::Notice => write!(f, "Notice"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
        }
    }
}

/// Receives transient errors: `(severity, message)`
pub type ErrorHandler = Box<dyn FnMut(Severity, &str)>;

/// Receives fatal errors
pub type ShutdownHandler = Box<dyn FnMut(&FatalError)>;

/// Default transient policy: print the message and carry on
pub fn default_error_handler() -> ErrorHandler {
    Box::new(|_severity, message| println!("{}", message))
}

/// Default fatal policy: print the error level and message
pub fn default_shutdown_handler() -> ShutdownHandler {
    Box::new(|error| println!("Fatal error [{}]: {}", error.code, error.message))
}

struct HandlerFrame {
    id: u64,
    error: Rc<RefCell<ErrorHandler>>,
    shutdown: Rc<RefCell<ShutdownHandler>>,
}

thread_local! {
    static HANDLERS: RefCell<Vec<HandlerFrame>> = const { RefCell::new(Vec::new()) };
    static NEXT_FRAME_ID: Cell<u64> = const { Cell::new(0) };
}

/// Keeps a handler frame installed; dropping it uninstalls the frame
#[must_use = "handlers are uninstalled as soon as the guard is dropped"]
pub struct HandlerGuard {
    id: u64,
    // Frames are thread-local
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for HandlerGuard {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("HandlerGuard").field("id", &self.id).finish()
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        let id = self.id;
        let _ = HANDLERS.try_with(|frames| {
            if let Ok(mut frames) = frames.try_borrow_mut() {
                frames.retain(|frame| frame.id != id);
            }
        });
        trace!("handler frame {} uninstalled", id);
    }
}

/// Install handlers for the lifetime of the returned guard
pub fn install(
    error: ErrorHandler,
    shutdown: ShutdownHandler,
) -> HandlerGuard {
    let id = NEXT_FRAME_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    HANDLERS.with(|frames| {
        frames.borrow_mut().push(HandlerFrame {
            id,
            error: Rc::new(RefCell::new(error)),
            shutdown: Rc::new(RefCell::new(shutdown)),
        })
    });
    trace!("handler frame {} installed", id);
    HandlerGuard {
        id,
        _not_send: PhantomData,
    }
}

/// Number of installed frames on this thread
pub fn depth() -> usize {
    HANDLERS.with(|frames| frames.borrow().len())
}

/// Send a transient error to the innermost error handler
pub fn report_error(
    severity: Severity,
    message: &str,
) {
    let handler = HANDLERS.with(|frames| frames.borrow().last().map(|frame| Rc::clone(&frame.error)));
    match handler {
        Some(handler) => match handler.try_borrow_mut() {
            Ok(mut handler) => (*handler)(severity, message),
            // The handler itself raised an error
            Err(_) => warn!("{}: {}", severity, message),
        },
        None => (default_error_handler())(severity, message),
    }
}

/// Send a fatal error to the innermost shutdown handler
pub fn report_fatal(error: &FatalError) {
    let handler =
        HANDLERS.with(|frames| frames.borrow().last().map(|frame| Rc::clone(&frame.shutdown)));
    match handler {
        Some(handler) => match handler.try_borrow_mut() {
            Ok(mut handler) => (*handler)(error),
            Err(_) => warn!("fatal: {}", error),
        },
        None => (default_shutdown_handler())(error),
    }
}
