// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Panic containment for test phases.
//!
//! Each phase of a test (setup, body, teardown) runs under
//! [`run_with_protection`], which distinguishes the intentional abort raised
//! by a failed assertion from a genuine fault. Aborts are swallowed, since
//! the assertion already recorded its failure; any other panic is converted
//! into a single failure record attributed to the panic site.

use crate::context::{FailureRecord, TestAbort, TestContext};
use crate::helpers::base_file_name;
use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::Once,
};

/// Location and stack information captured by the panic hook, keyed to the
/// panicking thread.
struct PanicSite {
    file_name: String,
    line_number: u32,
    backtrace: String,
}

thread_local! {
    static GUARD_DEPTH: Cell<u32> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static HOOK_INIT: Once = Once::new();

/// Installs the process-wide panic hook, chaining to whichever hook was
/// already present. The hook only intervenes while a protection guard is
/// active on the panicking thread, so panics elsewhere in the process keep
/// their normal behavior.
fn install_panic_hook() {
    HOOK_INIT.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.get() == 0 {
                previous(info);
                return;
            }

            // The abort sentinel carries no information worth capturing; the
            // failing assertion already recorded its own file and line.
            if info.payload().is::<TestAbort>() {
                return;
            }

            let (file_name, line_number) = match info.location() {
                Some(location) => (base_file_name(location.file()), location.line()),
                None => ("(unknown)".to_owned(), 0),
            };
            LAST_PANIC.with(|last| {
                *last.borrow_mut() = Some(PanicSite {
                    file_name,
                    line_number,
                    backtrace: Backtrace::force_capture().to_string(),
                });
            });
        }));
    });
}

/// Renders a panic payload the way `panic!` messages usually appear.
fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

/// Runs the supplied phase callback, catching panics (including assertion
/// aborts) and reporting them to the test as appropriate. Returns true if
/// the callback panicked.
pub(crate) fn run_with_protection<F>(cx: &TestContext, phase: F) -> bool
where
    F: FnOnce(&TestContext),
{
    install_panic_hook();

    GUARD_DEPTH.set(GUARD_DEPTH.get() + 1);
    LAST_PANIC.with(|last| last.borrow_mut().take());
    let result = panic::catch_unwind(AssertUnwindSafe(|| phase(cx)));
    GUARD_DEPTH.set(GUARD_DEPTH.get() - 1);

    let payload = match result {
        Ok(()) => return false,
        Err(payload) => payload,
    };

    // An intentional abort has already recorded the failure that caused it.
    if payload.is::<TestAbort>() {
        return true;
    }

    let site = LAST_PANIC.with(|last| last.borrow_mut().take());
    let (file_name, line_number, backtrace) = match site {
        Some(site) => (site.file_name, site.line_number, site.backtrace),
        None => ("(unknown)".to_owned(), 0, String::new()),
    };

    cx.add_failure_record(FailureRecord {
        file_name,
        line_number,
        generated_message: format!("panic: {}\n\n{}", payload_message(&*payload), backtrace),
        user_message: String::new(),
    });
    true
}
