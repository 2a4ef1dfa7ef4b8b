//! Two-way coroutines: a caller drives a body that can suspend itself
//! (optionally handing back a value), be resumed with a new input, and so on,
//! until it returns a final result or fails.
//!
//! ```rust
//! use ::resumable::prelude::*;
//!
//! let mut coroutine = Coroutine::<i32, &str>::new(|co| {
//!     let x = co.yield_("first")?;
//!     Ok(if x == 1 { "done" } else { "other" })
//! });
//!
//! assert_eq!(coroutine.resume(0)?, CoroutineState::Yielded("first"));
//! assert_eq!(coroutine.resume(1)?, CoroutineState::Returned("done"));
//! assert_eq!(coroutine.resume(2)?.into_pair(), ("", false));
//! # Ok::<(), ::resumable::Error>(())
//! ```
//!
//! Failures of the body (an `Err` return or a panic) are captured together
//! with a stack snapshot, and re-surfaced by every later call:
//!
//! ```rust
//! use ::resumable::prelude::*;
//!
//! let mut coroutine = Coroutine::<i32, ()>::new(|_| {
//!     Err("boom".into())
//! });
//!
//! let first = coroutine.resume(0).unwrap_err();
//! let second = coroutine.resume(1).unwrap_err();
//! assert_eq!(first.to_string(), "boom");
//! assert!(first.same_as(&second));
//! ```

#![warn(
    future_incompatible,
    rust_2018_compatibility,
    missing_docs,
    clippy::cargo,
    clippy::pedantic,
)]
#![deny(
    unused_must_use,
)]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(feature = "better-docs",
    feature(doc_cfg),
)]

#[path = "public_prelude.rs"]
pub
mod prelude;

#[macro_use]
mod utils;

pub use self::context::{Builder, ContextError, StackCapture};
mod context;

pub use self::coroutine::{Co, Coroutine, Status};
mod coroutine;

pub use self::error::{Error, ErrorKind};
mod error;

pub use self::failure::{Aggregate, BoxError, Failure, Payload};
mod failure;

pub use self::iter::{Iter, IterMut};
mod iter;

pub use self::state::CoroutineState;
mod state;

pub use ::resumable_proc_macros::coroutine_fn;

#[cfg(test)]
mod tests;
