//! The crate prelude: reexport the most essential utilities so that blob
//! `use`-ing them should enable the most straight-forward usage.

pub use {
    ::resumable_proc_macros::{
        coroutine_fn,
    },
    crate::{
        failure::BoxError,
        coroutine::{
            Co,
            Coroutine,
        },
        error::Error,
        state::CoroutineState,
    },
};
