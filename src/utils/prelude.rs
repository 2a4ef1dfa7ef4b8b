pub(in crate)
use {
    ::std::{
        any::Any,
        ops::Not as _,
        fmt,
        panic::{self, AssertUnwindSafe},
        sync::{
            Arc,
            Mutex,
            MutexGuard,
            PoisonError,
        },
        thread,
    },
    ::tracing::{
        debug,
        trace,
        warn,
    },
    crate::{
        context::{
            Builder,
            Context,
            Port,
            StackCapture,
        },
        coroutine::{
            Co,
            Coroutine,
        },
        error::Error,
        failure::{
            BoxError,
            Failure,
            Payload,
        },
        state::CoroutineState,
        utils::lock,
    },
};
