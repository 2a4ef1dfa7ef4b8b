use_prelude!();

use ::std::{
    sync::OnceLock,
    thread::ThreadId,
};

/// A two-way coroutine: [`.resume()`][`Coroutine::resume`]d with `In`s, it
/// yields `Out`s, until its body returns a final `Out` or fails.
///
/// The body does not run until the first `.resume()`.
///
/// # Example
///
/// ```rust
/// use ::resumable::prelude::*;
///
/// let mut running_sum = Coroutine::new(|co| {
///     let mut sum = 0;
///     loop {
///         match co.yield_(sum)? {
///             | Some(n) => sum += n,
///             | None => return Ok(sum),
///         }
///     }
/// });
///
/// assert_eq!(running_sum.resume(None)?, CoroutineState::Yielded(0));
/// assert_eq!(running_sum.resume(Some(4))?, CoroutineState::Yielded(4));
/// assert_eq!(running_sum.resume(Some(38))?, CoroutineState::Yielded(42));
/// assert_eq!(running_sum.resume(None)?, CoroutineState::Returned(42));
/// assert_eq!(running_sum.resume(None)?, CoroutineState::Complete);
/// # Ok::<(), ::resumable::Error>(())
/// ```
///
/// # Failures
///
/// When the body returns an `Err`, or panics (be it directly or from the
/// `Drop` glue of its locals), that failure is captured along with a stack
/// snapshot, and returned by the `.resume()` (or `.cancel()`) which was
/// driving the body at the time. Every later `.resume()` returns that very
/// same [`Error`] again.
///
/// # Cancellation
///
/// [`.cancel()`][`Coroutine::cancel`] makes the pending `yield_` / `suspend`
/// of the body return a canceled [`Error`], which the body is expected to
/// propagate with `?`, running its cleanup as it unwinds. Dropping a coroutine
/// which is not done cancels it.
///
/// Only that very [`Error`] counts as a clean unwind: returned as the body's
/// `Err`, or raised with [`panic_any`][`::std::panic::panic_any`]. Anything
/// else, such as the `String` panic of an `.unwrap()` on it, is a new failure,
/// which `.cancel()` then returns.
pub
struct Coroutine<In, Out> {
    shared: Arc<Shared<In, Out>>,
    context: Context,
}

/// The body's side of a [`Coroutine`]: its suspend points.
///
/// It can be cloned and kept around, but it only works from within the body
/// while the coroutine is running; otherwise every call fails with a
/// canceled [`Error`].
pub
struct Co<In, Out> {
    shared: Arc<Shared<In, Out>>,
}

/// Where a [`Coroutine`] stands, as seen from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub
enum Status {
    /// Never resumed.
    NotStarted,

    /// Parked at a `yield_` / `suspend` point.
    Suspended,

    /// The body returned.
    Completed,

    /// The body failed.
    Failed,

    /// Canceled (whether it had started or not).
    Canceled,
}

struct ControlBlock<In, Out> {
    input: Option<In>,
    output: Option<Out>,
    started: bool,
    done: bool,
    pending: Option<Error>,
}

struct BodyContext {
    thread: ThreadId,
    port: Port,
}

struct Shared<In, Out> {
    block: Mutex<ControlBlock<In, Out>>,
    body: OnceLock<BodyContext>,
    name: Option<String>,
    stack_capture: StackCapture,
}

impl<In, Out> Shared<In, Out> {
    fn name (self: &'_ Self)
      -> &'_ str
    {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    fn capture (self: &'_ Self, payload: Payload)
      -> Error
    {
        let failure = Failure::capture_with(payload, self.stack_capture);
        debug!(name = self.name(), failure = %failure, "coroutine failed");
        Error::failed(failure)
    }

    fn is_pending (self: &'_ Self, err: &'_ Error)
      -> bool
    {
        lock(&self.block)
            .pending
            .as_ref()
            .map_or(false, |pending| pending.same_as(err))
    }

    /// Records how the body ended.
    ///
    /// Failing with the very cancellation being requested is how a body
    /// unwinds cleanly; any other failure replaces it.
    fn settle (
        self: &'_ Self,
        outcome: thread::Result<Result<Out, BoxError>>,
    )
    {
        let payload = match outcome {
            | Ok(Ok(output)) => {
                trace!(name = self.name(), "coroutine returned");
                lock(&self.block).output = Some(output);
                return;
            },
            | Ok(Err(err)) => Payload::Error(err),
            | Err(panic) => Payload::from_panic(panic),
        };
        let unwound_cleanly =
            payload
                .as_error()
                .and_then(|err| err.downcast_ref::<Error>())
                .map_or(false, |err| self.is_pending(err))
        ;
        if unwound_cleanly {
            trace!(name = self.name(), "coroutine unwound after cancellation");
            return;
        }
        let failure = self.capture(payload);
        lock(&self.block).pending = Some(failure);
    }
}

/// The entry point of the body's context.
fn run<In, Out, F> (shared: Arc<Shared<In, Out>>, port: Port, body: F)
where
    F : FnOnce(Co<In, Out>) -> Result<Out, BoxError>,
{
    shared.body.get_or_init(|| BodyContext {
        thread: thread::current().id(),
        port,
    });
    ::unwind_safe::with_state(shared)
        .try_eval(|shared| {
            let co = Co { shared: Arc::clone(shared) };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(co)));
            shared.settle(outcome);
        })
        .finally(|shared| {
            {
                let mut block = lock(&shared.block);
                block.done = true;
                block.input = None;
            }
            let handed_back =
                shared.body
                    .get()
                    .map_or(Ok(()), |body| body.port.hand_back())
            ;
            if handed_back.is_err() {
                debug!(name = shared.name(), "coroutine's caller is gone");
            }
        })
}

impl<In, Out> Coroutine<In, Out>
where
    In : Send + 'static,
    Out : Send + 'static,
{
    /// Creates a coroutine running `body`, with the default [`Builder`]
    /// configuration.
    ///
    /// `body` does not run until the first [`.resume()`][`Self::resume`].
    pub
    fn new<F> (body: F)
      -> Coroutine<In, Out>
    where
        F : FnOnce(Co<In, Out>) -> Result<Out, BoxError> + Send + 'static,
    {
        Builder::new().build(body)
    }

    pub(in crate)
    fn with_builder<F> (builder: Builder, body: F)
      -> Coroutine<In, Out>
    where
        F : FnOnce(Co<In, Out>) -> Result<Out, BoxError> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            block: Mutex::new(ControlBlock {
                input: None,
                output: None,
                started: false,
                done: false,
                pending: None,
            }),
            body: OnceLock::new(),
            name: builder.name.clone(),
            stack_capture: builder.stack_capture,
        });
        let entry = {
            let shared = Arc::clone(&shared);
            Box::new(move |port: Port| run(shared, port, body))
        };
        Coroutine {
            context: Context::new(entry, &builder),
            shared,
        }
    }
}

impl<In, Out> Coroutine<In, Out> {
    /// Runs the body until its next suspend point (or its end), handing
    /// `input` to the `yield_` / `suspend` it is parked at.
    ///
    /// Once done, it returns [`CoroutineState::Complete`] without running
    /// anything, unless the coroutine failed or was canceled, in which case
    /// it keeps returning that same [`Error`].
    pub
    fn resume (self: &'_ mut Self, input: In)
      -> Result<CoroutineState<Out>, Error>
    {
        {
            let mut block = lock(&self.shared.block);
            if let Some(ref failure) = block.pending {
                return Err(failure.clone());
            }
            if block.done {
                return Ok(CoroutineState::Complete);
            }
            block.input = Some(input);
            block.started = true;
        }
        trace!(name = self.shared.name(), "resuming coroutine");
        self.switch_into();
        let (state, done) = {
            let mut block = lock(&self.shared.block);
            let state = match (block.pending.clone(), block.done) {
                | (Some(failure), _) => Err(failure),
                | (None, false) => Ok(match block.output.take() {
                    | Some(output) => CoroutineState::Yielded(output),
                    | None => CoroutineState::Suspended,
                }),
                | (None, true) => Ok(match block.output.take() {
                    | Some(output) => CoroutineState::Returned(output),
                    | None => CoroutineState::Complete,
                }),
            };
            (state, block.done)
        };
        if done {
            self.context.release();
        }
        state
    }

    /// Cancels the coroutine, letting the body unwind from its current
    /// suspend point.
    ///
    /// A coroutine which never started never runs at all. A done coroutine
    /// is left untouched, so this can be called any number of times.
    ///
    /// It fails only when the body's unwinding produced a new failure (say,
    /// some cleanup code panicked), which then replaces the cancellation as
    /// the coroutine's failure.
    pub
    fn cancel (self: &'_ mut Self)
      -> Result<(), Error>
    {
        let canceled = Error::canceled();
        let started = {
            let mut block = lock(&self.shared.block);
            if block.done {
                return Ok(());
            }
            block.pending = Some(canceled.clone());
            if block.started.not() {
                block.done = true;
            }
            block.started
        };
        if started {
            trace!(name = self.shared.name(), "canceling coroutine");
            self.switch_into();
        } else {
            trace!(name = self.shared.name(), "canceled unstarted coroutine");
        }
        self.context.release();
        match lock(&self.shared.block).pending {
            | Some(ref failure) if failure.same_as(&canceled).not() => {
                Err(failure.clone())
            },
            | _ => Ok(()),
        }
    }

    /// Whether the coroutine is done (returned, failed or canceled).
    pub
    fn is_done (self: &'_ Self)
      -> bool
    {
        lock(&self.shared.block).done
    }

    /// Where the coroutine stands.
    pub
    fn status (self: &'_ Self)
      -> Status
    {
        let block = lock(&self.shared.block);
        match (block.started, block.done, &block.pending) {
            | (_, _, &Some(ref failure)) if failure.is_canceled() => {
                Status::Canceled
            },
            | (_, _, &Some(_)) => Status::Failed,
            | (_, true, &None) => Status::Completed,
            | (false, false, &None) => Status::NotStarted,
            | (true, false, &None) => Status::Suspended,
        }
    }

    /// A failure to switch is a failure of the coroutine: it is done.
    fn switch_into (self: &'_ mut Self)
    {
        if let Err(err) = self.context.switch_into() {
            let failure = self.shared.capture(Payload::Error(Box::new(err)));
            let mut block = lock(&self.shared.block);
            block.done = true;
            block.pending = Some(failure);
        }
    }
}

impl<In, Out> Drop for Coroutine<In, Out> {
    fn drop (self: &'_ mut Self)
    {
        if let Err(err) = self.cancel() {
            warn!(
                name = self.shared.name(),
                error = %err,
                "coroutine failed while being canceled on drop"
            );
        }
    }
}

impl<In, Out> fmt::Debug for Coroutine<In, Out> {
    fn fmt (self: &'_ Self, f: &'_ mut fmt::Formatter<'_>)
      -> fmt::Result
    {
        f   .debug_struct("Coroutine")
            .field("name", &self.shared.name)
            .field("status", &self.status())
            .finish()
    }
}

impl<In, Out> Co<In, Out> {
    /// Hands `value` to the caller and parks until resumed, returning the
    /// input of that `.resume()`.
    ///
    /// Fails with a canceled [`Error`] when the coroutine is being canceled,
    /// in which case the body should unwind by propagating that `Error`
    /// (with `?`, or `panic_any(err)`); `.unwrap()`ping it fails the
    /// coroutine instead.
    pub
    fn yield_ (self: &'_ Self, value: Out)
      -> Result<In, Error>
    {
        self.park(Some(value))
    }

    /// Same as [`.yield_()`][`Co::yield_`], without handing out a value: the
    /// caller gets [`CoroutineState::Suspended`].
    pub
    fn suspend (self: &'_ Self)
      -> Result<In, Error>
    {
        self.park(None)
    }

    /// The input of the `.resume()` which started the body, which no
    /// `yield_` / `suspend` returns. `None` once taken, or once the body has
    /// been parked.
    pub
    fn take_first_input (self: &'_ Self)
      -> Option<In>
    {
        if self.on_body_context().is_none() {
            return None;
        }
        lock(&self.shared.block).input.take()
    }

    fn on_body_context (self: &'_ Self)
      -> Option<&'_ BodyContext>
    {
        self.shared.body
            .get()
            .filter(|body| body.thread == thread::current().id())
    }

    fn park (self: &'_ Self, output: Option<Out>)
      -> Result<In, Error>
    {
        let body = match self.on_body_context() {
            | Some(body) => body,
            | None => {
                trace!(name = self.shared.name(), "escaped `Co` used");
                return Err(Error::canceled());
            },
        };
        {
            let mut block = lock(&self.shared.block);
            if block.done {
                return Err(Error::canceled());
            }
            // A cancellation was swallowed: no parking again.
            if let Some(ref pending) = block.pending {
                return Err(pending.clone());
            }
            block.input = None;
            block.output = output;
        }
        trace!(name = self.shared.name(), "coroutine parked");
        if body.port.transfer().is_err() {
            return Err(Error::canceled());
        }
        let mut block = lock(&self.shared.block);
        if let Some(ref pending) = block.pending {
            return Err(pending.clone());
        }
        block.input.take().ok_or_else(Error::canceled)
    }
}

impl<In, Out> Clone for Co<In, Out> {
    fn clone (self: &'_ Self)
      -> Self
    {
        Co { shared: Arc::clone(&self.shared) }
    }
}

impl<In, Out> fmt::Debug for Co<In, Out> {
    fn fmt (self: &'_ Self, f: &'_ mut fmt::Formatter<'_>)
      -> fmt::Result
    {
        f   .debug_struct("Co")
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}
