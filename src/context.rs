//! The execution contexts a coroutine switches between.
//!
//! The body runs on a dedicated thread which only ever runs while holding the
//! (single) baton; handing the baton over and waiting for it to come back is
//! what a "switch" is. There is thus always exactly one side running.

use_prelude!();

use ::std::{
    io,
    mem,
    sync::mpsc::{self, Receiver, SyncSender},
    thread::JoinHandle,
};

/// A failure of the context machinery itself, rather than of the body.
///
/// It reaches the caller as the payload of the coroutine's [`Failure`].
#[derive(Debug, ::thiserror::Error)]
pub
enum ContextError {
    /// The thread hosting the body could not be spawned.
    #[error("failed to spawn the coroutine's context")]
    Spawn(#[source] io::Error),

    /// The other side went away without handing control back.
    #[error("the coroutine's context disconnected")]
    Disconnected,
}

/// One end of the baton-passing channel pair.
pub(in crate)
struct Port {
    tx: SyncSender<()>,
    rx: Mutex<Receiver<()>>,
}

impl Port {
    /// `(caller side, body side)`.
    pub(in crate)
    fn pair ()
      -> (Port, Port)
    {
        let (to_body, from_caller) = mpsc::sync_channel(1);
        let (to_caller, from_body) = mpsc::sync_channel(1);
        (
            Port { tx: to_body, rx: Mutex::new(from_body) },
            Port { tx: to_caller, rx: Mutex::new(from_caller) },
        )
    }

    pub(in crate)
    fn hand_back (self: &'_ Self)
      -> Result<(), ContextError>
    {
        self.tx
            .send(())
            .map_err(|_| ContextError::Disconnected)
    }

    pub(in crate)
    fn wait (self: &'_ Self)
      -> Result<(), ContextError>
    {
        lock(&self.rx)
            .recv()
            .map_err(|_| ContextError::Disconnected)
    }

    /// Hands the baton over, and blocks until it comes back.
    pub(in crate)
    fn transfer (self: &'_ Self)
      -> Result<(), ContextError>
    {
        self.hand_back()?;
        self.wait()
    }
}

type Entry = Box<dyn FnOnce(Port) + Send + 'static>;

enum State {
    Unstarted(Entry),
    Started {
        port: Port,
        thread: JoinHandle<()>,
    },
    Released,
}

/// The caller's handle to the body's execution context.
pub(in crate)
struct Context {
    name: Option<String>,
    stack_size: Option<usize>,
    state: State,
}

impl Context {
    /// The `entry` does not run until the first [`Context::switch_into`].
    pub(in crate)
    fn new (entry: Entry, builder: &'_ Builder)
      -> Context
    {
        Context {
            name: builder.name.clone(),
            stack_size: builder.stack_size,
            state: State::Unstarted(entry),
        }
    }

    /// Transfers control into the body, returning once it hands it back.
    pub(in crate)
    fn switch_into (self: &'_ mut Self)
      -> Result<(), ContextError>
    {
        match mem::replace(&mut self.state, State::Released) {
            | State::Unstarted(entry) => self.start(entry)?,
            | started => {
                self.state = started;
                self.port()?.hand_back()?;
            },
        }
        self.port()?.wait()
    }

    /// The new thread holds the baton from the get-go.
    fn start (self: &'_ mut Self, entry: Entry)
      -> Result<(), ContextError>
    {
        let (port, body_port) = Port::pair();
        let mut builder = thread::Builder::new();
        if let Some(ref name) = self.name {
            builder = builder.name(name.clone());
        }
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }
        let thread =
            builder
                .spawn(move || entry(body_port))
                .map_err(ContextError::Spawn)?
        ;
        debug!(name = ?self.name, "started coroutine context");
        self.state = State::Started { port, thread };
        Ok(())
    }

    fn port (self: &'_ Self)
      -> Result<&'_ Port, ContextError>
    {
        match self.state {
            | State::Started { ref port, .. } => Ok(port),
            | _ => Err(ContextError::Disconnected),
        }
    }

    /// Frees the context: drops a never started entry, or joins the body's
    /// thread.
    ///
    /// A body still parked at a suspend point sees the disconnection as a
    /// cancellation and unwinds before the join completes.
    pub(in crate)
    fn release (self: &'_ mut Self)
    {
        match mem::replace(&mut self.state, State::Released) {
            | State::Unstarted(entry) => drop(entry),
            | State::Started { port, thread } => {
                drop(port);
                if thread.join().is_err() {
                    warn!(name = ?self.name, "coroutine context panicked");
                }
                debug!(name = ?self.name, "released coroutine context");
            },
            | State::Released => {},
        }
    }
}

/// How the stack snapshot of a [`Failure`] is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub
enum StackCapture {
    /// Always capture it.
    #[default]
    Always,

    /// Only when `RUST_LIB_BACKTRACE` / `RUST_BACKTRACE` ask for it, as
    /// [`Backtrace::capture`][`::std::backtrace::Backtrace::capture`] does.
    FromEnv,
}

/// Configuration for a [`Coroutine`], in the manner of
/// [`thread::Builder`][`::std::thread::Builder`].
///
/// ```rust
/// use ::resumable::{Builder, CoroutineState, StackCapture};
///
/// let mut coroutine =
///     Builder::new()
///         .name("ticker")
///         .stack_size(64 * 1024)
///         .stack_capture(StackCapture::FromEnv)
///         .build(|co| {
///             let () = co.yield_(1)?;
///             Ok(2)
///         })
/// ;
/// assert_eq!(coroutine.resume(()).unwrap(), CoroutineState::Yielded(1));
/// assert_eq!(coroutine.resume(()).unwrap(), CoroutineState::Returned(2));
/// ```
#[derive(Debug, Clone, Default)]
pub
struct Builder {
    pub(in crate) name: Option<String>,
    pub(in crate) stack_size: Option<usize>,
    pub(in crate) stack_capture: StackCapture,
}

impl Builder {
    /// The default configuration.
    pub
    fn new ()
      -> Builder
    {
        Builder::default()
    }

    /// Names the coroutine: its context's thread, and its log events.
    #[must_use]
    pub
    fn name (mut self: Self, name: impl Into<String>)
      -> Builder
    {
        self.name = Some(name.into());
        self
    }

    /// The stack size of the body's context, in bytes.
    #[must_use]
    pub
    fn stack_size (mut self: Self, size: usize)
      -> Builder
    {
        self.stack_size = Some(size);
        self
    }

    /// When to capture the stack of the body's failures.
    #[must_use]
    pub
    fn stack_capture (mut self: Self, policy: StackCapture)
      -> Builder
    {
        self.stack_capture = policy;
        self
    }

    /// Creates the (not yet started) coroutine.
    pub
    fn build<In, Out, F> (self: Self, body: F)
      -> Coroutine<In, Out>
    where
        In : Send + 'static,
        Out : Send + 'static,
        F : FnOnce(Co<In, Out>) -> Result<Out, BoxError> + Send + 'static,
    {
        Coroutine::with_builder(self, body)
    }
}
