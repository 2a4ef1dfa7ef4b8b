//! Diagnostic wrapping of a coroutine's failures.

use_prelude!();

use ::std::{
    backtrace::Backtrace,
    collections::HashSet,
    error::Error as StdError,
    fmt::Write as _,
};

/// The errors a coroutine body may fail with (anything `?` can convert).
pub
type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The raw failure wrapped by a [`Failure`].
#[derive(Debug)]
pub
enum Payload {
    /// The body returned (or panicked with) an error value.
    Error(BoxError),

    /// The body panicked.
    ///
    /// Holds the panic message, or `"Box<dyn Any>"` when the panic payload was
    /// neither a string nor an error, as the standard panic hook does.
    Panic(String),
}

impl Payload {
    /// Classifies the payload of a caught panic.
    pub
    fn from_panic (payload: Box<dyn Any + Send>)
      -> Payload
    {
        let payload = match payload.downcast::<BoxError>() {
            | Ok(err) => return Payload::Error(*err),
            | Err(payload) => payload,
        };
        let payload = match payload.downcast::<Error>() {
            | Ok(err) => return Payload::Error(err),
            | Err(payload) => payload,
        };
        let payload = match payload.downcast::<String>() {
            | Ok(msg) => return Payload::Panic(*msg),
            | Err(payload) => payload,
        };
        match payload.downcast_ref::<&'static str>() {
            | Some(&msg) => Payload::Panic(msg.to_owned()),
            | None => Payload::Panic("Box<dyn Any>".to_owned()),
        }
    }

    /// The payload as an error, if it is one.
    pub
    fn as_error (self: &'_ Self)
      -> Option<&'_ (dyn StdError + 'static)>
    {
        match *self {
            | Payload::Error(ref err) => Some(&**err),
            | Payload::Panic(_) => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt (self: &'_ Self, f: &'_ mut fmt::Formatter<'_>)
      -> fmt::Result
    {
        match *self {
            | Payload::Error(ref err) => fmt::Display::fmt(err, f),
            | Payload::Panic(ref msg) => f.write_str(msg),
        }
    }
}

/// A failure payload, together with a snapshot of the stack it was caught
/// on.
///
/// Its [`Display`][`fmt::Display`] only shows the payload;
/// [`.message_with_stack()`][`Failure::message_with_stack`] adds the stack,
/// and [`.debug_string()`][`Failure::debug_string`] walks the whole causal
/// chain.
#[derive(Debug)]
pub
struct Failure {
    payload: Payload,
    stack: String,
}

impl Failure {
    /// Wraps `payload`, capturing the current stack.
    pub
    fn capture (payload: Payload)
      -> Failure
    {
        Failure::capture_with(payload, StackCapture::Always)
    }

    pub(in crate)
    fn capture_with (payload: Payload, policy: StackCapture)
      -> Failure
    {
        let stack = match policy {
            | StackCapture::Always => Backtrace::force_capture(),
            | StackCapture::FromEnv => Backtrace::capture(),
        };
        Failure::from_parts(payload, stack.to_string())
    }

    /// Wraps `payload` with an already rendered stack.
    pub
    fn from_parts (payload: Payload, stack: impl Into<String>)
      -> Failure
    {
        Failure {
            payload,
            stack: stack.into(),
        }
    }

    /// The payload alone, rendered.
    pub
    fn message (self: &'_ Self)
      -> String
    {
        self.payload.to_string()
    }

    /// The payload followed by the captured stack.
    pub
    fn message_with_stack (self: &'_ Self)
      -> String
    {
        format!("{}\n\n{}", self.payload, self.stack)
    }

    /// The stack snapshot taken when this failure was captured.
    pub
    fn stack (self: &'_ Self)
      -> &'_ str
    {
        &self.stack
    }

    /// The raw failure.
    pub
    fn payload (self: &'_ Self)
      -> &'_ Payload
    {
        &self.payload
    }

    /// The underlying causes: the payload, when it is an error.
    pub
    fn causes (self: &'_ Self)
      -> Vec<&'_ (dyn StdError + 'static)>
    {
        self.payload.as_error().into_iter().collect()
    }

    /// Renders this failure and its full causal chain, depth-first.
    ///
    /// [`Failure`]s met along the way are rendered with their stack, other
    /// errors with their message. The members of an [`Aggregate`] are all
    /// visited. Every node is rendered at most once, so cyclic chains are
    /// fine.
    pub
    fn debug_string (self: &'_ Self)
      -> String
    {
        render_chain(self)
    }
}

impl fmt::Display for Failure {
    fn fmt (self: &'_ Self, f: &'_ mut fmt::Formatter<'_>)
      -> fmt::Result
    {
        fmt::Display::fmt(&self.payload, f)
    }
}

impl StdError for Failure {
    fn source (self: &'_ Self)
      -> Option<&'_ (dyn StdError + 'static)>
    {
        self.payload.as_error()
    }
}

/// Several errors reported as one, each of them a cause of the aggregate.
///
/// ```rust
/// use ::resumable::Aggregate;
///
/// let both = Aggregate::new("both sides failed", vec![
///     "left failed".into(),
///     "right failed".into(),
/// ]);
/// assert_eq!(both.errors().count(), 2);
/// ```
#[derive(Debug)]
pub
struct Aggregate {
    message: String,
    errors: Vec<BoxError>,
}

impl Aggregate {
    /// Groups `errors` under `message`.
    pub
    fn new (
        message: impl Into<String>,
        errors: impl IntoIterator<Item = BoxError>,
    ) -> Aggregate
    {
        Aggregate {
            message: message.into(),
            errors: errors.into_iter().collect(),
        }
    }

    /// The grouped errors.
    pub
    fn errors (self: &'_ Self)
      -> impl '_ + Iterator<Item = &'_ (dyn StdError + 'static)>
    {
        self.errors
            .iter()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

impl fmt::Display for Aggregate {
    fn fmt (self: &'_ Self, f: &'_ mut fmt::Formatter<'_>)
      -> fmt::Result
    {
        f.write_str(&self.message)
    }
}

impl StdError for Aggregate {
    /// Only the first error: `std`'s chain is linear.
    fn source (self: &'_ Self)
      -> Option<&'_ (dyn StdError + 'static)>
    {
        self.errors().next()
    }
}

/// `node` seen as a [`Failure`], looking through the engine's [`Error`].
fn as_failure<'e> (node: &'e (dyn StdError + 'static))
  -> Option<&'e Failure>
{
    node.downcast_ref::<Failure>()
        .or_else(|| node.downcast_ref::<Error>().and_then(Error::failure))
}

fn causes_of<'e> (node: &'e (dyn StdError + 'static))
  -> Vec<&'e (dyn StdError + 'static)>
{
    match node.downcast_ref::<Aggregate>() {
        | Some(aggregate) => aggregate.errors().collect(),
        | None => node.source().into_iter().collect(),
    }
}

/// The whole (address, vtable) pointer: a source held inline by its wrapper
/// shares the wrapper's address, but not its type.
///
/// An [`Error`] and the [`Failure`] it shares count as the same node.
fn identity (node: &'_ (dyn StdError + 'static))
  -> *const (dyn StdError + 'static)
{
    match as_failure(node) {
        | Some(failure) => failure as &(dyn StdError + 'static),
        | None => node,
    }
}

pub(in crate)
fn render_chain (root: &'_ (dyn StdError + 'static))
  -> String
{
    let mut out = String::new();
    let mut seen = HashSet::new();
    let mut to_visit = vec![root];
    while let Some(node) = to_visit.pop() {
        if seen.insert(identity(node)).not() {
            continue;
        }
        if out.is_empty().not() {
            out.push('\n');
        }
        match as_failure(node) {
            | Some(failure) => out.push_str(&failure.message_with_stack()),
            | None => {
                let _ = write!(out, "{}", node);
            },
        }
        // reversed, so that the first cause is rendered first.
        to_visit.extend(causes_of(node).into_iter().rev());
    }
    out
}
