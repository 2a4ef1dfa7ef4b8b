use_prelude!();

use ::std::error::Error as StdError;

/// The error returned by the fallible operations of a [`Coroutine`] and of
/// its [`Co`] handle.
///
/// Cloning it is cheap and yields the _same_ error: a failed coroutine keeps
/// handing out one and the same `Error` (same payload, same stack snapshot),
/// which [`.same_as()`][`Error::same_as`] can tell apart from an equal-looking
/// one.
#[derive(Clone)]
pub
struct Error {
    repr: Arc<Repr>,
}

#[derive(Debug, ::thiserror::Error)]
enum Repr {
    #[error("coroutine canceled")]
    Canceled,

    #[error(transparent)]
    Failed(Failure),
}

/// The kind of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub
enum ErrorKind {
    /// The coroutine was canceled, or an escaped [`Co`] handle was used after
    /// its coroutine was done (or from outside of its body).
    Canceled,

    /// The body failed; see [`Error::failure`].
    Failed,
}

impl Error {
    /// A new cancellation, with its own identity.
    pub(in crate)
    fn canceled ()
      -> Error
    {
        Error { repr: Arc::new(Repr::Canceled) }
    }

    pub(in crate)
    fn failed (failure: Failure)
      -> Error
    {
        Error { repr: Arc::new(Repr::Failed(failure)) }
    }

    /// What went wrong.
    pub
    fn kind (self: &'_ Self)
      -> ErrorKind
    {
        match *self.repr {
            | Repr::Canceled => ErrorKind::Canceled,
            | Repr::Failed(_) => ErrorKind::Failed,
        }
    }

    /// Shorthand for `.kind() == ErrorKind::Canceled`.
    pub
    fn is_canceled (self: &'_ Self)
      -> bool
    {
        self.kind() == ErrorKind::Canceled
    }

    /// The captured failure of the body, unless this is a cancellation.
    pub
    fn failure (self: &'_ Self)
      -> Option<&'_ Failure>
    {
        match *self.repr {
            | Repr::Canceled => None,
            | Repr::Failed(ref failure) => Some(failure),
        }
    }

    /// Whether both are the very same error (not merely equal-looking ones).
    pub
    fn same_as (self: &'_ Self, other: &'_ Error)
      -> bool
    {
        Arc::ptr_eq(&self.repr, &other.repr)
    }

    /// See [`Failure::debug_string`].
    pub
    fn debug_string (self: &'_ Self)
      -> String
    {
        crate::failure::render_chain(self)
    }
}

impl fmt::Debug for Error {
    fn fmt (self: &'_ Self, f: &'_ mut fmt::Formatter<'_>)
      -> fmt::Result
    {
        fmt::Debug::fmt(&*self.repr, f)
    }
}

impl fmt::Display for Error {
    fn fmt (self: &'_ Self, f: &'_ mut fmt::Formatter<'_>)
      -> fmt::Result
    {
        fmt::Display::fmt(&*self.repr, f)
    }
}

impl StdError for Error {
    fn source (self: &'_ Self)
      -> Option<&'_ (dyn StdError + 'static)>
    {
        self.repr.source()
    }
}
