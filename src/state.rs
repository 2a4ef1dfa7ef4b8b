/// What a [`.resume()`][`crate::Coroutine::resume`] call ran into.
///
/// This corresponds to:
///
///   - either a suspension point: [`Yielded`][`CoroutineState::Yielded`] or
///     [`Suspended`][`CoroutineState::Suspended`], after which the coroutine
///     can be resumed again;
///
///   - or a termination point: [`Returned`][`CoroutineState::Returned`] the
///     first time, [`Complete`][`CoroutineState::Complete`] ever after.
#[derive(
    Debug,
    Clone, Copy,
    PartialOrd, Ord,
    PartialEq, Eq,
    Hash
)]
pub
enum CoroutineState<Out> {
    /// The body reached a `yield_` with this value.
    Yielded(Out),

    /// The body reached a `suspend`, handing out no value.
    Suspended,

    /// The body returned this value.
    Returned(Out),

    /// The coroutine was already done: nothing ran.
    Complete,
}

impl<Out> CoroutineState<Out> {
    /// Whether the coroutine can be resumed again.
    pub
    fn is_running (self: &'_ Self)
      -> bool
    {
        matches!(
            *self,
            CoroutineState::Yielded(_) | CoroutineState::Suspended
        )
    }

    /// The produced value, if any.
    pub
    fn into_output (self: Self)
      -> Option<Out>
    {
        match self {
            | CoroutineState::Yielded(output)
            | CoroutineState::Returned(output)
            => Some(output),
            | CoroutineState::Suspended
            | CoroutineState::Complete
            => None,
        }
    }

    /// `(output, still_running)`.
    pub
    fn into_parts (self: Self)
      -> (Option<Out>, bool)
    {
        let running = self.is_running();
        (self.into_output(), running)
    }
}

impl<Out : Default> CoroutineState<Out> {
    /// `(output, still_running)`, with `Out::default()` standing for the
    /// absence of output.
    ///
    /// ```rust
    /// use ::resumable::CoroutineState;
    ///
    /// assert_eq!(CoroutineState::Yielded("first").into_pair(), ("first", true));
    /// assert_eq!(CoroutineState::<&str>::Suspended.into_pair(), ("", true));
    /// assert_eq!(CoroutineState::Returned("done").into_pair(), ("done", false));
    /// assert_eq!(CoroutineState::<&str>::Complete.into_pair(), ("", false));
    /// ```
    pub
    fn into_pair (self: Self)
      -> (Out, bool)
    {
        let (output, running) = self.into_parts();
        (output.unwrap_or_default(), running)
    }
}
