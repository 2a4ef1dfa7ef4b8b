use_prelude!();

/// Iterating over a [`Coroutine`] which takes no input: every yielded value,
/// until it returns (that final value being discarded) or fails (the
/// [`Error`] being the last item).
///
/// `Suspended` slices produce no item.
///
/// ```rust
/// use ::resumable::prelude::*;
///
/// let countdown = Coroutine::new(|co| {
///     for n in (1 ..= 3).rev() {
///         co.yield_(n)?;
///     }
///     Ok(0)
/// });
/// assert_eq!(
///     countdown.into_iter().collect::<Result<Vec<_>, _>>()?,
///     [3, 2, 1],
/// );
/// # Ok::<(), ::resumable::Error>(())
/// ```
pub
struct Iter<Out> {
    coroutine: Coroutine<(), Out>,
    finished: bool,
}

/// Same as [`Iter`], borrowing the [`Coroutine`].
pub
struct IterMut<'coroutine, Out> {
    coroutine: &'coroutine mut Coroutine<(), Out>,
    finished: bool,
}

fn advance<Out> (
    coroutine: &'_ mut Coroutine<(), Out>,
    finished: &'_ mut bool,
) -> Option<Result<Out, Error>>
{
    while !*finished {
        match coroutine.resume(()) {
            | Ok(CoroutineState::Yielded(output)) => return Some(Ok(output)),
            | Ok(CoroutineState::Suspended) => continue,
            | Ok(CoroutineState::Returned(_) | CoroutineState::Complete) => {
                *finished = true;
            },
            | Err(err) => {
                *finished = true;
                return Some(Err(err));
            },
        }
    }
    None
}

impl<Out> Iterator for Iter<Out> {
    type Item = Result<Out, Error>;

    fn next (self: &'_ mut Self)
      -> Option<Self::Item>
    {
        advance(&mut self.coroutine, &mut self.finished)
    }
}

impl<Out> Iterator for IterMut<'_, Out> {
    type Item = Result<Out, Error>;

    fn next (self: &'_ mut Self)
      -> Option<Self::Item>
    {
        advance(self.coroutine, &mut self.finished)
    }
}

impl<Out> IntoIterator for Coroutine<(), Out> {
    type IntoIter = Iter<Out>;
    type Item = Result<Out, Error>;

    #[inline]
    fn into_iter (self: Self)
      -> Iter<Out>
    {
        Iter { coroutine: self, finished: false }
    }
}

impl<'coroutine, Out> IntoIterator for &'coroutine mut Coroutine<(), Out> {
    type IntoIter = IterMut<'coroutine, Out>;
    type Item = Result<Out, Error>;

    #[inline]
    fn into_iter (self: Self)
      -> IterMut<'coroutine, Out>
    {
        IterMut { coroutine: self, finished: false }
    }
}
