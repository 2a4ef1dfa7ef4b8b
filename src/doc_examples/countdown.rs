fn main ()
{
    use ::resumable::prelude::*;

    #[coroutine_fn(yield(u8))]
    fn countdown (count: u8, last: u8)
      -> Result<u8, BoxError>
    {
        let mut current = count;
        while let Some(next) = current.checked_sub(1) {
            yield_!(current)?;
            current = next;
        }
        Ok(last)
    }

    let mut coroutine = countdown(3, 0);
    let mut next = || coroutine.resume(()).unwrap();
    assert_eq!(next(), CoroutineState::Yielded(3));
    assert_eq!(next(), CoroutineState::Yielded(2));
    assert_eq!(next(), CoroutineState::Yielded(1));
    assert_eq!(next(), CoroutineState::Returned(0));
    assert_eq!(next(), CoroutineState::Complete);
}
