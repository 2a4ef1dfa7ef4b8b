use ::resumable::prelude::*;

mod docs {
    macro_rules! test_include {(
        $($ident:ident),* $(,)?
    ) => (
        $(
            mod $ident {
                #[test] fn test () { main() }
                include! {
                    concat!(
                        "../src/doc_examples/",
                        stringify!($ident),
                        ".rs",
                    )
                }
            }

        )*
    )}
    test_include! {
        countdown,
        countdown_desugared,
    }
}

#[test]
fn two_way ()
{
    #[coroutine_fn(yield(i64), resume(i64))]
    fn accumulator (start: i64)
      -> Result<i64, BoxError>
    {
        let mut total = start;
        loop {
            let input = yield_!(total)?;
            if input == 0 {
                return Ok(total);
            }
            total += input;
        }
    }

    let mut acc = accumulator(10);
    assert_eq!(acc.resume(0).unwrap(), CoroutineState::Yielded(10));
    assert_eq!(acc.resume(5).unwrap(), CoroutineState::Yielded(15));
    assert_eq!(acc.resume(-20).unwrap(), CoroutineState::Yielded(-5));
    assert_eq!(acc.resume(0).unwrap(), CoroutineState::Returned(-5));
}

#[test]
fn shorthand_and_suspend ()
{
    #[coroutine_fn(String)]
    fn greeter (names: Vec<&'static str>)
      -> Result<String, BoxError>
    {
        for name in names {
            suspend_!()?;
            yield_!(format!("Hello, {}!", name))?;
        }
        Ok("Bye!".into())
    }

    let greetings: Vec<String> =
        greeter(vec!["Alice", "Bob"])
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap()
    ;
    assert_eq!(greetings, ["Hello, Alice!", "Hello, Bob!"]);
}

#[test]
fn failures_propagate ()
{
    #[coroutine_fn(yield(u8))]
    fn fallible (input: &'static str)
      -> Result<u8, BoxError>
    {
        yield_!(1)?;
        let parsed: u8 = input.parse()?;
        Ok(parsed)
    }

    let mut coroutine = fallible("not a number");
    assert_eq!(coroutine.resume(()).unwrap(), CoroutineState::Yielded(1));
    let err = coroutine.resume(()).unwrap_err();
    assert_eq!(err.to_string(), "invalid digit found in string");
    assert!(err.debug_string().starts_with("invalid digit found in string\n\n"));
    assert!(coroutine.resume(()).unwrap_err().same_as(&err));
}

#[test]
fn dropped_unfinished ()
{
    use ::std::sync::{atomic::{AtomicBool, Ordering::SeqCst}, Arc};

    #[coroutine_fn(yield(()))]
    fn forever (unwound: Arc<AtomicBool>)
      -> Result<(), BoxError>
    {
        loop {
            if let Err(err) = yield_!(()) {
                unwound.store(err.is_canceled(), SeqCst);
                return Err(err.into());
            }
        }
    }

    let unwound = Arc::new(AtomicBool::new(false));
    let mut coroutine = forever(Arc::clone(&unwound));
    coroutine.resume(()).unwrap();
    coroutine.resume(()).unwrap();
    drop(coroutine);
    assert!(unwound.load(SeqCst));
}
