#![allow(unused_imports)]
use {
    ::pretty_assertions::assert_eq,
    ::core::ops::Not as _,
    ::std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst},
            Arc,
            Mutex,
        },
        thread,
    },
    crate::{
        prelude::*,
        Builder,
        ErrorKind,
        Status,
    },
};

fn init_logging ()
{
    let _ = ::tracing_subscriber::fmt()
        .with_env_filter(
            ::tracing_subscriber::EnvFilter::from_default_env()
        )
        .with_test_writer()
        .try_init()
    ;
}

/// Runs its closure when dropped, like a `defer` would.
struct OnDrop<F : FnMut()> (F);

impl<F : FnMut()> Drop for OnDrop<F> {
    fn drop (self: &'_ mut Self)
    {
        (self.0)()
    }
}

fn flag ()
  -> Arc<AtomicBool>
{
    Arc::new(AtomicBool::new(false))
}

#[test]
fn yield_round_trip ()
{
    init_logging();
    let mut coroutine = Coroutine::<i32, &str>::new(|co| {
        let input = co.yield_("first")?;
        assert_eq!(input, 1);
        let input = co.yield_("second")?;
        assert_eq!(input, 2);
        Ok("done")
    });

    assert_eq!(coroutine.resume(0).unwrap(), CoroutineState::Yielded("first"));
    assert_eq!(coroutine.resume(1).unwrap(), CoroutineState::Yielded("second"));
    assert_eq!(coroutine.resume(2).unwrap(), CoroutineState::Returned("done"));
    assert_eq!(coroutine.resume(3).unwrap(), CoroutineState::Complete);
    assert_eq!(coroutine.resume(4).unwrap().into_pair(), ("", false));
}

#[test]
fn single_yield_then_return ()
{
    let mut coroutine = Coroutine::<i32, &str>::new(|co| {
        let x = co.yield_("first")?;
        Ok(if x == 1 { "done" } else { "unexpected" })
    });

    assert_eq!(coroutine.resume(0).unwrap().into_pair(), ("first", true));
    assert_eq!(coroutine.resume(1).unwrap().into_pair(), ("done", false));
    assert_eq!(coroutine.resume(2).unwrap().into_pair(), ("", false));
}

#[test]
fn inputs_reach_the_pending_yield ()
{
    let mut coroutine = Coroutine::<i64, i64>::new(|co| {
        let mut last = 0;
        loop {
            let input = co.yield_(last)?;
            if input < 0 {
                return Ok(-1);
            }
            last = 2 * input;
        }
    });

    // nothing observes the input which starts the body.
    assert_eq!(coroutine.resume(100).unwrap(), CoroutineState::Yielded(0));
    for i in 1 .. 20 {
        assert_eq!(coroutine.resume(i).unwrap(), CoroutineState::Yielded(2 * i));
    }
    assert_eq!(coroutine.resume(-5).unwrap(), CoroutineState::Returned(-1));
}

#[test]
fn first_input ()
{
    let mut coroutine = Coroutine::<i32, i32>::new(|co| {
        let first = co.take_first_input();
        assert_eq!(co.take_first_input(), None);
        let second = co.yield_(first.unwrap_or(-1))?;
        assert_eq!(co.take_first_input(), None);
        Ok(second)
    });

    assert_eq!(coroutine.resume(7).unwrap(), CoroutineState::Yielded(7));
    assert_eq!(coroutine.resume(8).unwrap(), CoroutineState::Returned(8));
}

#[test]
fn suspend ()
{
    let mut coroutine = Coroutine::<i32, &str>::new(|co| {
        let input = co.suspend()?;
        Ok(if input == 1 { "one" } else { "other" })
    });

    assert_eq!(coroutine.resume(0).unwrap(), CoroutineState::Suspended);
    assert!(coroutine.is_done().not());
    assert_eq!(coroutine.resume(1).unwrap(), CoroutineState::Returned("one"));
}

#[test]
fn suspend_then_yield ()
{
    let mut coroutine = Coroutine::<i32, &str>::new(|co| {
        let input = co.suspend()?;
        assert_eq!(input, 1);
        let input = co.yield_("yielded")?;
        assert_eq!(input, 2);
        Ok("done")
    });

    assert_eq!(coroutine.resume(0).unwrap().into_pair(), ("", true));
    assert_eq!(coroutine.resume(1).unwrap().into_pair(), ("yielded", true));
    assert_eq!(coroutine.resume(2).unwrap().into_pair(), ("done", false));
    assert_eq!(coroutine.resume(3).unwrap().into_pair(), ("", false));
}

mod failures {
    use {super::*, ::pretty_assertions::assert_eq};

    #[test]
    fn panic_on_first_slice ()
    {
        init_logging();
        let mut coroutine = Coroutine::<i32, &str>::new(|_| {
            panic!("test panic");
        });

        let first = coroutine.resume(0).unwrap_err();
        assert_eq!(first.kind(), ErrorKind::Failed);
        assert_eq!(first.to_string(), "test panic");
        assert!(first.failure().unwrap().stack().is_empty().not());

        let second = coroutine.resume(1).unwrap_err();
        assert_eq!(second.to_string(), "test panic");
        assert!(second.same_as(&first));

        assert_eq!(coroutine.status(), Status::Failed);
        coroutine.cancel().unwrap();
        assert!(coroutine.resume(2).unwrap_err().same_as(&first));
    }

    #[test]
    fn returned_error ()
    {
        let mut coroutine = Coroutine::<i32, &str>::new(|_| {
            Err("boom".into())
        });

        let first = coroutine.resume(0).unwrap_err();
        assert_eq!(first.to_string(), "boom");
        let second = coroutine.resume(1).unwrap_err();
        assert_eq!(second.to_string(), "boom");
        assert!(second.same_as(&first));
        assert_eq!(
            first.failure().unwrap().causes()[0].to_string(),
            "boom",
        );
    }

    #[test]
    fn panic_after_yield ()
    {
        let cleaned_up = flag();
        let mut coroutine = Coroutine::<i32, &str>::new({
            let cleaned_up = Arc::clone(&cleaned_up);
            move |co| {
                let _guard = OnDrop(move || cleaned_up.store(true, SeqCst));
                co.yield_("first yield")?;
                panic!("panic after yield");
            }
        });

        assert_eq!(
            coroutine.resume(0).unwrap(),
            CoroutineState::Yielded("first yield"),
        );
        assert!(cleaned_up.load(SeqCst).not());
        let err = coroutine.resume(0).unwrap_err();
        assert_eq!(err.to_string(), "panic after yield");
        assert!(cleaned_up.load(SeqCst));
        assert!(coroutine.is_done());
    }

    #[test]
    fn panicking_with_an_error_value ()
    {
        let mut coroutine = Coroutine::<(), ()>::new(|_| {
            ::std::panic::panic_any(BoxError::from("typed panic"));
        });

        let err = coroutine.resume(()).unwrap_err();
        assert_eq!(err.to_string(), "typed panic");
        assert!(err.failure().unwrap().payload().as_error().is_some());
    }

    #[test]
    fn nested_failures_render_both_stacks ()
    {
        let mut outer = Coroutine::<i32, &str>::new(|_| {
            let mut inner = Coroutine::<i32, &str>::new(|_| {
                panic!("test panic");
            });
            inner.resume(0)?;
            Ok("")
        });

        let err = outer.resume(0).unwrap_err();
        assert_eq!(err.to_string(), "test panic");

        let outer_failure = err.failure().unwrap();
        let causes = outer_failure.causes();
        assert_eq!(causes.len(), 1);
        let inner = causes[0].downcast_ref::<Error>().unwrap();
        let inner_failure = inner.failure().unwrap();

        let rendered = err.debug_string();
        assert_eq!(rendered.matches("test panic").count(), 2, "{}", rendered);
        assert_eq!(
            rendered,
            format!(
                "{}\n{}",
                outer_failure.message_with_stack(),
                inner_failure.message_with_stack(),
            ),
        );
    }
}

mod cancellation {
    use {super::*, ::pretty_assertions::assert_eq};

    #[test]
    fn clean_unwind ()
    {
        init_logging();
        let cleaned_up = flag();
        let observed = flag();
        let mut coroutine = Coroutine::<i32, &str>::new({
            let cleaned_up = Arc::clone(&cleaned_up);
            let observed = Arc::clone(&observed);
            move |co| {
                let _guard = OnDrop(move || cleaned_up.store(true, SeqCst));
                match co.yield_("before cancel") {
                    | Ok(_) => panic!("should not reach here"),
                    | Err(err) => {
                        observed.store(err.is_canceled(), SeqCst);
                        Err(err.into())
                    },
                }
            }
        });

        assert_eq!(
            coroutine.resume(0).unwrap(),
            CoroutineState::Yielded("before cancel"),
        );
        coroutine.cancel().unwrap();
        assert!(observed.load(SeqCst));
        assert!(cleaned_up.load(SeqCst));
        assert_eq!(coroutine.status(), Status::Canceled);

        let err = coroutine.resume(0).unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(err.to_string(), "coroutine canceled");
    }

    #[test]
    fn multiple_cancels ()
    {
        let unwound = Arc::new(AtomicUsize::new(0));
        let mut coroutine = Coroutine::<i32, &str>::new({
            let unwound = Arc::clone(&unwound);
            move |co| {
                let _guard = OnDrop(move || { unwound.fetch_add(1, SeqCst); });
                co.yield_("before cancel")?;
                panic!("coroutine should have been canceled");
            }
        });

        coroutine.resume(0).unwrap();
        coroutine.cancel().unwrap();
        coroutine.cancel().unwrap();
        coroutine.cancel().unwrap();
        assert_eq!(unwound.load(SeqCst), 1);
    }

    #[test]
    fn before_start ()
    {
        let ran = flag();
        let mut coroutine = Coroutine::<i32, &str>::new({
            let ran = Arc::clone(&ran);
            move |_| {
                ran.store(true, SeqCst);
                panic!("should not reach here");
            }
        });

        assert_eq!(coroutine.status(), Status::NotStarted);
        coroutine.cancel().unwrap();
        assert!(coroutine.is_done());
        assert!(coroutine.resume(0).unwrap_err().is_canceled());
        assert!(ran.load(SeqCst).not());
        coroutine.cancel().unwrap();
        assert_eq!(coroutine.status(), Status::Canceled);
    }

    #[test]
    fn cleanup_panics ()
    {
        let mut coroutine = Coroutine::<i32, &str>::new(|co| {
            let _guard = OnDrop(|| panic!("deferred error"));
            co.yield_("before panic")?;
            Ok("")
        });

        assert_eq!(
            coroutine.resume(0).unwrap(),
            CoroutineState::Yielded("before panic"),
        );
        let err = coroutine.cancel().unwrap_err();
        assert_eq!(err.to_string(), "deferred error");
        assert_eq!(err.kind(), ErrorKind::Failed);
        assert_eq!(coroutine.status(), Status::Failed);

        assert!(coroutine.resume(0).unwrap_err().same_as(&err));
        // done: no-op.
        coroutine.cancel().unwrap();
    }

    #[test]
    fn swallowed ()
    {
        let retried = flag();
        let mut coroutine = Coroutine::<i32, &str>::new({
            let retried = Arc::clone(&retried);
            move |co| {
                let first = co.suspend().unwrap_err();
                // parking again is not an option.
                let second = co.suspend().unwrap_err();
                retried.store(first.same_as(&second), SeqCst);
                Ok("ignored")
            }
        });

        coroutine.resume(0).unwrap();
        coroutine.cancel().unwrap();
        assert!(retried.load(SeqCst));
        assert!(coroutine.resume(0).unwrap_err().is_canceled());
    }

    #[test]
    fn propagated_by_panic_any ()
    {
        let mut coroutine = Coroutine::<i32, &str>::new(|co| {
            if let Err(err) = co.yield_("before cancel") {
                ::std::panic::panic_any(err);
            }
            Ok("")
        });

        coroutine.resume(0).unwrap();
        coroutine.cancel().unwrap();
        assert_eq!(coroutine.status(), Status::Canceled);
    }

    #[test]
    fn unwrapped_instead_of_propagated ()
    {
        let mut coroutine = Coroutine::<i32, &str>::new(|co| {
            co.yield_("before cancel").unwrap();
            Ok("")
        });

        coroutine.resume(0).unwrap();
        let err = coroutine.cancel().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Failed);
        assert!(err.to_string().contains("called `Result::unwrap()`"));
        assert_eq!(coroutine.status(), Status::Failed);
    }

    #[test]
    fn on_drop ()
    {
        let cleaned_up = flag();
        let mut coroutine = Coroutine::<(), ()>::new({
            let cleaned_up = Arc::clone(&cleaned_up);
            move |co| {
                let _guard = OnDrop(move || cleaned_up.store(true, SeqCst));
                loop {
                    co.suspend()?;
                }
            }
        });

        coroutine.resume(()).unwrap();
        assert!(cleaned_up.load(SeqCst).not());
        drop(coroutine);
        assert!(cleaned_up.load(SeqCst));
    }

    #[test]
    fn on_drop_with_failing_cleanup ()
    {
        init_logging();
        let mut coroutine = Coroutine::<(), ()>::new(|co| {
            let _guard = OnDrop(|| panic!("deferred error"));
            co.suspend()?;
            Ok(())
        });

        coroutine.resume(()).unwrap();
        // logged, not raised.
        drop(coroutine);
    }
}

mod escaped {
    use {super::*, ::pretty_assertions::assert_eq};

    type Slot = Arc<Mutex<Option<Co<i32, &'static str>>>>;

    fn escaping (slot: &'_ Slot)
      -> Coroutine<i32, &'static str>
    {
        let slot = Arc::clone(slot);
        Coroutine::new(move |co| {
            *slot.lock().unwrap() = Some(co.clone());
            co.yield_("first yield")?;
            Ok("done")
        })
    }

    fn take (slot: &'_ Slot)
      -> Co<i32, &'static str>
    {
        slot.lock().unwrap().take().unwrap()
    }

    #[test]
    fn yield_after_completion ()
    {
        let slot = Slot::default();
        let mut coroutine = escaping(&slot);

        assert_eq!(coroutine.resume(0).unwrap(), CoroutineState::Yielded("first yield"));
        assert_eq!(coroutine.resume(1).unwrap(), CoroutineState::Returned("done"));

        let err = take(&slot).yield_("already done").unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(err.to_string(), "coroutine canceled");
    }

    #[test]
    fn suspend_after_completion ()
    {
        let slot = Slot::default();
        let mut coroutine = escaping(&slot);

        coroutine.resume(0).unwrap();
        coroutine.resume(1).unwrap();

        assert!(take(&slot).suspend().unwrap_err().is_canceled());
    }

    #[test]
    fn yield_after_cancel ()
    {
        let slot = Slot::default();
        let mut coroutine = escaping(&slot);

        coroutine.resume(0).unwrap();
        coroutine.cancel().unwrap();

        let co = take(&slot);
        assert!(co.yield_("already done").unwrap_err().is_canceled());
        assert!(co.suspend().unwrap_err().is_canceled());
        assert_eq!(co.take_first_input(), None);
    }

    #[test]
    fn used_by_the_caller_while_suspended ()
    {
        let slot = Slot::default();
        let mut coroutine = escaping(&slot);

        coroutine.resume(0).unwrap();
        let co = take(&slot);
        assert!(co.yield_("not from here").unwrap_err().is_canceled());
        // the misuse did not disturb the coroutine.
        assert_eq!(coroutine.resume(1).unwrap(), CoroutineState::Returned("done"));
    }
}

mod status {
    use {super::*, ::pretty_assertions::assert_eq};

    #[test]
    fn lifecycle ()
    {
        let mut coroutine = Coroutine::<(), u8>::new(|co| {
            co.yield_(1)?;
            Ok(2)
        });

        assert_eq!(coroutine.status(), Status::NotStarted);
        assert!(coroutine.is_done().not());
        coroutine.resume(()).unwrap();
        assert_eq!(coroutine.status(), Status::Suspended);
        coroutine.resume(()).unwrap();
        assert_eq!(coroutine.status(), Status::Completed);
        assert!(coroutine.is_done());
    }

    #[test]
    fn builder_names_the_context ()
    {
        let mut coroutine =
            Builder::new()
                .name("worker")
                .build(|_| Ok(thread::current().name().map(str::to_owned)))
        ;
        assert_eq!(
            coroutine.resume(()).unwrap(),
            CoroutineState::Returned(Some("worker".to_owned())),
        );
        assert!(format!("{:?}", coroutine).contains("worker"));
    }
}

mod iteration {
    use {super::*, ::pretty_assertions::assert_eq};

    #[test]
    fn yields_skipping_suspensions ()
    {
        let coroutine = Coroutine::<(), u8>::new(|co| {
            co.yield_(1)?;
            co.suspend()?;
            co.yield_(2)?;
            co.suspend()?;
            co.yield_(3)?;
            Ok(42)
        });

        assert_eq!(
            coroutine.into_iter().collect::<Result<Vec<_>, _>>().unwrap(),
            [1, 2, 3],
        );
    }

    #[test]
    fn stops_after_failure ()
    {
        let mut coroutine = Coroutine::<(), u8>::new(|co| {
            co.yield_(1)?;
            Err("boom".into())
        });

        let mut iter = (&mut coroutine).into_iter();
        assert_eq!(iter.next().unwrap().unwrap(), 1);
        assert_eq!(iter.next().unwrap().unwrap_err().to_string(), "boom");
        assert!(iter.next().is_none());
        assert_eq!(coroutine.status(), Status::Failed);
    }
}
