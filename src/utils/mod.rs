#[macro_use]
mod macros;

pub(in crate)
mod prelude;

use_prelude!();

/// Locks the control block, recovering it if a panicking `Drop` of some
/// `In` / `Out` value poisoned the mutex: the slots themselves are always
/// left in a consistent state.
pub(in crate)
fn lock<T> (mutex: &'_ Mutex<T>)
  -> MutexGuard<'_, T>
{
    mutex
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
