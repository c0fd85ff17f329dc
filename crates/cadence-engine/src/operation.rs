//! Closures as schedulable units.

use cadence_core::UpdateError;

use crate::unit::{Schedulable, Schedule, Unit, UpdateContext};

type Operation = Box<dyn FnMut(&mut UpdateContext<'_>) -> Result<(), UpdateError>>;

/// A unit whose update is an arbitrary closure.
pub struct NetworkOperation {
    f: Operation,
}

impl NetworkOperation {
    /// Wrap a fallible closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&mut UpdateContext<'_>) -> Result<(), UpdateError> + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Wrap a closure that cannot fail.
    pub fn infallible<F>(mut f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self::new(move |_| {
            f();
            Ok(())
        })
    }
}

impl Schedulable for NetworkOperation {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        (self.f)(ctx)
    }
}

/// Build a [`NetworkOperation`] unit and register it with the thread's
/// implicit registry.
pub fn network_operation<F>(schedule: Schedule, f: F) -> Unit<NetworkOperation>
where
    F: FnMut(&mut UpdateContext<'_>) -> Result<(), UpdateError> + 'static,
{
    Unit::new(NetworkOperation::new(f), schedule)
}
