//! Interceptors - observers of settled state transitions
//!
//! After every dispatch the store calls each interceptor, in registration
//! order, with the action and the state before and after it was reduced.
//! Interceptors cannot change the transition; to react they dispatch new
//! actions through a [`Dispatcher`](crate::Dispatcher).

/// Observer invoked once per dispatch
pub trait Interceptor<S, A>: Send {
    fn on_dispatch(&mut self, action: &A, old: &S, new: &S);
}

impl<S, A, F> Interceptor<S, A> for F
where
    F: FnMut(&A, &S, &S) + Send,
{
    fn on_dispatch(&mut self, action: &A, old: &S, new: &S) {
        self(action, old, new)
    }
}
