/// No terminal write has happened yet.
///
/// The only non-terminal state; every other state is final.
pub(crate) const PENDING: u8 = 0;

/// A value was delivered through `Promise::set_value`.
pub(crate) const COMPLETED: u8 = 1;

/// The result was cancelled, either explicitly through `Future::cancel`
/// or because the promise was dropped without producing a value.
pub(crate) const CANCELLED: u8 = 2;
