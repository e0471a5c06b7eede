use crate::call::{CommandCall, ExecutionContext};

/// Anything that can transmit command calls.
///
/// `enqueue` must return without blocking. Calls enqueued from the same
/// context are written, and therefore answered, in submission order.
/// Implementors own the reply slot of every call they accept and must
/// complete or drop it.
pub trait CommandTarget {
    fn enqueue(&self, call: CommandCall);

    /// Runtime the target's calls complete on.
    fn context(&self) -> &ExecutionContext;
}

impl<T: CommandTarget + ?Sized> CommandTarget for &T {
    fn enqueue(&self, call: CommandCall) {
        (**self).enqueue(call)
    }

    fn context(&self) -> &ExecutionContext {
        (**self).context()
    }
}

impl<T: CommandTarget + ?Sized> CommandTarget for std::sync::Arc<T> {
    fn enqueue(&self, call: CommandCall) {
        (**self).enqueue(call)
    }

    fn context(&self) -> &ExecutionContext {
        (**self).context()
    }
}
