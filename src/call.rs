//! Command calls and their deferred results.
//!
//! A [`CommandCall`] carries the serialized request plus the sending half of
//! a one-shot channel. The receiving half is wrapped in a [`Deferred`], which
//! the caller either awaits or hands a callback. Both styles consume the same
//! handle, so a reply is decoded and delivered exactly once.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{BufMut, BytesMut};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{CallError, Result};
use crate::extract::{decode, FromResp};
use crate::resp::RespValue;

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// The runtime a command target and all of its calls run on.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    handle: Handle,
}

impl ExecutionContext {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Context of the runtime driving the current task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `Handle::current`.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Create a one-shot completion slot and the handle observing it.
    pub fn completion(&self) -> (Completion, Deferred<RespValue>) {
        let (tx, rx) = oneshot::channel();
        let fut = async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(CallError::Transport("completion dropped".to_string())),
            }
        };
        (Completion { tx }, Deferred::new(fut, self.clone()))
    }
}

/// Single-assignment reply slot.
///
/// `succeed` and `fail` take the slot by value; a call cannot be completed
/// twice. Dropping the slot resolves the caller with a transport error.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Result<RespValue>>,
}

impl Completion {
    pub fn succeed(self, value: RespValue) {
        self.complete(Ok(value));
    }

    pub fn fail(self, error: CallError) {
        self.complete(Err(error));
    }

    /// True once the caller dropped its [`Deferred`].
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    fn complete(self, result: Result<RespValue>) {
        let _ = self.tx.send(result);
    }
}

/// One pending request: the command name and arguments plus its reply slot.
pub struct CommandCall {
    args: Vec<RespValue>,
    completion: Completion,
}

impl CommandCall {
    /// Build a call. Nothing is sent until a target enqueues it.
    pub fn new(args: Vec<RespValue>, context: &ExecutionContext) -> (Self, Deferred<RespValue>) {
        let (completion, deferred) = context.completion();
        (Self { args, completion }, deferred)
    }

    pub fn args(&self) -> &[RespValue] {
        &self.args
    }

    /// Command name, for logging.
    pub fn name(&self) -> String {
        match self.args.first() {
            Some(RespValue::BulkString(Some(name))) => String::from_utf8_lossy(name).into_owned(),
            _ => String::new(),
        }
    }

    /// The request as a RESP array.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_slice(format!("*{}\r\n", self.args.len()).as_bytes());
        for arg in &self.args {
            arg.encode_into(buf);
        }
    }

    pub fn succeed(self, value: RespValue) {
        self.completion.succeed(value);
    }

    pub fn fail(self, error: CallError) {
        self.completion.fail(error);
    }

    /// Split into the request and its reply slot, for transports that keep
    /// the slot in a pending queue after writing the request.
    pub fn into_parts(self) -> (Vec<RespValue>, Completion) {
        (self.args, self.completion)
    }
}

impl fmt::Debug for CommandCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandCall")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Deferred result of a command.
///
/// Await it, or pass a callback to [`Deferred::on_complete`]. Either way the
/// handle is consumed.
#[must_use = "a deferred result does nothing unless awaited or given a callback"]
pub struct Deferred<T> {
    fut: BoxFuture<T>,
    context: ExecutionContext,
}

impl<T: Send + 'static> Deferred<T> {
    pub fn new<F>(fut: F, context: ExecutionContext) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            fut: Box::pin(fut),
            context,
        }
    }

    /// Attach a decode step that runs when the result arrives.
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let Deferred { fut, context } = self;
        Deferred::new(async move { f(fut.await?) }, context)
    }

    /// Callback style: `callback` runs once on this call's runtime with
    /// either the error or the value.
    pub fn on_complete<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let Deferred { fut, context } = self;
        context.handle.spawn(async move { callback(fut.await) })
    }
}

impl Deferred<RespValue> {
    /// Decode the raw reply into `T`. Error replies become
    /// [`CallError::Store`].
    pub fn decode<T: FromResp + Send + 'static>(self) -> Deferred<T> {
        self.map(decode::<T>)
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.fut.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}
