use std::future::{Future, IntoFuture};

use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture};
use futures::FutureExt;

use super::{ResourceError, ResourceResult};

/// In-flight proxy call that can be abandoned from another task.
///
/// Awaiting the request (directly or through [`Request::promise`]) resolves it;
/// [`Request::abort`] or any cloned [`AbortHandle`] settles it with
/// [`super::ErrorCode::Aborted`] instead. Dropping the request without awaiting
/// cancels the underlying call.
pub struct Request<T> {
    inner: Abortable<BoxFuture<'static, ResourceResult<T>>>,
    abort: AbortHandle,
}

impl<T: Send + 'static> Request<T> {
    pub(crate) fn new(future: impl Future<Output = ResourceResult<T>> + Send + 'static) -> Self {
        let (abort, registration) = AbortHandle::new_pair();
        Self {
            inner: Abortable::new(future.boxed(), registration),
            abort,
        }
    }

    /// Handle that aborts this request; survives moving the request into
    /// another task.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    pub async fn promise(self) -> ResourceResult<T> {
        match self.inner.await {
            Ok(result) => result,
            Err(Aborted) => Err(ResourceError::aborted()),
        }
    }
}

impl<T: Send + 'static> IntoFuture for Request<T> {
    type Output = ResourceResult<T>;
    type IntoFuture = BoxFuture<'static, ResourceResult<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.promise().boxed()
    }
}
