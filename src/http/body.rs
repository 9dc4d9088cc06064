//! Request and response bodies.
//!
//! # Responsibilities
//! - Hold either a fully buffered payload or a one-shot stream
//! - Read a body to completion under a size limit
//! - Split a body into two independently readable halves (tee)
//!
//! # Design Decisions
//! - Buffered bodies tee by cloning `Bytes` (reference counted, no copy)
//! - Streamed bodies tee through a shared queue: whichever half polls the
//!   source first hands a copy of each chunk to the other half
//! - The source stream is polled with a waker that wakes both halves

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

use axum::body::{Body as HttpBody, BodyDataStream, Bytes};
use futures_util::task::{waker, ArcWake};
use futures_util::{Stream, StreamExt};

use crate::error::{ShimError, ShimResult, TransportError};

/// A body that is either buffered in memory or still streaming.
pub struct Body {
    kind: Kind,
}

enum Kind {
    Bytes(Bytes),
    Stream(HttpBody),
}

impl Body {
    /// A present but empty body.
    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// Wrap a streaming body. It is read at most once.
    pub fn from_stream(body: HttpBody) -> Self {
        Self {
            kind: Kind::Stream(body),
        }
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self.kind, Kind::Bytes(_))
    }

    /// The payload, if the body is buffered.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.kind {
            Kind::Bytes(bytes) => Some(bytes),
            Kind::Stream(_) => None,
        }
    }

    /// Read the whole body into memory.
    ///
    /// Fails with a length-limit error when the payload exceeds `limit`
    /// bytes, whether buffered or streamed.
    pub async fn collect(self, limit: usize) -> Result<Bytes, TransportError> {
        let body = match self.kind {
            Kind::Bytes(bytes) if bytes.len() <= limit => return Ok(bytes),
            Kind::Bytes(bytes) => HttpBody::from(bytes),
            Kind::Stream(body) => body,
        };
        axum::body::to_bytes(body, limit)
            .await
            .map_err(TransportError::new)
    }

    /// Split into two bodies that each yield the full payload.
    pub fn tee(self) -> (Body, Body) {
        match self.kind {
            Kind::Bytes(bytes) => (Body::from(bytes.clone()), Body::from(bytes)),
            Kind::Stream(body) => {
                let shared = Arc::new(Mutex::new(TeeShared {
                    source: Some(body.into_data_stream()),
                    pending: [VecDeque::new(), VecDeque::new()],
                    alive: [true, true],
                }));
                let wakers = Arc::new(TeeWaker::default());
                let branch = |index| {
                    Body::from_stream(HttpBody::from_stream(TeeBranch {
                        index,
                        shared: shared.clone(),
                        wakers: wakers.clone(),
                    }))
                };
                (branch(0), branch(1))
            }
        }
    }

    pub fn into_http_body(self) -> HttpBody {
        match self.kind {
            Kind::Bytes(bytes) => HttpBody::from(bytes),
            Kind::Stream(body) => body,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Bytes(bytes) => f.debug_tuple("Body::Bytes").field(&bytes.len()).finish(),
            Kind::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            kind: Kind::Bytes(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

impl From<HttpBody> for Body {
    fn from(body: HttpBody) -> Self {
        Self::from_stream(body)
    }
}

/// Read the body held in `slot`, marking it used.
///
/// A missing body reads as empty and is not marked used.
pub(crate) async fn read_slot(
    slot: &mut Option<Body>,
    used: &mut bool,
    limit: usize,
) -> ShimResult<Bytes> {
    if *used {
        return Err(ShimError::BodyUsed);
    }
    match slot.take() {
        None => Ok(Bytes::new()),
        Some(body) => {
            *used = true;
            Ok(body.collect(limit).await?)
        }
    }
}

/// Tee the body held in `slot`: one half stays in place, the other is returned.
pub(crate) fn tee_slot(slot: &mut Option<Body>, used: bool) -> ShimResult<Option<Body>> {
    if used {
        return Err(ShimError::BodyUsed);
    }
    Ok(slot.take().map(|body| {
        let (kept, copy) = body.tee();
        *slot = Some(kept);
        copy
    }))
}

type TeeItem = Result<Bytes, Arc<axum::Error>>;

struct TeeShared {
    source: Option<BodyDataStream>,
    pending: [VecDeque<TeeItem>; 2],
    alive: [bool; 2],
}

#[derive(Default)]
struct TeeWaker {
    wakers: Mutex<[Option<Waker>; 2]>,
}

impl TeeWaker {
    fn register(&self, index: usize, waker: &Waker) {
        let mut wakers = self.wakers.lock().unwrap_or_else(PoisonError::into_inner);
        match &wakers[index] {
            Some(current) if current.will_wake(waker) => {}
            _ => wakers[index] = Some(waker.clone()),
        }
    }

    fn clear(&self, index: usize) {
        self.wakers.lock().unwrap_or_else(PoisonError::into_inner)[index] = None;
    }
}

impl ArcWake for TeeWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let wakers = arc_self.wakers.lock().unwrap_or_else(PoisonError::into_inner);
        for waker in wakers.iter().flatten() {
            waker.wake_by_ref();
        }
    }
}

struct TeeBranch {
    index: usize,
    shared: Arc<Mutex<TeeShared>>,
    wakers: Arc<TeeWaker>,
}

impl Stream for TeeBranch {
    type Item = TeeItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.wakers.register(this.index, cx.waker());

        let mut shared = this.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(item) = shared.pending[this.index].pop_front() {
            return Poll::Ready(Some(item));
        }

        let Some(source) = shared.source.as_mut() else {
            return Poll::Ready(None);
        };

        let tee_waker = waker(this.wakers.clone());
        let mut tee_cx = Context::from_waker(&tee_waker);
        match source.poll_next_unpin(&mut tee_cx) {
            Poll::Ready(Some(item)) => {
                let item = item.map_err(Arc::new);
                let other = 1 - this.index;
                if shared.alive[other] {
                    shared.pending[other].push_back(item.clone());
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                shared.source = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for TeeBranch {
    fn drop(&mut self) {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.alive[self.index] = false;
        shared.pending[self.index].clear();
        self.wakers.clear(self.index);
    }
}
