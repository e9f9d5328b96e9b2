//! The req side of the worker pair: dispatches Subproblems and collects
//! results (§5 "work balancer"). Grounded on the teacher's `nano::Client`
//! `Worker`: one `nng::Aio` callback per dialed worker, driven through the
//! same send-then-wait-for-reply state machine, generalized from a bare
//! JSON payload to the dispatch/result message pair this crate needs.

use core::{fmt, time::Duration};

use error_stack::{IntoReport, ResultExt};
use nng::options::{protocol::reqrep::ResendTime, Options, ReconnectMaxTime, ReconnectMinTime};
use tokio::sync::{mpsc, Mutex};

use crate::{
    error::{ErrorKind, Result},
    protocol::{SubProblemPayload, SubProblemResult},
};

const RESEND_TIME: Duration = Duration::from_secs(1);
const RECONNECT_MIN_TIME: Duration = Duration::from_millis(50);
const RECONNECT_MAX_TIME: Duration = Duration::from_secs(10);

struct WorkerHandle {
    url: String,
    _socket: nng::Socket,
    _dialer: nng::Dialer,
    aio: nng::Aio,
    ctx: nng::Context,
    // Guards the send-then-recv round trip: nng's req/rep context only
    // tolerates one outstanding request at a time.
    inflight: Mutex<mpsc::UnboundedReceiver<core::result::Result<nng::Message, nng::Error>>>,
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("WorkerHandle").field("url", &self.url).finish()
    }
}

impl WorkerHandle {
    fn dial(url: &str) -> Result<Self> {
        let socket = nng::Socket::new(nng::Protocol::Req0)
            .into_report()
            .attach_printable("could not create nng socket")
            .change_context(ErrorKind::CoordinatorCreation)?;

        let builder = nng::DialerBuilder::new(&socket, url)
            .into_report()
            .attach_printable("could not create nng dialer")
            .change_context(ErrorKind::CoordinatorCreation)?;
        builder
            .set_opt::<ReconnectMaxTime>(Some(RECONNECT_MAX_TIME))
            .into_report()
            .change_context(ErrorKind::CoordinatorCreation)?;
        builder
            .set_opt::<ReconnectMinTime>(Some(RECONNECT_MIN_TIME))
            .into_report()
            .change_context(ErrorKind::CoordinatorCreation)?;
        let dialer = builder
            .start(false)
            .map_err(|(_, error)| error)
            .into_report()
            .attach_printable("could not start nng dialer")
            .change_context(ErrorKind::CoordinatorCreation)?;

        let ctx = nng::Context::new(&socket)
            .into_report()
            .attach_printable("could not create nng context")
            .change_context(ErrorKind::CoordinatorCreation)?;
        ctx.set_opt::<ResendTime>(Some(RESEND_TIME))
            .into_report()
            .change_context(ErrorKind::CoordinatorCreation)?;

        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let ctx_clone = ctx.clone();
        let aio = nng::Aio::new(move |aio, result| match result {
            nng::AioResult::Send(_) => {
                ctx_clone.recv(&aio).expect("nng recv after send must not fail");
            }
            nng::AioResult::Recv(message) => {
                reply_tx
                    .send(message)
                    .expect("reply receiver dropped while a request was in flight");
            }
            nng::AioResult::Sleep(_) => unreachable!("coordinator aio never sleeps"),
        })
        .into_report()
        .attach_printable("could not create asynchronous I/O context")
        .change_context(ErrorKind::CoordinatorCreation)?;

        Ok(Self {
            url: url.to_owned(),
            _socket: socket,
            _dialer: dialer,
            aio,
            ctx,
            inflight: Mutex::new(reply_rx),
        })
    }

    async fn roundtrip(&self, msg: nng::Message) -> Result<nng::Message> {
        let mut reply_rx = self.inflight.lock().await;
        self.ctx
            .send(&self.aio, msg)
            .map_err(|(_, error)| error)
            .into_report()
            .attach_printable("could not send to worker")
            .change_context(ErrorKind::Send)?;
        let reply = reply_rx
            .recv()
            .await
            .expect("reply sender outlives the receiver for the handle's own lifetime");
        reply
            .into_report()
            .attach_printable("worker reported an nng error")
            .change_context(ErrorKind::Receive)
    }
}

/// Dispatches Subproblems to a fixed set of workers (§5). Load balancing
/// itself is left to the caller: `dispatch` addresses a specific worker by
/// index so `Master` can round-robin, pick the least-loaded one, or retry
/// against a different worker after a failure.
pub struct Coordinator {
    workers: Vec<WorkerHandle>,
}

impl Coordinator {
    pub fn new(urls: impl IntoIterator<Item = String>) -> Result<Self> {
        let workers = urls
            .into_iter()
            .map(|url| WorkerHandle::dial(&url))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { workers })
    }

    pub fn n_workers(&self) -> usize {
        self.workers.len()
    }

    pub async fn dispatch(&self, worker: usize, payload: &SubProblemPayload) -> Result<SubProblemResult> {
        let handle = self
            .workers
            .get(worker)
            .ok_or(ErrorKind::Send)
            .into_report()
            .attach_printable("worker index out of range")?;

        let mut nng_msg = nng::Message::new();
        serde_json::to_writer(&mut nng_msg, payload)
            .into_report()
            .attach_printable("could not serialize subproblem payload")
            .change_context(ErrorKind::Serialize)?;

        let reply = handle.roundtrip(nng_msg).await?;
        serde_json::from_slice(reply.as_slice())
            .into_report()
            .attach_printable("could not deserialize subproblem result")
            .change_context(ErrorKind::Deserialize)
    }
}
