//! Subproblem worker contract (§5 "subproblem server"): the trait a
//! parallel `Master` variant dispatches dispatched Subproblems against,
//! plus (behind `nng-transport`) one concrete nng req/rep implementation
//! of it. The default, feature-off build of this crate exposes only the
//! trait — matching the "trait-level only, feature-gated" scope of this
//! crate.

use crate::{error::Result, protocol::SubProblemPayload};

/// Receives dispatched Subproblem payloads from a coordinator, one at a
/// time, in whatever order the underlying channel delivers them (§5).
pub trait SubproblemChannel: Send {
    async fn recv(&mut self) -> Result<SubProblemPayload>;
}

#[cfg(feature = "nng-transport")]
pub use nng_impl::NngWorker;

#[cfg(feature = "nng-transport")]
mod nng_impl {
    use core::fmt;

    use error_stack::{IntoReport, ResultExt};
    use tokio::sync::mpsc;

    use super::SubproblemChannel;
    use crate::{
        error::{ErrorKind, Result},
        protocol::SubProblemPayload,
    };

    const NUM_CONTEXTS: usize = 4;

    type PayloadSender = mpsc::UnboundedSender<nng::Message>;
    type PayloadReceiver = mpsc::UnboundedReceiver<nng::Message>;

    /// An nng req/rep rep-socket backing [`SubproblemChannel`]. Unlike the
    /// per-context `Aio` wrapper type the teacher's `nano::Server` keeps
    /// around purely to extend its lifetime, the contexts here are held
    /// inline as a `Vec<nng::Aio>` and every context shares one registration
    /// closure built from the worker's own `bind`, so there is no separate
    /// `Context::new` constructor mirroring the server's `Worker::new`.
    pub struct NngWorker {
        _socket: nng::Socket,
        _aios: Vec<nng::Aio>,
        receiver: PayloadReceiver,
    }

    impl fmt::Debug for NngWorker {
        fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt.debug_struct("NngWorker").finish_non_exhaustive()
        }
    }

    fn register_context(socket: &nng::Socket, sender: PayloadSender, url: &str) -> Result<nng::Aio, nng::Error> {
        let ctx_orig = nng::Context::new(socket)
            .into_report()
            .attach_printable("could not create nng context")?;
        let ctx = ctx_orig.clone();

        let socket_url = url.to_owned();
        let aio = nng::Aio::new(move |aio, result| match result {
            nng::AioResult::Send(_) => {
                ctx.recv(&aio).expect("nng recv after send must not fail");
            }
            nng::AioResult::Recv(Ok(msg)) => {
                ctx.send(&aio, nng::Message::new()).expect("nng ack send must not fail");
                if sender.send(msg).is_err() {
                    tracing::debug!(%socket_url, "worker payload channel closed, dropping message");
                }
            }
            nng::AioResult::Recv(Err(nng::Error::Closed)) => {
                tracing::debug!(%socket_url, "worker context closed");
            }
            nng::AioResult::Recv(Err(error)) => {
                tracing::error!(%error, "worker context receive error");
            }
            nng::AioResult::Sleep(_) => unreachable!("worker never sleeps"),
        })?;

        ctx_orig
            .recv(&aio)
            .into_report()
            .attach_printable("could not arm nng context for receive")?;

        Ok(aio)
    }

    impl NngWorker {
        /// Binds a rep-side socket at `url` and arms `NUM_CONTEXTS`
        /// concurrent receive contexts on it (§5 "subproblem server").
        pub fn bind(url: &str) -> Result<Self> {
            let socket = nng::Socket::new(nng::Protocol::Rep0)
                .into_report()
                .attach_printable("could not create nng socket")
                .change_context(ErrorKind::WorkerCreation)?;
            socket
                .listen(url)
                .into_report()
                .attach_printable("could not listen on socket")
                .change_context(ErrorKind::WorkerCreation)?;

            let (sender, receiver) = mpsc::unbounded_channel();
            let aios = (0..NUM_CONTEXTS)
                .map(|_| {
                    register_context(&socket, sender.clone(), url)
                        .attach_printable("could not register worker context")
                        .change_context(ErrorKind::WorkerCreation)
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(Self {
                _socket: socket,
                _aios: aios,
                receiver,
            })
        }
    }

    impl SubproblemChannel for NngWorker {
        async fn recv(&mut self) -> Result<SubProblemPayload> {
            let msg = self.receiver.recv().await.expect("coordinator dropped without closing worker");
            serde_json::from_slice(msg.as_slice())
                .into_report()
                .attach_printable("could not deserialize subproblem payload")
                .change_context(ErrorKind::Deserialize)
        }
    }
}
