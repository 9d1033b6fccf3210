//! Request/poll client for the coordination service.
//!
//! [`GovernanceClient::send_request`] issues a request in the background and
//! returns immediately. Callers observe completion through
//! [`is_ready`](GovernanceClient::is_ready) or await it with
//! [`wait_ready`](GovernanceClient::wait_ready), then read the buffered
//! result. Every request gets a generation number; when a response arrives
//! after a newer request was issued it is dropped, so buffers only ever
//! hold the latest request's outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use stakegov_types::{Ballot, Proposal, VoteRecord};

use crate::ballot::encode_payload;
use crate::{CoordinationTransport, GovernanceError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    GetProposals,
    /// `payload` is the JSON ballot array.
    CastVote { payload: String },
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Self::GetProposals => "get_proposals",
            Self::CastVote { .. } => "cast_vote",
        }
    }
}

#[derive(Default)]
struct Buffers {
    proposals: Vec<Proposal>,
    votes: Vec<VoteRecord>,
    status_ok: bool,
    /// The last failure was a timeout after the request went out.
    timed_out: bool,
}

struct Inner {
    transport: Arc<dyn CoordinationTransport>,
    issued: AtomicU64,
    completed: watch::Sender<u64>,
    buffers: RwLock<Buffers>,
    flight: Mutex<()>,
}

/// Owned handle to the coordination service. Cheap to clone.
#[derive(Clone)]
pub struct GovernanceClient {
    inner: Arc<Inner>,
}

impl GovernanceClient {
    pub fn new(transport: Arc<dyn CoordinationTransport>) -> Self {
        let (completed, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                transport,
                issued: AtomicU64::new(0),
                completed,
                buffers: RwLock::new(Buffers::default()),
                flight: Mutex::new(()),
            }),
        }
    }

    /// Issue `request` in the background and return its generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send_request(&self, request: Request) -> u64 {
        let generation = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, request = request.name(), "issuing governance request");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = match &request {
                Request::GetProposals => inner
                    .transport
                    .get_proposals()
                    .await
                    .map(|p| (Some(p), None)),
                Request::CastVote { payload } => inner
                    .transport
                    .cast_votes(payload)
                    .await
                    .map(|v| (None, Some(v))),
            };
            inner.complete(generation, request.name(), outcome);
        });
        generation
    }

    /// True when the most recently issued request has completed.
    pub fn is_ready(&self) -> bool {
        *self.inner.completed.borrow() == self.inner.issued.load(Ordering::SeqCst)
    }

    /// Whether the most recently completed request succeeded.
    pub fn status_ok(&self) -> bool {
        self.inner.read_buffers(|b| b.status_ok)
    }

    pub fn proposals(&self) -> Vec<Proposal> {
        self.inner.read_buffers(|b| b.proposals.clone())
    }

    pub fn votes(&self) -> Vec<VoteRecord> {
        self.inner.read_buffers(|b| b.votes.clone())
    }

    fn timed_out(&self) -> bool {
        self.inner.read_buffers(|b| b.timed_out)
    }

    /// Wait until the latest request issued so far has completed.
    pub async fn wait_ready(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), GovernanceError> {
        let target = self.inner.issued.load(Ordering::SeqCst);
        let mut rx = self.inner.completed.subscribe();
        let ready = async move { rx.wait_for(|done| *done >= target).await.map(|_| ()) };

        tokio::select! {
            _ = cancel.cancelled() => Err(GovernanceError::Cancelled),
            waited = tokio::time::timeout(timeout, ready) => match waited {
                Ok(Ok(())) => Ok(()),
                Ok(Err(_)) => Err(GovernanceError::RequestFailed),
                Err(_) => Err(GovernanceError::TimedOut),
            },
        }
    }

    /// GET_PROPOSALS as one exclusive exchange: issue, wait, read.
    pub async fn fetch_proposals(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<Proposal>, GovernanceError> {
        let _flight = tokio::select! {
            guard = self.inner.flight.lock() => guard,
            _ = cancel.cancelled() => return Err(GovernanceError::Cancelled),
        };
        self.send_request(Request::GetProposals);
        self.wait_ready(timeout, cancel).await?;
        if !self.status_ok() {
            return Err(GovernanceError::RequestFailed);
        }
        Ok(self.proposals())
    }

    /// CAST_VOTE as one exclusive exchange.
    ///
    /// `cancel` is honoured only until the request is sent. Running out of
    /// time afterwards, on either the wait or the transport, yields
    /// [`GovernanceError::OutcomeUnknown`]: the service may still have
    /// counted the ballots.
    pub async fn submit_ballots(
        &self,
        ballots: &[Ballot],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<VoteRecord>, GovernanceError> {
        let payload = encode_payload(ballots)?;
        let _flight = tokio::select! {
            guard = self.inner.flight.lock() => guard,
            _ = cancel.cancelled() => return Err(GovernanceError::Cancelled),
        };
        if cancel.is_cancelled() {
            return Err(GovernanceError::Cancelled);
        }
        self.send_request(Request::CastVote { payload });
        match self.wait_ready(timeout, &CancellationToken::new()).await {
            Ok(()) => {}
            Err(GovernanceError::TimedOut) => {
                warn!(ballots = ballots.len(), "vote submission outcome unknown");
                return Err(GovernanceError::OutcomeUnknown);
            }
            Err(e) => return Err(e),
        }
        if !self.status_ok() {
            if self.timed_out() {
                warn!(ballots = ballots.len(), "vote submission outcome unknown");
                return Err(GovernanceError::OutcomeUnknown);
            }
            return Err(GovernanceError::RequestFailed);
        }
        Ok(self.votes())
    }
}

type Outcome = Result<
    (Option<Vec<Proposal>>, Option<Vec<VoteRecord>>),
    crate::TransportError,
>;

impl Inner {
    fn read_buffers<T>(&self, f: impl FnOnce(&Buffers) -> T) -> T {
        match self.buffers.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn complete(&self, generation: u64, name: &'static str, outcome: Outcome) {
        let mut buffers = match self.buffers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if generation != self.issued.load(Ordering::SeqCst) {
            debug!(generation, request = name, "discarding superseded response");
            return;
        }
        match outcome {
            Ok((proposals, votes)) => {
                if let Some(p) = proposals {
                    buffers.proposals = p;
                }
                if let Some(v) = votes {
                    buffers.votes = v;
                }
                buffers.status_ok = true;
                buffers.timed_out = false;
            }
            Err(e) => {
                warn!(generation, request = name, error = %e, "governance request failed");
                buffers.status_ok = false;
                buffers.timed_out = matches!(e, crate::TransportError::TimedOut(_));
            }
        }
        self.completed.send_replace(generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportError;
    use async_trait::async_trait;
    use stakegov_types::{Address, Amount, VoteId};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Answers once `gate` is notified. Cast votes echo the payload as a weight.
    struct GatedTransport {
        gate: Notify,
        calls: AtomicUsize,
        fail: bool,
    }

    impl GatedTransport {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                gate: Notify::new(),
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    fn record(n: u64) -> VoteRecord {
        VoteRecord {
            vote_id: VoteId::new("p").unwrap(),
            address: Address::from("a"),
            weight: Amount::new(n),
        }
    }

    #[async_trait]
    impl CoordinationTransport for GatedTransport {
        async fn get_proposals(&self) -> Result<Vec<Proposal>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            if self.fail {
                return Err(TransportError::RequestFailed("boom".into()));
            }
            Ok(Vec::new())
        }

        async fn cast_votes(&self, payload: &str) -> Result<Vec<VoteRecord>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            let n = payload.parse().unwrap_or(0);
            Ok(vec![record(n)])
        }
    }

    #[tokio::test]
    async fn ready_toggles_around_a_request() {
        let transport = GatedTransport::new(false);
        let client = GovernanceClient::new(transport.clone());
        assert!(client.is_ready());

        client.send_request(Request::GetProposals);
        assert!(!client.is_ready());

        tokio::task::yield_now().await;
        transport.gate.notify_one();
        client
            .wait_ready(Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();
        assert!(client.is_ready());
        assert!(client.status_ok());
    }

    #[tokio::test]
    async fn failure_clears_status() {
        let transport = GatedTransport::new(true);
        let client = GovernanceClient::new(transport.clone());
        transport.gate.notify_one();
        let err = client
            .fetch_proposals(Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::RequestFailed));
        assert!(!client.status_ok());
    }

    #[tokio::test]
    async fn wait_times_out() {
        let client = GovernanceClient::new(GatedTransport::new(false));
        client.send_request(Request::GetProposals);
        let err = client
            .wait_ready(Duration::from_millis(20), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::TimedOut));
    }

    #[tokio::test]
    async fn wait_honors_cancellation() {
        let client = GovernanceClient::new(GatedTransport::new(false));
        client.send_request(Request::GetProposals);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .wait_ready(Duration::from_secs(5), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Cancelled));
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let transport = GatedTransport::new(false);
        let client = GovernanceClient::new(transport.clone());

        client.send_request(Request::CastVote { payload: "1".into() });
        client.send_request(Request::CastVote { payload: "2".into() });
        while transport.calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        transport.gate.notify_waiters();
        client
            .wait_ready(Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.votes(), vec![record(2)]);
    }

    #[tokio::test]
    async fn cast_timeout_is_outcome_unknown() {
        let client = GovernanceClient::new(GatedTransport::new(false));
        let err = client
            .submit_ballots(&[], Duration::from_millis(20), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::OutcomeUnknown));
    }

    /// Fails every request immediately with a fixed error.
    struct FailingTransport(fn() -> TransportError);

    #[async_trait]
    impl CoordinationTransport for FailingTransport {
        async fn get_proposals(&self) -> Result<Vec<Proposal>, TransportError> {
            Err((self.0)())
        }

        async fn cast_votes(&self, _: &str) -> Result<Vec<VoteRecord>, TransportError> {
            Err((self.0)())
        }
    }

    #[tokio::test]
    async fn transport_timeout_on_cast_is_outcome_unknown() {
        let client = GovernanceClient::new(Arc::new(FailingTransport(|| {
            TransportError::TimedOut("slow".into())
        })));
        let err = client
            .submit_ballots(&[], Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::OutcomeUnknown));
    }

    #[tokio::test]
    async fn unreachable_service_on_cast_is_request_failed() {
        let client = GovernanceClient::new(Arc::new(FailingTransport(|| {
            TransportError::Unreachable("refused".into())
        })));
        let err = client
            .submit_ballots(&[], Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::RequestFailed));
    }

    #[tokio::test]
    async fn cancelled_cast_is_never_sent() {
        let transport = GatedTransport::new(false);
        let client = GovernanceClient::new(transport.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .submit_ballots(&[], Duration::from_secs(5), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Cancelled));
        tokio::task::yield_now().await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
