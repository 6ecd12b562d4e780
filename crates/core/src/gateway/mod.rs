//! Gateway session over an authenticated TLS transport.
//!
//! A session pairs a gRPC channel to the gateway peer with the client identity and its signing
//! function. Authentication is per message: every proposal, prepared transaction and
//! commit-status request is signed by the client, so opening the session itself makes no remote
//! call.
//!
//! ## Call flow
//!
//! - Evaluate: sign proposal, `Evaluate`, return the chaincode response payload.
//! - Submit: sign proposal, `Endorse`, read the result out of the prepared transaction, sign the
//!   transaction, `Submit`, then poll `CommitStatus` until the ledger reports the validation
//!   code. Anything other than `VALID` is an error.
//!
//! Each call is bounded by its configured timeout. There are no retries.
//!
//! ## Lifecycle
//!
//! [`Gateway`], [`Network`] and [`GatewayContract`] share one underlying connection. It closes
//! when the last handle is dropped, so every exit path releases it.

mod proposal;
mod transaction;

use crate::error::Phase;
use crate::identity::{load_identity, load_sign, parse_certificate_pem, read_credential};
use crate::{
    Connector, Contract, GatewayConfig, Identity, LedgerError, LedgerResult, SignFn, Timeouts,
};
use nhms_proto::gateway::{
    CommitStatusRequest, EndorseRequest, EvaluateRequest, SignedCommitStatusRequest,
    SubmitRequest,
};
use nhms_proto::peer::TxValidationCode;
use nhms_proto::GatewayClient;
use proposal::{new_proposal, sign_bytes};
use prost::Message;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

/// Dial the gateway peer over TLS, trusting only the configured CA.
///
/// The TLS server name is the configured gateway peer name rather than the endpoint host, so a
/// peer reached through `localhost` still presents a verifiable certificate.
pub async fn new_grpc_connection(cfg: &GatewayConfig) -> LedgerResult<Channel> {
    let ca_pem = read_credential(cfg.tls_cert_path())?;
    parse_certificate_pem(&ca_pem)?;

    let tls = ClientTlsConfig::new()
        .ca_certificate(Certificate::from_pem(&ca_pem))
        .domain_name(cfg.gateway_peer());

    let uri = if cfg.peer_endpoint().starts_with("https://") {
        cfg.peer_endpoint().to_string()
    } else {
        format!("https://{}", cfg.peer_endpoint())
    };
    let endpoint = Endpoint::from_shared(uri).map_err(|e| LedgerError::InvalidEndpoint {
        endpoint: cfg.peer_endpoint().to_string(),
        reason: e.to_string(),
    })?;
    let endpoint = endpoint
        .tls_config(tls)?
        .connect_timeout(cfg.timeouts().endorse);

    tracing::info!(
        "connecting to gateway peer {} ({})",
        cfg.peer_endpoint(),
        cfg.gateway_peer()
    );
    let channel = endpoint.connect().await?;
    Ok(channel)
}

struct GatewayInner {
    client: GatewayClient,
    identity: Identity,
    sign: SignFn,
    timeouts: Timeouts,
}

impl Drop for GatewayInner {
    fn drop(&mut self) {
        tracing::debug!("closing gateway connection");
    }
}

/// An authenticated session with a gateway peer.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("msp_id", &self.inner.identity.msp_id())
            .field("timeouts", &self.inner.timeouts)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Bind an identity and signing function to an open channel.
    pub fn connect(identity: Identity, sign: SignFn, channel: Channel, timeouts: Timeouts) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                client: GatewayClient::new(channel),
                identity,
                sign,
                timeouts,
            }),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn network(&self, channel: impl Into<String>) -> Network {
        Network {
            gateway: self.clone(),
            channel: channel.into(),
        }
    }

    /// Release this handle. The connection closes once no network or contract holds it.
    pub fn close(self) {
        drop(self);
    }
}

/// A channel reached through a [`Gateway`].
#[derive(Clone, Debug)]
pub struct Network {
    gateway: Gateway,
    channel: String,
}

impl Network {
    pub fn name(&self) -> &str {
        &self.channel
    }

    pub fn contract(&self, chaincode: impl Into<String>) -> GatewayContract {
        GatewayContract {
            gateway: self.gateway.clone(),
            channel: self.channel.clone(),
            chaincode: chaincode.into(),
        }
    }
}

/// A chaincode on a channel, invoked through the gateway.
#[derive(Clone, Debug)]
pub struct GatewayContract {
    gateway: Gateway,
    channel: String,
    chaincode: String,
}

impl GatewayContract {
    pub fn chaincode(&self) -> &str {
        &self.chaincode
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    fn inner(&self) -> &GatewayInner {
        &self.gateway.inner
    }

    async fn commit_status(&self, transaction_id: &str) -> LedgerResult<()> {
        let inner = self.inner();
        let request = CommitStatusRequest {
            transaction_id: transaction_id.to_string(),
            channel_id: self.channel.clone(),
            identity: inner.identity.serialize(),
        }
        .encode_to_vec();
        let signature = sign_bytes(&inner.sign, &request)?;

        let timeout = inner.timeouts.commit_status;
        let mut client = inner.client.clone();
        let status = call(
            Phase::CommitStatus,
            timeout,
            client.commit_status(timed(SignedCommitStatusRequest { request, signature }, timeout)),
        )
        .await?;

        match TxValidationCode::try_from(status.result) {
            Ok(TxValidationCode::Valid) => {
                tracing::debug!(
                    "transaction {} committed in block {}",
                    transaction_id,
                    status.block_number
                );
                Ok(())
            }
            code => Err(LedgerError::CommitFailed {
                transaction_id: transaction_id.to_string(),
                code: match code {
                    Ok(code) => format!("{code:?} ({})", status.result),
                    Err(_) => status.result.to_string(),
                },
            }),
        }
    }
}

#[tonic::async_trait]
impl Contract for GatewayContract {
    async fn evaluate(&self, transaction: &str, args: &[&str]) -> LedgerResult<Vec<u8>> {
        let inner = self.inner();
        let proposal = new_proposal(
            &inner.identity,
            &self.channel,
            &self.chaincode,
            transaction,
            args,
        );
        let transaction_id = proposal.transaction_id.clone();
        tracing::debug!("evaluating {} as transaction {}", transaction, transaction_id);
        let signed = proposal.sign(&inner.sign)?;

        let timeout = inner.timeouts.evaluate;
        let mut client = inner.client.clone();
        let response = call(
            Phase::Evaluate,
            timeout,
            client.evaluate(timed(
                EvaluateRequest {
                    transaction_id,
                    channel_id: self.channel.clone(),
                    proposed_transaction: Some(signed),
                    target_organizations: Vec::new(),
                },
                timeout,
            )),
        )
        .await?;

        let result = response.result.ok_or_else(|| {
            LedgerError::MalformedResponse("evaluate response has no result".into())
        })?;
        if result.status >= 400 {
            return Err(LedgerError::ChaincodeResponse {
                status: result.status,
                message: result.message,
            });
        }
        Ok(result.payload)
    }

    async fn submit(&self, transaction: &str, args: &[&str]) -> LedgerResult<Vec<u8>> {
        let inner = self.inner();
        let proposal = new_proposal(
            &inner.identity,
            &self.channel,
            &self.chaincode,
            transaction,
            args,
        );
        let transaction_id = proposal.transaction_id.clone();
        tracing::debug!("submitting {} as transaction {}", transaction, transaction_id);
        let signed = proposal.sign(&inner.sign)?;

        let timeout = inner.timeouts.endorse;
        let mut client = inner.client.clone();
        let endorsed = call(
            Phase::Endorse,
            timeout,
            client.endorse(timed(
                EndorseRequest {
                    transaction_id: transaction_id.clone(),
                    channel_id: self.channel.clone(),
                    proposed_transaction: Some(signed),
                    endorsing_organizations: Vec::new(),
                },
                timeout,
            )),
        )
        .await?;

        let mut envelope = endorsed.prepared_transaction.ok_or_else(|| {
            LedgerError::MalformedResponse("endorse response has no prepared transaction".into())
        })?;
        let result = transaction::chaincode_result(&envelope)?;
        envelope.signature = sign_bytes(&inner.sign, &envelope.payload)?;

        let timeout = inner.timeouts.submit;
        call(
            Phase::Submit,
            timeout,
            client.submit(timed(
                SubmitRequest {
                    transaction_id: transaction_id.clone(),
                    channel_id: self.channel.clone(),
                    prepared_transaction: Some(envelope),
                },
                timeout,
            )),
        )
        .await?;

        self.commit_status(&transaction_id).await?;
        Ok(result)
    }
}

/// Connects to the gateway described by a [`GatewayConfig`].
#[derive(Clone, Debug)]
pub struct GatewayConnector {
    cfg: GatewayConfig,
}

impl GatewayConnector {
    pub fn new(cfg: GatewayConfig) -> Self {
        Self { cfg }
    }
}

#[tonic::async_trait]
impl Connector for GatewayConnector {
    type Contract = GatewayContract;

    async fn connect(&self) -> LedgerResult<GatewayContract> {
        let identity = load_identity(&self.cfg)?;
        let sign = load_sign(&self.cfg, &identity)?;
        let channel = new_grpc_connection(&self.cfg).await?;

        let gateway = Gateway::connect(identity, sign, channel, self.cfg.timeouts());
        let contract = gateway
            .network(self.cfg.channel())
            .contract(self.cfg.chaincode());
        gateway.close();
        Ok(contract)
    }
}

fn timed<T>(message: T, timeout: Duration) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request.set_timeout(timeout);
    request
}

/// Await a gateway call, mapping transport failures and elapsed deadlines to [`LedgerError`].
async fn call<T, F>(phase: Phase, timeout: Duration, fut: F) -> LedgerResult<T>
where
    F: Future<Output = Result<tonic::Response<T>, tonic::Status>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(response)) => Ok(response.into_inner()),
        Ok(Err(status)) if status.code() == tonic::Code::DeadlineExceeded => {
            Err(LedgerError::Timeout { phase, timeout })
        }
        Ok(Err(status)) => Err(LedgerError::remote(phase, status)),
        Err(_) => Err(LedgerError::Timeout { phase, timeout }),
    }
}
