//! Transaction proposal construction.
//!
//! A proposal names the chaincode function and its positional arguments, wrapped in headers
//! that identify the channel, the transaction and the creator. The transaction id is derived
//! from the creator and a fresh random nonce:
//!
//! `transaction_id = hex(SHA-256(nonce || serialized_creator))`
//!
//! so the ledger can detect replays.

use crate::constants::NONCE_LENGTH;
use crate::{Identity, LedgerResult, SignFn};
use chrono::{DateTime, Utc};
use nhms_proto::common::{ChannelHeader, Header, HeaderType, SignatureHeader};
use nhms_proto::peer::{
    ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec,
    ChaincodeProposalPayload, ChaincodeSpec, Proposal, SignedProposal,
};
use prost::Message;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// An encoded, not yet signed, proposal together with its transaction id.
#[derive(Clone, Debug)]
pub(crate) struct PreparedProposal {
    pub transaction_id: String,
    pub proposal_bytes: Vec<u8>,
}

impl PreparedProposal {
    pub fn sign(self, sign: &SignFn) -> LedgerResult<SignedProposal> {
        let signature = sign_bytes(sign, &self.proposal_bytes)?;
        Ok(SignedProposal {
            proposal_bytes: self.proposal_bytes,
            signature,
        })
    }
}

/// Build a proposal with a fresh nonce and the current time.
pub(crate) fn new_proposal(
    identity: &Identity,
    channel: &str,
    chaincode: &str,
    transaction: &str,
    args: &[&str],
) -> PreparedProposal {
    let mut nonce = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce);
    build_proposal(
        identity,
        channel,
        chaincode,
        transaction,
        args,
        &nonce,
        Utc::now(),
    )
}

fn build_proposal(
    identity: &Identity,
    channel: &str,
    chaincode: &str,
    transaction: &str,
    args: &[&str],
    nonce: &[u8],
    timestamp: DateTime<Utc>,
) -> PreparedProposal {
    let creator = identity.serialize();
    let transaction_id = transaction_id(nonce, &creator);
    let chaincode_id = ChaincodeId {
        name: chaincode.to_string(),
        ..Default::default()
    };

    let channel_header = ChannelHeader {
        r#type: HeaderType::EndorserTransaction as i32,
        timestamp: Some(prost_types::Timestamp {
            seconds: timestamp.timestamp(),
            nanos: timestamp.timestamp_subsec_nanos() as i32,
        }),
        channel_id: channel.to_string(),
        tx_id: transaction_id.clone(),
        extension: ChaincodeHeaderExtension {
            chaincode_id: Some(chaincode_id.clone()),
        }
        .encode_to_vec(),
        ..Default::default()
    };
    let signature_header = SignatureHeader {
        creator,
        nonce: nonce.to_vec(),
    };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };

    let input = ChaincodeInput {
        args: std::iter::once(transaction)
            .chain(args.iter().copied())
            .map(|arg| arg.as_bytes().to_vec())
            .collect(),
        ..Default::default()
    };
    let invocation = ChaincodeInvocationSpec {
        chaincode_spec: Some(ChaincodeSpec {
            chaincode_id: Some(chaincode_id),
            input: Some(input),
            ..Default::default()
        }),
    };
    let payload = ChaincodeProposalPayload {
        input: invocation.encode_to_vec(),
        ..Default::default()
    };

    let proposal = Proposal {
        header: header.encode_to_vec(),
        payload: payload.encode_to_vec(),
        extension: Vec::new(),
    };

    PreparedProposal {
        transaction_id,
        proposal_bytes: proposal.encode_to_vec(),
    }
}

pub(crate) fn transaction_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

/// Sign the SHA-256 digest of `message`.
pub(crate) fn sign_bytes(sign: &SignFn, message: &[u8]) -> LedgerResult<Vec<u8>> {
    let digest = Sha256::digest(message);
    sign.as_ref()(digest.as_slice())
}
