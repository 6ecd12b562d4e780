//! Reading the chaincode result out of an endorsed transaction.
//!
//! The gateway's `Endorse` call returns the transaction ready for ordering, but not the
//! chaincode's return value on its own. That value sits several encodings deep:
//!
//! `Envelope.payload -> Payload.data -> Transaction.actions[0].payload -> ChaincodeActionPayload
//!  .action.proposal_response_payload -> ProposalResponsePayload.extension -> ChaincodeAction
//!  .response.payload`

use crate::{LedgerError, LedgerResult};
use nhms_proto::common::{Envelope, Payload};
use nhms_proto::peer::{
    ChaincodeAction, ChaincodeActionPayload, ProposalResponsePayload, Transaction,
};
use prost::Message;

pub(crate) fn chaincode_result(envelope: &Envelope) -> LedgerResult<Vec<u8>> {
    let payload = Payload::decode(envelope.payload.as_slice())?;
    let transaction = Transaction::decode(payload.data.as_slice())?;
    let action = transaction.actions.first().ok_or_else(|| {
        LedgerError::MalformedResponse("prepared transaction has no actions".into())
    })?;

    let action_payload = ChaincodeActionPayload::decode(action.payload.as_slice())?;
    let endorsed = action_payload.action.ok_or_else(|| {
        LedgerError::MalformedResponse("prepared transaction has no endorsed action".into())
    })?;
    let response_payload =
        ProposalResponsePayload::decode(endorsed.proposal_response_payload.as_slice())?;
    let chaincode_action = ChaincodeAction::decode(response_payload.extension.as_slice())?;

    Ok(chaincode_action
        .response
        .map(|response| response.payload)
        .unwrap_or_default())
}
