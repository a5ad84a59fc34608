//! Sealed-bid auction, the demo program hosted in the enclave.
//!
//! | function | args | result |
//! |---|---|---|
//! | `init` | name | `OK` |
//! | `submit` | name, bidder, value | `OK` |
//! | `close` | name | `OK` |
//! | `eval` | name | JSON [`AuctionResult`] |
//!
//! Bids stay inside the enclave until `eval`; the ledger only ever sees
//! their recorded writes.

use serde::{Deserialize, Serialize};
use veil_enclave::{EnclaveError, EnclaveResult, Program, ProgramStub};
use veil_types::keys::create_composite_key;

const OPEN: &[u8] = b"open";
const CLOSED: &[u8] = b"closed";
const OK: &[u8] = b"OK";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionResult {
    pub winner: String,
    pub value: u64,
}

#[derive(Debug, Default)]
pub struct AuctionProgram;

fn fail(message: impl Into<String>) -> EnclaveError {
    EnclaveError::Program(message.into())
}

fn key(object_type: &str, attributes: &[&str]) -> EnclaveResult<String> {
    Ok(create_composite_key(object_type, attributes)?)
}

impl AuctionProgram {
    fn status(stub: &mut dyn ProgramStub, name: &str) -> EnclaveResult<Option<Vec<u8>>> {
        stub.get_state(&key("auction", &[name])?)
    }

    fn bidders(stub: &mut dyn ProgramStub, name: &str) -> EnclaveResult<Vec<String>> {
        match stub.get_state(&key("bidders", &[name])?)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| fail(format!("bidder list: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    fn init(stub: &mut dyn ProgramStub, name: &str) -> EnclaveResult<Vec<u8>> {
        if Self::status(stub, name)?.is_some() {
            return Err(fail(format!("auction {} already exists", name)));
        }
        stub.put_state(&key("auction", &[name])?, OPEN.to_vec())?;
        Ok(OK.to_vec())
    }

    fn submit(stub: &mut dyn ProgramStub, name: &str, bidder: &str, value: &str) -> EnclaveResult<Vec<u8>> {
        if Self::status(stub, name)?.as_deref() != Some(OPEN) {
            return Err(fail(format!("auction {} is not open", name)));
        }
        let value: u64 = value
            .trim()
            .parse()
            .map_err(|_| fail(format!("bid {:?} is not a number", value)))?;

        let mut bidders = Self::bidders(stub, name)?;
        if !bidders.iter().any(|b| b == bidder) {
            bidders.push(bidder.to_string());
            let encoded = serde_json::to_vec(&bidders).map_err(|e| fail(e.to_string()))?;
            stub.put_state(&key("bidders", &[name])?, encoded)?;
        }
        stub.put_state(&key("bid", &[name, bidder])?, value.to_string().into_bytes())?;
        Ok(OK.to_vec())
    }

    fn close(stub: &mut dyn ProgramStub, name: &str) -> EnclaveResult<Vec<u8>> {
        if Self::status(stub, name)?.as_deref() != Some(OPEN) {
            return Err(fail(format!("auction {} is not open", name)));
        }
        stub.put_state(&key("auction", &[name])?, CLOSED.to_vec())?;
        Ok(OK.to_vec())
    }

    fn eval(stub: &mut dyn ProgramStub, name: &str) -> EnclaveResult<Vec<u8>> {
        if Self::status(stub, name)?.as_deref() != Some(CLOSED) {
            return Err(fail(format!("auction {} is not closed", name)));
        }
        let mut best: Option<AuctionResult> = None;
        for bidder in Self::bidders(stub, name)? {
            let bytes = stub
                .get_state(&key("bid", &[name, &bidder])?)?
                .ok_or_else(|| fail(format!("missing bid of {}", bidder)))?;
            let value: u64 = String::from_utf8_lossy(&bytes)
                .parse()
                .map_err(|_| fail(format!("corrupt bid of {}", bidder)))?;
            if best.as_ref().map_or(true, |b| value > b.value) {
                best = Some(AuctionResult { winner: bidder, value });
            }
        }
        let result = best.ok_or_else(|| fail(format!("auction {} has no bids", name)))?;
        serde_json::to_vec(&result).map_err(|e| fail(e.to_string()))
    }
}

impl Program for AuctionProgram {
    fn invoke(&self, stub: &mut dyn ProgramStub, function: &str, args: &[String]) -> EnclaveResult<Vec<u8>> {
        match (function, args) {
            ("init", [name]) => Self::init(stub, name),
            ("submit", [name, bidder, value]) => Self::submit(stub, name, bidder, value),
            ("close", [name]) => Self::close(stub, name),
            ("eval", [name]) => Self::eval(stub, name),
            _ => Err(fail(format!("{}/{} is not an auction function", function, args.len()))),
        }
    }
}
