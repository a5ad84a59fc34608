//! Business logic hosted by an enclave.

use crate::error::EnclaveResult;

/// State access available to a program while it runs.
///
/// Reads come from the ledger as of invocation time; writes are only recorded
/// and take effect when the response is endorsed.
pub trait ProgramStub {
    fn get_state(&mut self, key: &str) -> EnclaveResult<Option<Vec<u8>>>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> EnclaveResult<()>;

    fn del_state(&mut self, key: &str) -> EnclaveResult<()>;
}

pub trait Program: Send + Sync {
    /// Runs `function` and returns the cleartext result handed back to the client.
    fn invoke(&self, stub: &mut dyn ProgramStub, function: &str, args: &[String]) -> EnclaveResult<Vec<u8>>;
}
