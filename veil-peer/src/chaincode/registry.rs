//! Enclave registry chaincode.

use std::sync::Arc;

use veil_registry::EnclaveRegistry;
use veil_storage::ChaincodeStub;
use veil_types::to_base64;

use crate::chaincode::expect_args;
use crate::error::{PeerError, PeerResult};

pub const REGISTER_ENCLAVE: &str = "registerEnclave";
pub const QUERY_ENCLAVE_CREDENTIALS: &str = "queryEnclaveCredentials";
pub const QUERY_LIST_ENCLAVE_CREDENTIALS: &str = "queryListEnclaveCredentials";
pub const QUERY_CHAINCODE_ENCRYPTION_KEY: &str = "queryChaincodeEncryptionKey";
pub const QUERY_CHAINCODE_END_POINTS: &str = "queryChaincodeEndPoints";
pub const QUERY_LIST_PROVISIONED_ENCLAVES: &str = "queryListProvisionedEnclaves";

pub struct RegistryChaincode {
    registry: Arc<EnclaveRegistry>,
}

impl RegistryChaincode {
    pub fn new(registry: Arc<EnclaveRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<EnclaveRegistry> {
        &self.registry
    }

    pub fn invoke(&self, stub: &dyn ChaincodeStub, function: &str, args: &[String]) -> PeerResult<Vec<u8>> {
        let state = stub.as_state();
        match function {
            REGISTER_ENCLAVE => {
                let [credentials] = expect_args::<1>(function, args)?;
                self.registry.register_enclave(stub, credentials)?;
                Ok(Vec::new())
            }
            QUERY_ENCLAVE_CREDENTIALS => {
                let [program_id, enclave_id] = expect_args::<2>(function, args)?;
                let credentials = self.registry.get_credentials(state, program_id, enclave_id)?;
                Ok(credentials.to_base64().into_bytes())
            }
            QUERY_LIST_ENCLAVE_CREDENTIALS => {
                let [program_id] = expect_args::<1>(function, args)?;
                let list: Vec<String> = self
                    .registry
                    .list_credentials(state, program_id)?
                    .iter()
                    .map(|c| c.to_base64())
                    .collect();
                json(&list)
            }
            QUERY_CHAINCODE_ENCRYPTION_KEY => {
                let [program_id] = expect_args::<1>(function, args)?;
                let key = self.registry.get_encryption_key(state, program_id)?;
                Ok(to_base64(key).into_bytes())
            }
            QUERY_CHAINCODE_END_POINTS => {
                let [program_id] = expect_args::<1>(function, args)?;
                Ok(self.registry.endpoints(state, program_id)?.into_bytes())
            }
            QUERY_LIST_PROVISIONED_ENCLAVES => {
                let [program_id] = expect_args::<1>(function, args)?;
                json(&self.registry.list_provisioned(state, program_id)?)
            }
            other => Err(PeerError::UnknownFunction(other.to_string())),
        }
    }
}

fn json(list: &[String]) -> PeerResult<Vec<u8>> {
    Ok(serde_json::to_vec(list)?)
}
