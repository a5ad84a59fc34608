//! EPID quote body layout.
//!
//! ```text
//! offset  size  field
//!      0     2  version
//!      2     2  sign_type (0 = unlinkable, 1 = linkable)
//!      4     4  epid_group_id
//!      8     2  qe_svn
//!     10     2  pce_svn
//!     12     4  xeid
//!     16    32  basename
//!     48   384  report body
//!    112    32    mr_enclave   (report body + 64)
//!    368    64    report_data  (report body + 320)
//! ```

use crate::envelope::{EPID_LINKABLE, EPID_UNLINKABLE};
use crate::error::{AttestationError, AttestationResult};

pub const QUOTE_BODY_LEN: usize = 432;
const SIGN_TYPE_OFFSET: usize = 2;
const BASENAME_OFFSET: usize = 16;
const MR_ENCLAVE_OFFSET: usize = 112;
const REPORT_DATA_OFFSET: usize = 368;
const QUOTE_VERSION: u16 = 2;

pub const SIGN_TYPE_UNLINKABLE: u16 = 0;
pub const SIGN_TYPE_LINKABLE: u16 = 1;

/// Sign type an EPID scheme tag implies.
pub fn sign_type_for(scheme: &str) -> Option<u16> {
    match scheme {
        EPID_LINKABLE => Some(SIGN_TYPE_LINKABLE),
        EPID_UNLINKABLE => Some(SIGN_TYPE_UNLINKABLE),
        _ => None,
    }
}

/// Fields of a quote body that verification looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteBody {
    pub sign_type: u16,
    pub mr_enclave: [u8; 32],
    pub report_data: [u8; 64],
}

impl QuoteBody {
    /// Parses the fixed-size body; trailing signature bytes are ignored.
    pub fn parse(bytes: &[u8]) -> AttestationResult<Self> {
        if bytes.len() < QUOTE_BODY_LEN {
            return Err(AttestationError::InvalidEvidence(format!(
                "quote body is {} bytes, need {}",
                bytes.len(),
                QUOTE_BODY_LEN
            )));
        }
        let sign_type = u16::from_le_bytes([bytes[SIGN_TYPE_OFFSET], bytes[SIGN_TYPE_OFFSET + 1]]);
        let mut mr_enclave = [0u8; 32];
        mr_enclave.copy_from_slice(&bytes[MR_ENCLAVE_OFFSET..MR_ENCLAVE_OFFSET + 32]);
        let mut report_data = [0u8; 64];
        report_data.copy_from_slice(&bytes[REPORT_DATA_OFFSET..REPORT_DATA_OFFSET + 64]);
        Ok(Self {
            sign_type,
            mr_enclave,
            report_data,
        })
    }

    /// Serializes into the quote layout, with `basename` seeded from the SPID.
    pub fn to_bytes(&self, spid: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; QUOTE_BODY_LEN];
        out[0..2].copy_from_slice(&QUOTE_VERSION.to_le_bytes());
        out[SIGN_TYPE_OFFSET..SIGN_TYPE_OFFSET + 2].copy_from_slice(&self.sign_type.to_le_bytes());
        let n = spid.len().min(32);
        out[BASENAME_OFFSET..BASENAME_OFFSET + n].copy_from_slice(&spid[..n]);
        out[MR_ENCLAVE_OFFSET..MR_ENCLAVE_OFFSET + 32].copy_from_slice(&self.mr_enclave);
        out[REPORT_DATA_OFFSET..REPORT_DATA_OFFSET + 64].copy_from_slice(&self.report_data);
        out
    }
}

/// Report data binding `statement`: SHA-256 digest followed by zeros.
pub fn report_data_for(statement: &[u8]) -> [u8; 64] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(&veil_types::sha256(statement));
    data
}
