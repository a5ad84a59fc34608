//! # Veil Client
//!
//! Client side of confidential invocation:
//!
//! ```text
//! KeySource ──► EncryptionProvider::new_context(program_id)
//!                  │
//!                  ▼
//!            EncryptionContext::conceal(function, args)   (single use)
//!                  │   base64 request ──► enclave ──► signed response
//!                  ▼
//!            ConcealedRequest::reveal(signed_response)    (single use)
//! ```

pub mod error;
pub mod keys;
pub mod protocol;

pub use error::{ClientError, ClientResult};
pub use keys::{CachedKeySource, KeySource, RegistryKeySource};
pub use protocol::{ConcealedRequest, EncryptionContext, EncryptionProvider};
