//! Composite ledger keys.
//!
//! The ledger form is `\0type\0attr1\0attr2\0`. Inside the enclave the
//! separator is `.` instead, giving `.type.attr1.attr2.`, so replay has to
//! map enclave keys back to the ledger form before touching state.
//!
//! Neither separator may appear inside a component, and a plain key may not
//! look like an enclave composite key; either would make the mapping ambiguous.

use crate::error::{TypesError, TypesResult};

const LEDGER_SEPARATOR: char = '\u{0}';
const ENCLAVE_SEPARATOR: char = '.';

pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> TypesResult<String> {
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(LEDGER_SEPARATOR);
    for part in std::iter::once(&object_type).chain(attributes.iter()) {
        if part.contains(LEDGER_SEPARATOR) || part.contains(ENCLAVE_SEPARATOR) {
            return Err(TypesError::CompositeKey(format!(
                "component {:?} contains a separator",
                part
            )));
        }
        key.push_str(part);
        key.push(LEDGER_SEPARATOR);
    }
    Ok(key)
}

/// Prefix matching every composite key of `object_type` starting with `attributes`.
pub fn composite_key_prefix(object_type: &str, attributes: &[&str]) -> TypesResult<String> {
    create_composite_key(object_type, attributes)
}

pub fn split_composite_key(key: &str) -> TypesResult<(String, Vec<String>)> {
    if !is_composite_key(key) {
        return Err(TypesError::CompositeKey(format!("{:?} is not a composite key", key)));
    }
    let inner = &key[1..key.len() - 1];
    let mut parts = inner.split(LEDGER_SEPARATOR).map(str::to_string);
    let object_type = parts.next().unwrap_or_default();
    Ok((object_type, parts.collect()))
}

pub fn is_composite_key(key: &str) -> bool {
    key.len() >= 2 && key.starts_with(LEDGER_SEPARATOR) && key.ends_with(LEDGER_SEPARATOR)
}

/// Enclave-side spelling of a ledger key.
pub fn to_enclave_key(key: &str) -> TypesResult<String> {
    if is_composite_key(key) {
        if key.contains(ENCLAVE_SEPARATOR) {
            return Err(TypesError::CompositeKey(format!(
                "{:?} has a component containing {:?}",
                key, ENCLAVE_SEPARATOR
            )));
        }
        return Ok(key.replace(LEDGER_SEPARATOR, &ENCLAVE_SEPARATOR.to_string()));
    }
    if key.contains(LEDGER_SEPARATOR) || is_enclave_composite_key(key) {
        return Err(TypesError::CompositeKey(format!("{:?} is not a valid plain key", key)));
    }
    Ok(key.to_string())
}

pub fn is_enclave_composite_key(key: &str) -> bool {
    key.len() >= 2 && key.starts_with(ENCLAVE_SEPARATOR) && key.ends_with(ENCLAVE_SEPARATOR)
}

/// Resolves a key written by an enclave into the ledger key it refers to.
pub fn to_ledger_key(enclave_key: &str) -> TypesResult<String> {
    if !is_enclave_composite_key(enclave_key) {
        return Ok(enclave_key.to_string());
    }
    let inner = &enclave_key[1..enclave_key.len() - 1];
    let mut parts = inner.split(ENCLAVE_SEPARATOR);
    let object_type = parts.next().unwrap_or_default();
    if object_type.is_empty() {
        return Err(TypesError::CompositeKey(format!(
            "{:?} has no object type",
            enclave_key
        )));
    }
    let attributes: Vec<&str> = parts.collect();
    create_composite_key(object_type, &attributes)
}
