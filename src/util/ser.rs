//! Helpful serialization tools.
//!
//! The registry's records are plain serde types; the helpers here give them a
//! human-readable (yaml) form where fixed-size binary values (ids, merkle
//! roots, proof hashes) render as base64 strings instead of byte arrays.

use crate::error::Result;
use serde::{Serialize, de::DeserializeOwned};

pub(crate) fn serialize_human<T: Serialize>(obj: &T) -> Result<String> {
    Ok(serde_yaml::to_string(obj)?)
}

pub(crate) fn deserialize_human<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_yaml::from_slice(bytes)?)
}

/// Convert bytes to base64
pub fn base64_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes.as_ref())
}

/// Convert base64 to bytes
pub fn base64_decode<T: AsRef<[u8]>>(bytes: T) -> Result<Vec<u8>> {
    use base64::Engine;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bytes.as_ref())?)
}

/// (De)serializes a `[u8; 32]` as base64 when the format is human-readable,
/// raw bytes otherwise.
pub(crate) mod fixed_bytes {
    use super::{base64_encode, base64_decode};
    use serde::{Serializer, de, Deserialize, Deserializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&base64_encode(bytes))
        } else {
            serde::Serialize::serialize(bytes, serializer)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
        where D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = <String>::deserialize(deserializer)?;
            let vec = base64_decode(s).map_err(de::Error::custom)?;
            let arr: [u8; 32] = vec.as_slice().try_into()
                .map_err(|_| de::Error::custom(String::from("bad slice length")))?;
            Ok(arr)
        } else {
            <[u8; 32]>::deserialize(deserializer)
        }
    }
}

/// A default implementation for serializing an object to and from a
/// human-readable string.
pub trait SerdeHuman: Serialize + DeserializeOwned {
    /// Serialize this object into yaml
    fn serialize_human(&self) -> Result<String> {
        serialize_human(self)
    }

    /// Deserialize this object from yaml
    fn deserialize_human(slice: &[u8]) -> Result<Self> {
        deserialize_human(slice)
    }
}
