//! Response data types produced by the decoder.

use crate::error::DecodeError;
use crate::flags::Flags;

/// The two-byte return code that begins every response line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnCode {
    /// Success / stored.
    HD,
    /// Not stored (add collision, or replace on a missing key).
    NS,
    /// Exists (compare-and-swap style conflict).
    EX,
    /// Not found.
    NF,
    /// Value follows.
    VA,
    /// Miss (meta-get with no item).
    EN,
}

impl ReturnCode {
    pub(crate) fn parse(bytes: [u8; 2]) -> Result<Self, DecodeError> {
        match &bytes {
            b"HD" => Ok(Self::HD),
            b"NS" => Ok(Self::NS),
            b"EX" => Ok(Self::EX),
            b"NF" => Ok(Self::NF),
            b"VA" => Ok(Self::VA),
            b"EN" => Ok(Self::EN),
            _ => Err(DecodeError::MalformedReturnCode(bytes)),
        }
    }
}

/// A fully decoded meta-protocol response line (and payload, for `VA`).
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    /// The response's return code.
    pub return_code: ReturnCode,
    /// The payload length, present iff `return_code == VA`.
    pub data_length: Option<u64>,
    /// Any flag tokens the server echoed back.
    pub flags: Flags,
    /// The value payload, present iff `return_code == VA`.
    pub value: Option<Vec<u8>>,
}
