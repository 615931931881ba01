use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::{EvmError, Result};

/// Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode an optionally `0x`-prefixed hex string.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(strip_0x(s.trim()))?)
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address.
///
/// Parsing accepts any letter case; `Display` renders the EIP-55 checksum form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| {
            EvmError::InvalidValue(format!("address must be 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = EvmError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)?;
        Address::from_slice(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// B256
// ---------------------------------------------------------------------------

/// A 32-byte hash (transaction hash, block hash).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct B256([u8; 32]);

pub type TxHash = B256;

impl B256 {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for B256 {
    type Err = EvmError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            EvmError::InvalidValue(format!("hash must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for B256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl fmt::Debug for B256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B256({})", encode_hex(&self.0))
    }
}

impl Serialize for B256 {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&encode_hex(&self.0))
    }
}

impl<'de> Deserialize<'de> for B256 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// U256
// ---------------------------------------------------------------------------

/// Unsigned 256-bit integer stored big-endian.
///
/// Only the operations the client needs are provided: conversion to and from
/// native integers, decimal/hex text, and JSON-RPC quantity encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct U256([u8; 32]);

impl U256 {
    pub const ZERO: U256 = U256([0u8; 32]);

    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Left-pads a big-endian slice of at most 32 bytes.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > 32 {
            return Err(EvmError::InvalidValue(format!(
                "integer wider than 256 bits ({} bytes)",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Big-endian bytes with leading zeros removed (empty for zero).
    pub fn to_minimal_be(&self) -> &[u8] {
        let first = self.0.iter().position(|b| *b != 0).unwrap_or(32);
        &self.0[first..]
    }

    /// JSON-RPC quantity encoding: `0x`-prefixed hex without leading zeros.
    pub fn to_quantity(&self) -> String {
        let digits = hex::encode(self.to_minimal_be());
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{trimmed}")
        }
    }

    /// Subtract one, returning `None` on zero.
    pub fn checked_dec(&self) -> Option<U256> {
        if self.is_zero() {
            return None;
        }
        let mut out = self.0;
        for b in out.iter_mut().rev() {
            if *b == 0 {
                *b = 0xff;
            } else {
                *b -= 1;
                break;
            }
        }
        Some(U256(out))
    }

    fn from_hex_str(digits: &str) -> Result<Self> {
        if digits.is_empty() {
            return Err(EvmError::InvalidValue("empty hex integer".into()));
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(padded)?;
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        U256::from_be_slice(&bytes[first..])
    }

    fn from_dec_str(digits: &str) -> Result<Self> {
        if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
            return Err(EvmError::InvalidValue(format!(
                "invalid decimal integer '{digits}'"
            )));
        }
        let mut out = [0u8; 32];
        for c in digits.bytes() {
            // out = out * 10 + digit
            let mut carry = u16::from(c - b'0');
            for b in out.iter_mut().rev() {
                let v = u16::from(*b) * 10 + carry;
                *b = (v & 0xff) as u8;
                carry = v >> 8;
            }
            if carry != 0 {
                return Err(EvmError::InvalidValue(format!(
                    "decimal integer '{digits}' overflows 256 bits"
                )));
            }
        }
        Ok(U256(out))
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        let mut out = [0u8; 32];
        out[16..].copy_from_slice(&v.to_be_bytes());
        Self(out)
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        U256::from(u128::from(v))
    }
}

impl From<bool> for U256 {
    fn from(v: bool) -> Self {
        U256::from(u64::from(v))
    }
}

impl TryFrom<U256> for u128 {
    type Error = EvmError;

    fn try_from(v: U256) -> Result<u128> {
        if v.0[..16].iter().any(|b| *b != 0) {
            return Err(EvmError::InvalidValue(format!("{v} does not fit in 128 bits")));
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&v.0[16..]);
        Ok(u128::from_be_bytes(buf))
    }
}

impl TryFrom<U256> for u64 {
    type Error = EvmError;

    fn try_from(v: U256) -> Result<u64> {
        let wide = u128::try_from(v)?;
        u64::try_from(wide)
            .map_err(|_| EvmError::InvalidValue(format!("{v} does not fit in 64 bits")))
    }
}

impl FromStr for U256 {
    type Err = EvmError;

    /// Accepts `0x`-prefixed hex or plain decimal.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(hex_digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            U256::from_hex_str(hex_digits)
        } else {
            U256::from_dec_str(s)
        }
    }
}

impl fmt::Display for U256 {
    /// Decimal rendering by repeated division of the big-endian bytes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut n = self.0;
        let mut digits = Vec::new();
        while n.iter().any(|b| *b != 0) {
            let mut rem = 0u16;
            for b in n.iter_mut() {
                let acc = (rem << 8) | u16::from(*b);
                *b = (acc / 10) as u8;
                rem = acc % 10;
            }
            digits.push(b'0' + rem as u8);
        }
        digits.reverse();
        f.write_str(std::str::from_utf8(&digits).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({self})")
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Ether amounts
// ---------------------------------------------------------------------------

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Parse a decimal ether amount (e.g. `"0.05"`) into wei.
pub fn parse_ether(s: &str) -> Result<u128> {
    let s = s.trim();
    let invalid = || EvmError::InvalidValue(format!("invalid ether amount '{s}'"));
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|c| c.is_ascii_digit()) || !frac.bytes().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 18 {
        return Err(EvmError::InvalidValue(format!(
            "ether amount '{s}' has more than 18 decimals"
        )));
    }
    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| invalid())?
            .checked_mul(WEI_PER_ETHER)
            .ok_or_else(invalid)?
    };
    let frac_wei = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<18}").parse::<u128>().map_err(|_| invalid())?
    };
    whole_wei.checked_add(frac_wei).ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// TxReceipt
// ---------------------------------------------------------------------------

/// The subset of `eth_getTransactionReceipt` the orchestrator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    #[serde(with = "quantity")]
    pub block_number: u64,
    #[serde(with = "quantity")]
    pub status: u64,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(with = "quantity", default)]
    pub gas_used: u64,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}

/// Parse a JSON-RPC hex quantity into `u64`.
pub fn parse_quantity(s: &str) -> Result<u64> {
    let digits = strip_0x(s.trim());
    if digits.is_empty() {
        return Err(EvmError::InvalidValue(format!("empty quantity '{s}'")));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| EvmError::InvalidValue(format!("invalid quantity '{s}': {e}")))
}

/// Serde helpers for `u64` fields carried as hex quantities.
pub mod quantity {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{v:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let s = String::deserialize(d)?;
        super::parse_quantity(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
