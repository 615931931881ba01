//! Solidity ABI encoding for the handful of types the raffle components use.
//!
//! Supported: `address`, `uint256`, `bool`, `string` and dynamic arrays of
//! those. Tuples are flattened by the caller (a Solidity getter for
//! a struct returns its fields as a flat sequence).

use crate::types::{keccak256, Address, U256};
use crate::{EvmError, Result};

const WORD: usize = 32;

/// A decoded or to-be-encoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(U256),
    Bool(bool),
    String(String),
    Array(Vec<Token>),
}

/// The static type used to drive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint,
    Bool,
    String,
    Array(Box<ParamType>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::String(_) | Token::Array(_))
    }

    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_bool(self) -> Option<bool> {
        match self {
            Token::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Token>> {
        match self {
            Token::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// First four bytes of the Keccak-256 hash of a canonical function signature,
/// e.g. `"safeMint(address,string)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

/// Encode a sequence of tokens as a tuple (head/tail layout).
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend(U256::from((head_len + tail.len()) as u64).to_be_bytes());
            tail.extend(encode_dynamic(token));
        } else {
            head.extend(encode_static(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_static(token: &Token) -> [u8; WORD] {
    match token {
        Token::Address(a) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(a.as_bytes());
            word
        }
        Token::Uint(v) => v.to_be_bytes(),
        Token::Bool(b) => U256::from(*b).to_be_bytes(),
        Token::String(_) | Token::Array(_) => {
            unreachable!("dynamic token passed to encode_static")
        }
    }
}

fn encode_dynamic(token: &Token) -> Vec<u8> {
    match token {
        Token::String(s) => encode_byte_string(s.as_bytes()),
        Token::Array(items) => {
            let mut out = U256::from(items.len() as u64).to_be_bytes().to_vec();
            out.extend(encode(items));
            out
        }
        _ => encode_static(token).to_vec(),
    }
}

fn encode_byte_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = U256::from(bytes.len() as u64).to_be_bytes().to_vec();
    out.extend_from_slice(bytes);
    let pad = (WORD - bytes.len() % WORD) % WORD;
    out.extend(std::iter::repeat(0u8).take(pad));
    out
}

/// Decode `data` as a tuple of `types`.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>> {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| decode_at(ty, data, i * WORD))
        .collect()
}

/// Split return data into raw 32-byte words, for records whose layout is
/// owned by the remote contract.
pub fn decode_words(data: &[u8]) -> Result<Vec<U256>> {
    if data.len() % WORD != 0 {
        return Err(EvmError::Abi(format!(
            "return data length {} is not a multiple of 32",
            data.len()
        )));
    }
    data.chunks(WORD).map(U256::from_be_slice).collect()
}

/// `len` bytes starting at `start`. Both come from remote data.
fn span(data: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| {
            EvmError::Abi(format!(
                "read past end of data: offset {start}, length {len}, data {}",
                data.len()
            ))
        })
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8]> {
    span(data, offset, WORD)
}

fn usize_at(data: &[u8], offset: usize) -> Result<usize> {
    let v = U256::from_be_slice(word_at(data, offset)?)?;
    let n = u64::try_from(v).map_err(|e| EvmError::Abi(e.to_string()))?;
    usize::try_from(n).map_err(|e| EvmError::Abi(e.to_string()))
}

fn decode_at(ty: &ParamType, data: &[u8], offset: usize) -> Result<Token> {
    match ty {
        ParamType::Address => {
            let word = word_at(data, offset)?;
            Ok(Token::Address(Address::from_slice(&word[12..])?))
        }
        ParamType::Uint => Ok(Token::Uint(U256::from_be_slice(word_at(data, offset)?)?)),
        ParamType::Bool => {
            let v = U256::from_be_slice(word_at(data, offset)?)?;
            Ok(Token::Bool(!v.is_zero()))
        }
        ParamType::String => {
            let bytes = decode_byte_string(data, usize_at(data, offset)?)?;
            String::from_utf8(bytes)
                .map(Token::String)
                .map_err(|e| EvmError::Abi(format!("string is not UTF-8: {e}")))
        }
        ParamType::Array(inner) => {
            let start = usize_at(data, offset)?;
            let len = usize_at(data, start)?;
            let body = start
                .checked_add(WORD)
                .and_then(|from| data.get(from..))
                .ok_or_else(|| EvmError::Abi("array body out of range".into()))?;
            if len > body.len() / WORD {
                return Err(EvmError::Abi(format!(
                    "array of length {len} does not fit in {} bytes",
                    body.len()
                )));
            }
            let items = (0..len)
                .map(|i| decode_at(inner, body, i * WORD))
                .collect::<Result<Vec<_>>>()?;
            Ok(Token::Array(items))
        }
    }
}

fn decode_byte_string(data: &[u8], start: usize) -> Result<Vec<u8>> {
    let len = usize_at(data, start)?;
    let from = start
        .checked_add(WORD)
        .ok_or_else(|| EvmError::Abi(format!("byte string offset {start} out of range")))?;
    span(data, from, len).map(<[u8]>::to_vec)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
