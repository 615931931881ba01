use k256::ecdsa::{RecoveryId, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::rlp;
use crate::types::{decode_hex, keccak256, Address, U256};
use crate::{EvmError, Result};

// ─── LegacyTransaction ────────────────────────────────────────────────────

/// A pre-London (type 0) transaction, replay-protected with EIP-155.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn base_fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::encode_u64(self.nonce),
            rlp::encode_uint(self.gas_price.to_minimal_be()),
            rlp::encode_u64(self.gas),
            match &self.to {
                Some(to) => rlp::encode_bytes(to.as_bytes()),
                None => rlp::encode_bytes(&[]),
            },
            rlp::encode_uint(self.value.to_minimal_be()),
            rlp::encode_bytes(&self.data),
        ]
    }

    /// Keccak-256 of `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut fields = self.base_fields();
        fields.push(rlp::encode_u64(self.chain_id));
        fields.push(rlp::encode_u64(0));
        fields.push(rlp::encode_u64(0));
        keccak256(&rlp::encode_list(&fields))
    }
}

// ─── Wallet ───────────────────────────────────────────────────────────────

/// A secp256k1 signing identity and its derived address.
pub struct Wallet {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Parse a 32-byte private key given as (optionally `0x`-prefixed) hex.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let bytes = decode_hex(private_key)?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| EvmError::Signer(format!("invalid private key: {e}")))?;
        let address = address_of(&key);
        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign `tx` and return the raw RLP bytes ready for `eth_sendRawTransaction`.
    pub fn sign_legacy(&self, tx: &LegacyTransaction) -> Result<Vec<u8>> {
        let hash = tx.signing_hash();
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| EvmError::Signer(e.to_string()))?;

        // Ethereum only accepts low-s signatures.
        let (sig, recid) = match sig.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced()),
            ),
            None => (sig, recid),
        };

        let v = u64::from(recid.to_byte()) + 35 + tx.chain_id * 2;
        let rs = sig.to_bytes();

        let mut fields = tx.base_fields();
        fields.push(rlp::encode_u64(v));
        fields.push(rlp::encode_uint(&rs[..32]));
        fields.push(rlp::encode_uint(&rs[32..]));
        Ok(rlp::encode_list(&fields))
    }
}

fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().as_affine().to_encoded_point(false);
    // Uncompressed SEC1: 0x04 || X || Y; hash the 64 coordinate bytes.
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_known_addresses() {
        let one = Wallet::from_hex(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(
            one.address().to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );

        let hardhat0 = Wallet::from_hex(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            hardhat0.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(Wallet::from_hex("0x1234").is_err());
        assert!(Wallet::from_hex("zz").is_err());
        assert!(Wallet::from_hex(&"00".repeat(32)).is_err());
    }

    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas: 21_000,
            to: Some("0x3535353535353535353535353535353535353535".parse().unwrap()),
            value: U256::from(1_000_000_000_000_000_000u128),
            data: vec![],
            chain_id: 1,
        }
    }

    #[test]
    fn eip155_signing_hash() {
        assert_eq!(
            hex::encode(eip155_example().signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn eip155_signed_transaction() {
        let wallet = Wallet::from_hex(&"46".repeat(32)).unwrap();
        let raw = wallet.sign_legacy(&eip155_example()).unwrap();
        assert_eq!(
            hex::encode(raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn debug_does_not_leak_key() {
        let wallet = Wallet::from_hex(&"46".repeat(32)).unwrap();
        let dbg = format!("{wallet:?}");
        assert!(!dbg.contains("4646"));
    }
}
