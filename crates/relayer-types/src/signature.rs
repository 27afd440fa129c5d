use ethers::types::{Signature, H256, U256};
use serde::{Deserialize, Serialize};

/// The recovery byte of a signature. Wallets send it as a number, a decimal
/// string or a hex string like `0x1b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SignatureByte(pub u8);

impl SignatureByte {
    /// `0x00` and `0x01` show up as placeholders from wallets that did not
    /// produce a full signature.
    pub fn is_placeholder(&self) -> bool {
        self.0 <= 1
    }
}

impl<'de> Deserialize<'de> for SignatureByte {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SignatureByteVisitor;
        impl<'de> serde::de::Visitor<'de> for SignatureByteVisitor {
            type Value = SignatureByte;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str("a signature recovery byte")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u8::try_from(value).map(SignatureByte).map_err(|_| {
                    serde::de::Error::custom(format!(
                        "recovery byte out of range: {value}"
                    ))
                })
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let parsed = match value.strip_prefix("0x") {
                    Some(hex) => u8::from_str_radix(hex, 16),
                    None => value.parse::<u8>(),
                };
                parsed.map(SignatureByte).map_err(|e| {
                    serde::de::Error::custom(format!(
                        "invalid recovery byte {value}: {e}"
                    ))
                })
            }
        }

        deserializer.deserialize_any(SignatureByteVisitor)
    }
}

/// A signature split into its `r`, `s` and `v` components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParts {
    pub r: H256,
    pub s: H256,
    pub v: SignatureByte,
}

impl From<SignatureParts> for Signature {
    fn from(parts: SignatureParts) -> Self {
        Signature {
            r: U256::from_big_endian(parts.r.as_bytes()),
            s: U256::from_big_endian(parts.s.as_bytes()),
            v: u64::from(parts.v.0),
        }
    }
}

impl From<Signature> for SignatureParts {
    fn from(sig: Signature) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        sig.r.to_big_endian(&mut r);
        sig.s.to_big_endian(&mut s);
        SignatureParts {
            r: H256(r),
            s: H256(s),
            // Legacy and typed-data signatures carry 27 or 28 here.
            v: SignatureByte(sig.v as u8),
        }
    }
}

impl SignatureParts {
    /// Hex form of the 65 byte `r || s || v` encoding.
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(65);
        bytes.extend_from_slice(self.r.as_bytes());
        bytes.extend_from_slice(self.s.as_bytes());
        bytes.push(self.v.0);
        format!("0x{}", hex::encode(bytes))
    }
}
