use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// SHA-256 over the canonical form of a set of fields.
///
/// Each field is rendered as JSON with object keys sorted at every depth, the
/// renderings are sorted, then joined with a single space. Argument order and
/// nested key order therefore never change the digest.
pub fn canonical_digest(fields: &[&Value]) -> [u8; 32] {
    let mut rendered: Vec<String> = fields
        .iter()
        .map(|f| canonicalize(f).to_string())
        .collect();
    rendered.sort();

    let mut hasher = Sha256::new();
    hasher.update(rendered.join(" ").as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Hex form of [`canonical_digest`]; this is what block hashes are made of.
pub fn crypto_hash(fields: &[&Value]) -> String {
    hex::encode(canonical_digest(fields))
}

/// Rebuilds objects with their keys inserted in sorted order, so the rendering
/// does not depend on how serde_json's map is backed.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn digest_of<T: Serialize>(data: &T) -> Result<[u8; 32]> {
    let value = serde_json::to_value(data).map_err(|e| LedgerError::Crypto(e.to_string()))?;
    Ok(canonical_digest(&[&value]))
}

/// Generate a fresh secp256k1 keypair.
pub fn generate_keypair() -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    secp.generate_keypair(&mut OsRng)
}

/// Address of a public key: hex of its compressed (33 byte) form.
pub fn public_key_hex(pk: &PublicKey) -> String {
    hex::encode(pk.serialize())
}

/// Sign the canonical digest of `data`, returning hex-encoded DER.
pub fn sign<T: Serialize>(sk: &SecretKey, data: &T) -> Result<String> {
    let secp = Secp256k1::signing_only();
    let digest = digest_of(data)?;
    let msg =
        Message::from_digest_slice(&digest).map_err(|e| LedgerError::Crypto(e.to_string()))?;
    let sig = secp.sign_ecdsa(&msg, sk);
    Ok(hex::encode(&*sig.serialize_der()))
}

/// Verify a hex DER signature over `data` under a hex public key.
/// Malformed keys or signatures simply fail verification.
pub fn verify_signature<T: Serialize>(public_key: &str, data: &T, signature: &str) -> bool {
    match try_verify(public_key, data, signature) {
        Ok(ok) => ok,
        Err(msg) => {
            log::debug!("signature check failed for {public_key}: {msg}");
            false
        }
    }
}

fn try_verify<T: Serialize>(
    public_key: &str,
    data: &T,
    signature: &str,
) -> std::result::Result<bool, &'static str> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(signature).map_err(|_| "invalid signature hex")?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| "invalid DER signature")?;

    let pk_bytes = hex::decode(public_key).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| "invalid pubkey bytes")?;

    let digest = digest_of(data).map_err(|_| "data not serializable")?;
    let msg = Message::from_digest_slice(&digest).map_err(|_| "invalid message length")?;
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

/// Number of leading zero bits in a hex-encoded hash. Anything that is not
/// valid hex counts as zero.
pub fn count_leading_zero_bits(hash_hex: &str) -> u32 {
    let Ok(bytes) = hex::decode(hash_hex) else {
        return 0;
    };
    let mut total = 0u32;
    for b in bytes {
        if b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hashes_to_known_sha256() {
        assert_eq!(
            crypto_hash(&[&json!("foo-bar")]),
            "291ad95de298fed69e1c8425874cbdf1f4205136978e5e31b7e7e41078b60fc7"
        );
    }

    #[test]
    fn same_output_irrespective_of_argument_order() {
        let a = crypto_hash(&[&json!("one"), &json!("two"), &json!("three")]);
        let b = crypto_hash(&[&json!("two"), &json!("three"), &json!("one")]);
        assert_eq!(a, b);
    }

    #[test]
    fn nested_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b":{"y":1,"x":2},"a":[{"q":1,"p":0}]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":[{"p":0,"q":1}],"b":{"x":2,"y":1}}"#).unwrap();
        assert_eq!(crypto_hash(&[&a]), crypto_hash(&[&b]));
    }

    #[test]
    fn changes_when_a_property_is_added() {
        let mut foo = json!({});
        let original = crypto_hash(&[&foo]);
        foo["a"] = json!("a");
        assert_ne!(crypto_hash(&[&foo]), original);
    }

    #[test]
    fn deterministic_for_equal_input() {
        let v = json!({"amount": 10, "to": "bob"});
        assert_eq!(crypto_hash(&[&v]), crypto_hash(&[&v.clone()]));
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let (sk, pk) = generate_keypair();
        let address = public_key_hex(&pk);
        let data = json!({"recipient": 25});

        let sig = sign(&sk, &data).unwrap();
        assert!(verify_signature(&address, &data, &sig));
        assert!(!verify_signature(&address, &json!({"recipient": 26}), &sig));
    }

    #[test]
    fn signature_from_another_key_is_rejected() {
        let (sk, _) = generate_keypair();
        let (_, other_pk) = generate_keypair();
        let sig = sign(&sk, &"data").unwrap();
        assert!(!verify_signature(&public_key_hex(&other_pk), &"data", &sig));
    }

    #[test]
    fn garbage_signature_is_rejected_not_panicking() {
        let (_, pk) = generate_keypair();
        assert!(!verify_signature(&public_key_hex(&pk), &"data", "zz-not-hex"));
        assert!(!verify_signature("nope", &"data", "3044"));
    }

    #[test]
    fn leading_zero_bits_examples() {
        assert_eq!(count_leading_zero_bits(&"00".repeat(32)), 256);
        assert_eq!(count_leading_zero_bits("0f"), 4);
        assert_eq!(count_leading_zero_bits("0080"), 8);
        assert_eq!(count_leading_zero_bits("0040"), 9);
        assert_eq!(count_leading_zero_bits("hash-one"), 0);
    }
}
