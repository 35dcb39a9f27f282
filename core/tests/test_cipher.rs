// Cipher bean over whole buffers: round trips, header policy, key errors, tampering.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};
    use std::thread;

    use ciphertext_core::cipher::{encrypt_with_key, BeanConfig, CipherBean, HeaderPolicy};
    use ciphertext_core::crypto::{
        CipherEngine, CipherSuite, CounterNonce, KeyError, KeyRing, NonceSource, RandomNonce,
        SharedKeyResolver, SymmetricKey,
    };
    use ciphertext_core::headers::{self, HeaderVersion};
    use ciphertext_core::types::{AuthFailure, CryptoError, Result};

    /// Always hands out the same nonce.
    struct FixedNonce(Vec<u8>);

    impl NonceSource for FixedNonce {
        fn generate(&self) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn length(&self) -> usize {
            self.0.len()
        }
    }

    fn key_for(suite: CipherSuite) -> SymmetricKey {
        SymmetricKey::new(vec![0x24; suite.key_len()])
    }

    fn bean(suite: CipherSuite, policy: HeaderPolicy) -> CipherBean {
        let ring: SharedKeyResolver = Arc::new(KeyRing::new().with_key("k1", key_for(suite)));
        let nonces = Arc::new(RandomNonce::new(suite.nonce_len()).unwrap());
        let config = BeanConfig::new("k1").with_suite(suite).with_header_policy(policy);
        CipherBean::from_config(config, ring, nonces).unwrap()
    }

    #[test]
    fn every_suite_roundtrips_edge_lengths() {
        for suite in CipherSuite::ALL {
            for policy in [HeaderPolicy::Plain, HeaderPolicy::Authenticated] {
                let bean = bean(suite, policy);
                for len in [0usize, 1, 15, 16, 17, 3000] {
                    let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
                    let ct = bean.encrypt(&plaintext).unwrap();
                    let pt = bean.decrypt(&ct).unwrap();
                    assert_eq!(pt, plaintext, "{suite} {policy:?} len={len}");
                }
            }
        }
    }

    #[test]
    fn gcm_hello_scenario() {
        let ring: SharedKeyResolver =
            Arc::new(KeyRing::new().with_key("k1", SymmetricKey::new(vec![0u8; 16])));
        let config = BeanConfig::new("k1").with_suite(CipherSuite::Aes128Gcm);
        let bean =
            CipherBean::from_config(config.clone(), ring, Arc::new(FixedNonce(vec![0u8; 12]))).unwrap();

        let ct = bean.encrypt(b"hello").unwrap();
        let header_len = 8 + 12 + 4 + 2;
        // The GCM engine always emits full 16-byte tags.
        assert_eq!(ct.len(), header_len + 5 + 16);
        assert_eq!(&ct[..4], &(header_len as u32).to_be_bytes());
        assert_eq!(bean.decrypt(&ct).unwrap(), b"hello");

        let rotated: SharedKeyResolver =
            Arc::new(KeyRing::new().with_key("k1", SymmetricKey::new(vec![1u8; 16])));
        let other = CipherBean::from_config(config, rotated, Arc::new(FixedNonce(vec![0u8; 12]))).unwrap();
        let err = other.decrypt(&ct).unwrap_err();
        assert!(matches!(err, CryptoError::Authentication(AuthFailure::AeadTag)));
    }

    #[test]
    fn authenticated_policy_writes_v2_and_plain_writes_v1() {
        let plain = bean(CipherSuite::Aes256Gcm, HeaderPolicy::Plain);
        let auth = bean(CipherSuite::Aes256Gcm, HeaderPolicy::Authenticated);
        let ring: SharedKeyResolver = Arc::new(KeyRing::new().with_key("k1", key_for(CipherSuite::Aes256Gcm)));

        let (h1, _) = headers::decode_slice(&plain.encrypt(b"x").unwrap(), &ring).unwrap();
        let (h2, _) = headers::decode_slice(&auth.encrypt(b"x").unwrap(), &ring).unwrap();
        assert_eq!(h1.version(), HeaderVersion::V1);
        assert_eq!(h2.version(), HeaderVersion::V2);
        assert_eq!(h2.key_name(), Some("k1"));

        // Decryption accepts either format regardless of policy.
        assert_eq!(plain.decrypt(&auth.encrypt(b"both").unwrap()).unwrap(), b"both");
        assert_eq!(auth.decrypt(&plain.encrypt(b"both").unwrap()).unwrap(), b"both");
    }

    #[test]
    fn v2_wrong_key_fails_on_header_mac() {
        let auth = bean(CipherSuite::Aes128Eax, HeaderPolicy::Authenticated);
        let ct = auth.encrypt(b"secret").unwrap();

        let wrong: SharedKeyResolver =
            Arc::new(KeyRing::new().with_key("k1", SymmetricKey::new(vec![0x99; 16])));
        let config = BeanConfig::new("k1").with_suite(CipherSuite::Aes128Eax);
        let other = CipherBean::from_config(config, wrong, Arc::new(RandomNonce::new(16).unwrap())).unwrap();
        let err = other.decrypt(&ct).unwrap_err();
        assert!(matches!(err, CryptoError::Authentication(AuthFailure::HeaderMac)));
    }

    #[test]
    fn aead_binds_the_plain_header() {
        let bean = bean(CipherSuite::ChaCha20Poly1305, HeaderPolicy::Plain);
        let mut ct = bean.encrypt(b"bound to header").unwrap();
        ct[8] ^= 0x01; // first nonce byte
        assert!(bean.decrypt(&ct).unwrap_err().is_authentication());
    }

    #[test]
    fn missing_key_name_is_rejected() {
        let suite = CipherSuite::Aes128Gcm;
        let nonces = RandomNonce::new(12).unwrap();
        let ct = encrypt_with_key(suite.engine().as_mut(), &key_for(suite), &nonces, b"anon").unwrap();

        let err = bean(suite, HeaderPolicy::Plain).decrypt(&ct).unwrap_err();
        assert!(matches!(err, CryptoError::Key(KeyError::MissingKeyName)));
    }

    #[test]
    fn unknown_alias_fails_encrypt() {
        let ring: SharedKeyResolver = Arc::new(KeyRing::new());
        let config = BeanConfig::new("absent").with_suite(CipherSuite::Aes128Gcm);
        let bean = CipherBean::from_config(config, ring, Arc::new(RandomNonce::new(12).unwrap())).unwrap();
        let err = bean.encrypt(b"x").unwrap_err();
        assert!(matches!(err, CryptoError::Key(KeyError::NotFound { .. })));
    }

    #[test]
    fn wrong_key_length_is_key_error() {
        let ring: SharedKeyResolver = Arc::new(KeyRing::new().with_key("k1", [0u8; 16]));
        let config = BeanConfig::new("k1").with_suite(CipherSuite::Aes256CbcPkcs7);
        let bean = CipherBean::from_config(config, ring, Arc::new(RandomNonce::new(16).unwrap())).unwrap();
        let err = bean.encrypt(b"x").unwrap_err();
        assert!(matches!(err, CryptoError::Key(KeyError::InvalidLength { actual: 16, .. })));
    }

    #[test]
    fn nonce_length_mismatch_fails_construction() {
        let ring: SharedKeyResolver = Arc::new(KeyRing::new());
        let config = BeanConfig::new("k1").with_suite(CipherSuite::Aes128Gcm);
        let err = CipherBean::from_config(config, ring, Arc::new(RandomNonce::new(16).unwrap())).unwrap_err();
        assert!(matches!(err, CryptoError::Config(_)));
    }

    #[test]
    fn missing_suite_fails_construction() {
        let ring: SharedKeyResolver = Arc::new(KeyRing::new());
        let err = CipherBean::from_config(BeanConfig::new("k1"), ring, Arc::new(RandomNonce::new(12).unwrap()))
            .unwrap_err();
        assert!(matches!(err, CryptoError::Config(_)));
    }

    #[test]
    fn cbc_truncated_body_is_cipher_error() {
        let bean = bean(CipherSuite::Aes128CbcPkcs7, HeaderPolicy::Plain);
        let ct = bean.encrypt(&[5u8; 40]).unwrap();
        let err = bean.decrypt(&ct[..ct.len() - 3]).unwrap_err();
        assert!(matches!(err, CryptoError::Cipher(_)));
    }

    #[test]
    fn truncated_header_is_encoding_error() {
        let bean = bean(CipherSuite::Aes128Gcm, HeaderPolicy::Authenticated);
        let ct = bean.encrypt(b"x").unwrap();
        let err = bean.decrypt(&ct[..6]).unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }

    #[test]
    fn rotated_key_applies_to_next_call() {
        let current = Arc::new(RwLock::new(SymmetricKey::new(vec![1u8; 16])));
        let view = current.clone();
        let resolver: SharedKeyResolver = Arc::new(move |name: &str| -> Option<SymmetricKey> {
            (name == "k1").then(|| view.read().map(|k| k.clone()).ok()).flatten()
        });
        let config = BeanConfig::new("k1").with_suite(CipherSuite::Aes128Gcm);
        let bean = CipherBean::from_config(config, resolver, Arc::new(RandomNonce::new(12).unwrap())).unwrap();

        let old = bean.encrypt(b"before rotation").unwrap();
        *current.write().unwrap() = SymmetricKey::new(vec![2u8; 16]);

        assert!(bean.decrypt(&old).unwrap_err().is_authentication());
        let new = bean.encrypt(b"after rotation").unwrap();
        assert_eq!(bean.decrypt(&new).unwrap(), b"after rotation");
    }

    #[test]
    fn explicit_engine_factory_closure() {
        let ring: SharedKeyResolver = Arc::new(KeyRing::new().with_key("k1", [3u8; 16]));
        let factory = || -> Box<dyn CipherEngine> { CipherSuite::Aes128Eax.engine() };
        let bean = CipherBean::new(
            Arc::new(factory),
            ring,
            Arc::new(RandomNonce::new(16).unwrap()),
            BeanConfig::new("k1"),
        )
        .unwrap();
        assert_eq!(bean.algorithm(), "AES-128-EAX");
        let ct = bean.encrypt(b"closure").unwrap();
        assert_eq!(bean.decrypt(&ct).unwrap(), b"closure");
    }

    #[test]
    fn shared_bean_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CipherBean>();

        let ring: SharedKeyResolver = Arc::new(KeyRing::new().with_key("k1", [8u8; 32]));
        let config = BeanConfig::new("k1").with_suite(CipherSuite::Aes256Gcm);
        let nonces = Arc::new(CounterNonce::new([0xC0, 0xFF, 0xEE, 0x00]).unwrap());
        let bean = Arc::new(CipherBean::from_config(config, ring, nonces).unwrap());

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let bean = bean.clone();
                thread::spawn(move || {
                    (0..16u8)
                        .map(|i| {
                            let msg = vec![t, i];
                            let ct = bean.encrypt(&msg).unwrap();
                            assert_eq!(bean.decrypt(&ct).unwrap(), msg);
                            ct[8..20].to_vec()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut nonces: Vec<Vec<u8>> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        let total = nonces.len();
        nonces.sort();
        nonces.dedup();
        assert_eq!(nonces.len(), total, "counter nonces repeated");
    }
}
