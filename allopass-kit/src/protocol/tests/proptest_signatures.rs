use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::{
    error::ApiError,
    protocol::{HashAlgorithm, Parameters, RequestSigner},
};

fn algorithm() -> impl Strategy<Value = HashAlgorithm> {
    prop_oneof![Just(HashAlgorithm::Sha1), Just(HashAlgorithm::Sha256), Just(HashAlgorithm::Sha512)]
}

fn parameters() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z_]{1,12}", "[a-zA-Z0-9 ._-]{0,24}", 0..8)
        .prop_filter("reserved signature name", |map| !map.contains_key("api_sig"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_request_signature_roundtrip(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        entries in parameters(),
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let mut params: Parameters = entries.into_iter().collect();
        signer.sign(&mut params);

        prop_assert!(signer.verify_request(&params).is_ok());
    }

    #[test]
    fn test_request_signature_detects_value_change(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        entries in parameters().prop_filter("non-empty", |m| !m.is_empty()),
        suffix in "[a-z0-9]{1,4}",
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let mut params: Parameters = entries.clone().into_iter().collect();
        signer.sign(&mut params);

        let (name, value) = entries.into_iter().next().unwrap();
        params.insert(name, format!("{value}{suffix}"));

        prop_assert!(matches!(signer.verify_request(&params), Err(ApiError::FalseSignature)));
    }

    #[test]
    fn test_canonicalization_ignores_insertion_order(
        entries in parameters(),
        key in "[a-z]{8}",
    ) {
        let forward: Parameters = entries.clone().into_iter().collect();
        let backward: Parameters = entries.into_iter().rev().collect();
        let signer = RequestSigner::new(&key, HashAlgorithm::Sha1);

        prop_assert_eq!(forward.canonical_string(), backward.canonical_string());
        prop_assert_eq!(signer.compute_signature(&forward), signer.compute_signature(&backward));
    }

    #[test]
    fn test_response_signature_roundtrip(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        body in any::<Vec<u8>>(),
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let signature = signer.response_signature(&body);

        prop_assert!(signer.verify_response(&body, Some(&signature)).is_ok());
    }

    #[test]
    fn test_response_single_byte_flip_fails(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        body in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let signature = signer.response_signature(&body);

        let mut tampered = body.clone();
        let position = index.index(tampered.len());
        tampered[position] ^= flip;

        prop_assert!(matches!(
            signer.verify_response(&tampered, Some(&signature)),
            Err(ApiError::FalseSignature)
        ));
    }

    #[test]
    fn test_request_and_response_use_same_construction(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        entries in parameters(),
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let params: Parameters = entries.into_iter().collect();
        let canonical = params.canonical_string();

        prop_assert_eq!(
            signer.compute_signature(&params),
            signer.response_signature(canonical.as_bytes())
        );
    }

    #[test]
    fn test_response_signature_char_flip_fails(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        body in any::<Vec<u8>>(),
        index in any::<prop::sample::Index>(),
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let signature = signer.response_signature(&body);

        let mut chars: Vec<char> = signature.chars().collect();
        let position = index.index(chars.len());
        chars[position] = if chars[position] == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();

        prop_assert!(matches!(
            signer.verify_response(&body, Some(&tampered)),
            Err(ApiError::FalseSignature)
        ));
    }

    #[test]
    fn test_request_signature_char_flip_fails(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        entries in parameters(),
        index in any::<prop::sample::Index>(),
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let mut params: Parameters = entries.into_iter().collect();
        let signature = signer.sign(&mut params);

        let mut chars: Vec<char> = signature.chars().collect();
        let position = index.index(chars.len());
        chars[position] = if chars[position] == '0' { '1' } else { '0' };
        params.insert("api_sig", chars.into_iter().collect::<String>());

        prop_assert!(matches!(signer.verify_request(&params), Err(ApiError::FalseSignature)));
    }

    #[test]
    fn test_request_value_byte_flip_fails(
        key in "[a-zA-Z0-9]{1,40}",
        algorithm in algorithm(),
        entries in parameters()
            .prop_filter("has a non-empty value", |m| m.values().any(|v| !v.is_empty())),
        index in any::<prop::sample::Index>(),
    ) {
        let signer = RequestSigner::new(&key, algorithm);
        let mut params: Parameters = entries.clone().into_iter().collect();
        signer.sign(&mut params);

        let (name, value) = entries.into_iter().find(|(_, v)| !v.is_empty()).unwrap();
        let mut bytes = value.into_bytes();
        let position = index.index(bytes.len());
        bytes[position] = if bytes[position] == b'a' { b'b' } else { b'a' };
        params.insert(name, String::from_utf8(bytes).unwrap());

        prop_assert!(matches!(signer.verify_request(&params), Err(ApiError::FalseSignature)));
    }
}
