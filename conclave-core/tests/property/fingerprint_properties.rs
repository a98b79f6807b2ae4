use conclave_core::fingerprint::{bands, fingerprint, hamming_similarity, signature, tokenize};
use proptest::prelude::*;

proptest! {
    #[test]
    fn fingerprint_is_stable_under_whitespace(words in prop::collection::vec("[a-z]{1,8}", 1..12)) {
        let tight = words.join(" ");
        let loose = words.join("   \n ");
        prop_assert_eq!(fingerprint(&tight), fingerprint(&loose));
    }

    #[test]
    fn signature_is_deterministic(text in "[a-zA-Z0-9 _]{0,80}") {
        prop_assert_eq!(signature(&text), signature(&text));
    }

    #[test]
    fn hamming_similarity_is_symmetric_and_bounded(a in any::<u64>(), b in any::<u64>()) {
        let s = hamming_similarity(a, b);
        prop_assert!((0.0..=1.0).contains(&s));
        prop_assert_eq!(s, hamming_similarity(b, a));
        prop_assert_eq!(hamming_similarity(a, a), 1.0);
    }

    #[test]
    fn identical_signatures_share_every_band(sig in any::<u64>()) {
        prop_assert_eq!(bands(sig), bands(sig));
        prop_assert_eq!(bands(sig).len(), 4);
    }

    #[test]
    fn tokens_are_lowercase(text in "[a-zA-Z0-9 ,.;]{0,60}") {
        for token in tokenize(&text) {
            prop_assert_eq!(token.clone(), token.to_ascii_lowercase());
        }
    }
}
