//! Payment-target classification.
//!
//! Stages run in order and stop at the first match:
//!
//! 1. API key: exactly 40 lowercase ASCII letters.
//! 2. Extended public key: base-58-check, 82 bytes, known version magic,
//!    compressed key prefix at offset 45.
//! 3. Address: legacy decode, then cashaddr decode.
//! 4. Address again, after prefixing the network scheme (`bitcoincash:`).
//!
//! A rejected stage is never an error for the caller. It is reported to the
//! classifier's [`DiagnosticSink`] and the next stage runs. Inputs that match
//! nothing come back as [`TargetKind::Invalid`].

use crate::address::{base58check_decode, cashaddr_decode, legacy_decode};
use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage, TracingSink};
use crate::error::{ClassifyError, Mismatch, Result};
use crate::extended_key::{
    is_compressed_key_prefix, read_version, ExtendedKeyVersion, KEY_MATERIAL_OFFSET,
    MAX_ENCODED_LEN, SERIALIZED_LEN,
};
use crate::types::{Network, PaymentTarget, TargetKind};

/// Length of a merchant API key.
pub const API_KEY_LEN: usize = 40;

/// Classifier settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Network whose cashaddr prefix is tried on bare payloads.
    pub network: Network,
}

impl ClassifierConfig {
    pub fn scheme_prefix(&self) -> String {
        format!("{}:", self.network.cashaddr_prefix())
    }
}

/// Classifies raw strings into [`PaymentTarget`]s.
///
/// Stateless between calls; share one freely across threads when the sink allows it.
#[derive(Debug, Clone, Default)]
pub struct Classifier<S = TracingSink> {
    config: ClassifierConfig,
    sink: S,
}

impl Classifier<TracingSink> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self {
            config,
            sink: TracingSink,
        }
    }
}

impl<S: DiagnosticSink> Classifier<S> {
    /// Replace the diagnostic sink, keeping the configuration.
    pub fn with_sink<T: DiagnosticSink>(self, sink: T) -> Classifier<T> {
        Classifier {
            config: self.config,
            sink,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, raw: &str) -> PaymentTarget {
        match check_api_key(raw) {
            Ok(()) => return PaymentTarget::new(raw.to_string(), TargetKind::ApiKey),
            Err(err) => self.report(Stage::ApiKey, raw, &err),
        }

        match check_extended_public_key(raw) {
            Ok(_) => return PaymentTarget::new(raw.to_string(), TargetKind::ExtendedPublicKey),
            Err(err) => self.report(Stage::ExtendedKey, raw, &err),
        }

        if let Some(cashaddr) = self.decode_address(raw, Stage::LegacyAddress, Stage::CashAddress)
        {
            return PaymentTarget::new(cashaddr, TargetKind::Address);
        }

        // From here on the working value carries the scheme prefix, even if the
        // retry fails.
        let prefixed = format!("{}{}", self.config.scheme_prefix(), raw);
        if let Some(cashaddr) =
            self.decode_address(&prefixed, Stage::PrefixedRetry, Stage::PrefixedRetry)
        {
            return PaymentTarget::new(cashaddr, TargetKind::Address);
        }

        self.report(
            Stage::PrefixedRetry,
            &prefixed,
            &ClassifyError::AllStagesExhausted,
        );
        PaymentTarget::new(prefixed, TargetKind::Invalid)
    }

    /// Legacy decode, then cashaddr decode. Returns the canonical cashaddr.
    fn decode_address(
        &self,
        input: &str,
        legacy_stage: Stage,
        cash_stage: Stage,
    ) -> Option<String> {
        match legacy_decode(input) {
            Ok(addr) => return Some(addr.to_cashaddr()),
            Err(e) => self.report(legacy_stage, input, &ClassifyError::decode(legacy_stage, e)),
        }

        match cashaddr_decode(input) {
            Ok(addr) => Some(addr.to_cashaddr()),
            Err(e) => {
                self.report(cash_stage, input, &ClassifyError::decode(cash_stage, e));
                None
            }
        }
    }

    fn report(&self, stage: Stage, input: &str, error: &ClassifyError) {
        self.sink.record(&Diagnostic {
            stage,
            input,
            error,
        });
    }
}

/// Classify with the default configuration, reporting through `tracing`.
pub fn classify(raw: &str) -> PaymentTarget {
    Classifier::new().classify(raw)
}

/// Exactly 40 lowercase ASCII letters, nothing else.
pub fn is_api_key(raw: &str) -> bool {
    raw.len() == API_KEY_LEN && raw.bytes().all(|b| b.is_ascii_lowercase())
}

pub fn check_api_key(raw: &str) -> Result<()> {
    if is_api_key(raw) {
        Ok(())
    } else {
        Err(ClassifyError::mismatch(Stage::ApiKey, Mismatch::NotApiKey))
    }
}

/// Structural check of a base-58 extended public key.
///
/// Only the first key-material byte is inspected; the key itself is not
/// validated as a curve point.
pub fn check_extended_public_key(raw: &str) -> Result<ExtendedKeyVersion> {
    let stage = Stage::ExtendedKey;
    // Base-58 decoding is quadratic; refuse what cannot be an extended key.
    if raw.len() > MAX_ENCODED_LEN {
        return Err(ClassifyError::mismatch(
            stage,
            Mismatch::TooLong {
                max: MAX_ENCODED_LEN,
                actual: raw.len(),
            },
        ));
    }
    let bytes = base58check_decode(raw).map_err(|e| ClassifyError::decode(stage, e))?;

    if bytes.len() != SERIALIZED_LEN {
        return Err(ClassifyError::mismatch(
            stage,
            Mismatch::Length {
                expected: SERIALIZED_LEN,
                actual: bytes.len(),
            },
        ));
    }

    let magic = read_version([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let version = ExtendedKeyVersion::from_magic(magic)
        .ok_or_else(|| ClassifyError::mismatch(stage, Mismatch::UnknownVersion(magic)))?;

    let key_prefix = bytes[KEY_MATERIAL_OFFSET];
    if !is_compressed_key_prefix(key_prefix) {
        return Err(ClassifyError::mismatch(stage, Mismatch::KeyPrefix(key_prefix)));
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::sha256d;
    use crate::diagnostics::NullSink;
    use proptest::prelude::*;
    use std::cell::RefCell;

    const BIP32_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
    const LEGACY: &str = "1BpEi6DfDAUFd7GtittLSdBeYJvcoaVggu";
    const CASHADDR: &str = "bitcoincash:qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a";

    /// Base-58-check encodes a 78-byte extended key body, truncated to `body_len`.
    fn encode_xkey(magic: u32, key_prefix: u8, body_len: usize) -> String {
        let mut body = Vec::with_capacity(78);
        body.extend_from_slice(&magic.to_be_bytes());
        body.push(0); // depth
        body.extend_from_slice(&[0; 4]); // parent fingerprint
        body.extend_from_slice(&[0; 4]); // child number
        body.extend_from_slice(&[0x11; 32]); // chain code
        body.push(key_prefix);
        body.extend_from_slice(&[0x22; 32]);
        body.truncate(body_len);
        let checksum = sha256d(&body);
        body.extend_from_slice(&checksum[..4]);
        bs58::encode(body).into_string()
    }

    fn quiet() -> Classifier<NullSink> {
        Classifier::new().with_sink(NullSink)
    }

    #[test]
    fn api_key_is_kept_verbatim() {
        let key = "abcdefghijklmnopqrstuvwxyzabcdefghijklmn";
        let target = quiet().classify(key);
        assert_eq!(target.kind(), TargetKind::ApiKey);
        assert_eq!(target.address(), key);
    }

    #[test]
    fn api_key_rejects_near_misses() {
        assert!(!is_api_key(&"a".repeat(39)));
        assert!(!is_api_key(&"a".repeat(41)));
        assert!(!is_api_key(&format!("{}A", "a".repeat(39))));
        assert!(!is_api_key(&format!(" {}", "a".repeat(40))));
        assert!(!is_api_key(&format!("{}1", "a".repeat(39))));
        // 40 bytes, fewer characters.
        assert!(!is_api_key(&format!("{}\u{e9}", "a".repeat(38))));
    }

    #[test]
    fn bip32_test_vector_is_extended_key() {
        assert_eq!(
            check_extended_public_key(BIP32_XPUB),
            Ok(ExtendedKeyVersion::Xpub)
        );
        let target = quiet().classify(BIP32_XPUB);
        assert_eq!(target.kind(), TargetKind::ExtendedPublicKey);
        assert_eq!(target.address(), BIP32_XPUB);
    }

    #[test]
    fn every_known_version_is_accepted() {
        for version in ExtendedKeyVersion::ALL {
            for prefix in [0x02, 0x03] {
                let encoded = encode_xkey(version.magic(), prefix, 78);
                assert_eq!(check_extended_public_key(&encoded), Ok(version));
                assert_eq!(
                    quiet().classify(&encoded).kind(),
                    TargetKind::ExtendedPublicKey
                );
            }
        }
    }

    #[test]
    fn unknown_version_falls_through() {
        let encoded = encode_xkey(0x0488_B21F, 0x02, 78);
        assert_eq!(
            check_extended_public_key(&encoded),
            Err(ClassifyError::StructuralMismatch {
                stage: Stage::ExtendedKey,
                reason: Mismatch::UnknownVersion(0x0488_B21F),
            })
        );
        assert_eq!(quiet().classify(&encoded).kind(), TargetKind::Invalid);
    }

    #[test]
    fn uncompressed_key_prefix_falls_through() {
        let encoded = encode_xkey(ExtendedKeyVersion::Zpub.magic(), 0x04, 78);
        assert!(matches!(
            check_extended_public_key(&encoded),
            Err(ClassifyError::StructuralMismatch {
                reason: Mismatch::KeyPrefix(0x04),
                ..
            })
        ));
        assert_eq!(quiet().classify(&encoded).kind(), TargetKind::Invalid);
    }

    #[test]
    fn truncated_key_falls_through() {
        let encoded = encode_xkey(ExtendedKeyVersion::Xpub.magic(), 0x02, 77);
        assert!(matches!(
            check_extended_public_key(&encoded),
            Err(ClassifyError::StructuralMismatch {
                reason: Mismatch::Length {
                    expected: 82,
                    actual: 81
                },
                ..
            })
        ));
        let target = quiet().classify(&encoded);
        assert_eq!(target.kind(), TargetKind::Invalid);
        assert_eq!(target.address(), format!("bitcoincash:{encoded}"));
    }

    #[test]
    fn wrong_length_base58_is_invalid() {
        for body in [
            [&[0x80][..], &[1; 32][..]].concat(),
            vec![0x42; 70],
            vec![0x05; 26],
        ] {
            let mut payload = body.clone();
            payload.extend_from_slice(&sha256d(&body)[..4]);
            let encoded = bs58::encode(payload).into_string();

            let target = quiet().classify(&encoded);
            assert_eq!(target.kind(), TargetKind::Invalid, "{} byte body", body.len());
            assert_eq!(target.address(), format!("bitcoincash:{encoded}"));
        }
    }

    #[test]
    fn oversized_input_is_refused_before_decoding() {
        let long = "z".repeat(100_000);
        assert_eq!(
            check_extended_public_key(&long),
            Err(ClassifyError::StructuralMismatch {
                stage: Stage::ExtendedKey,
                reason: Mismatch::TooLong {
                    max: MAX_ENCODED_LEN,
                    actual: 100_000,
                },
            })
        );

        let seen = RefCell::new(Vec::new());
        let classifier = Classifier::new().with_sink(|d: &Diagnostic<'_>| {
            seen.borrow_mut().push(d.error.clone());
        });
        let target = classifier.classify(&long);
        assert_eq!(target.kind(), TargetKind::Invalid);
        assert_eq!(target.address(), format!("bitcoincash:{long}"));
        assert!(seen.borrow().iter().any(|e| matches!(
            e,
            ClassifyError::DecodeFailure {
                source: crate::address::AddressError::TooLong(100_000),
                ..
            }
        )));
    }

    #[test]
    fn corrupted_checksum_is_decode_failure() {
        let mut corrupted = BIP32_XPUB.to_string();
        corrupted.pop();
        corrupted.push('9');
        assert!(matches!(
            check_extended_public_key(&corrupted),
            Err(ClassifyError::DecodeFailure {
                stage: Stage::ExtendedKey,
                ..
            })
        ));
    }

    #[test]
    fn legacy_address_becomes_cashaddr() {
        let target = quiet().classify(LEGACY);
        assert_eq!(target.kind(), TargetKind::Address);
        assert_eq!(target.address(), CASHADDR);

        let again = quiet().classify(target.address());
        assert_eq!(again, target);
    }

    #[test]
    fn cashaddr_is_canonicalised() {
        let target = quiet().classify(CASHADDR);
        assert_eq!(target.kind(), TargetKind::Address);
        assert_eq!(target.address(), CASHADDR);

        let upper = quiet().classify(&CASHADDR.to_ascii_uppercase());
        assert_eq!(upper.address(), CASHADDR);
    }

    #[test]
    fn bare_payload_is_retried_with_prefix() {
        let bare = CASHADDR.trim_start_matches("bitcoincash:");
        let target = quiet().classify(bare);
        assert_eq!(target.kind(), TargetKind::Address);
        assert_eq!(target.address(), CASHADDR);
    }

    #[test]
    fn testnet_config_retries_with_bchtest() {
        let classifier = Classifier::with_config(ClassifierConfig {
            network: Network::Testnet,
        })
        .with_sink(NullSink);
        let target = classifier.classify("qqjr7yu573z4faxw8ltgvjwpntwys08fysk07zmvce");
        assert_eq!(target.kind(), TargetKind::Address);
        assert_eq!(
            target.address(),
            "bchtest:qqjr7yu573z4faxw8ltgvjwpntwys08fysk07zmvce"
        );
    }

    #[test]
    fn failed_retry_keeps_prefixed_input() {
        let target = quiet().classify("qqqq");
        assert_eq!(target.kind(), TargetKind::Invalid);
        assert_eq!(target.address(), "bitcoincash:qqqq");

        let target = quiet().classify("");
        assert_eq!(target.kind(), TargetKind::Invalid);
        assert_eq!(target.address(), "bitcoincash:");
    }

    #[test]
    fn already_prefixed_garbage_is_prefixed_again() {
        let target = quiet().classify("bitcoincash:nope");
        assert_eq!(target.kind(), TargetKind::Invalid);
        assert_eq!(target.address(), "bitcoincash:bitcoincash:nope");
    }

    #[test]
    fn sink_sees_each_rejected_stage() {
        let stages = RefCell::new(Vec::new());
        let classifier = Classifier::new().with_sink(|d: &Diagnostic<'_>| {
            stages.borrow_mut().push(d.stage);
        });

        classifier.classify(LEGACY);
        assert_eq!(
            stages.borrow().as_slice(),
            &[Stage::ApiKey, Stage::ExtendedKey]
        );

        stages.borrow_mut().clear();
        classifier.classify("!!");
        assert_eq!(
            stages.borrow().as_slice(),
            &[
                Stage::ApiKey,
                Stage::ExtendedKey,
                Stage::LegacyAddress,
                Stage::CashAddress,
                Stage::PrefixedRetry,
                Stage::PrefixedRetry,
                Stage::PrefixedRetry,
            ]
        );
    }

    #[test]
    fn exhausted_is_last_diagnostic() {
        let last = RefCell::new(None);
        let classifier = Classifier::new().with_sink(|d: &Diagnostic<'_>| {
            *last.borrow_mut() = Some(d.error.clone());
        });
        classifier.classify("not a target");
        assert_eq!(
            last.into_inner(),
            Some(ClassifyError::AllStagesExhausted)
        );
    }

    proptest! {
        #[test]
        fn property_forty_lowercase_letters_are_api_keys(key in "[a-z]{40}") {
            let target = quiet().classify(&key);
            prop_assert_eq!(target.kind(), TargetKind::ApiKey);
            prop_assert_eq!(target.address(), key.as_str());
        }

        #[test]
        fn property_api_key_gate_has_no_false_positives(raw in "\\PC{0,60}") {
            prop_assume!(!(raw.len() == 40 && raw.bytes().all(|b| b.is_ascii_lowercase())));
            prop_assert_ne!(quiet().classify(&raw).kind(), TargetKind::ApiKey);
        }

        #[test]
        fn property_punctuated_garbage_is_invalid(rest in "[ -~]{0,80}") {
            let raw = format!("!{rest}");
            let target = quiet().classify(&raw);
            prop_assert_eq!(target.kind(), TargetKind::Invalid);
            prop_assert_eq!(target.address(), format!("bitcoincash:{raw}"));
        }

        #[test]
        fn property_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..120)) {
            let raw = String::from_utf8_lossy(&bytes);
            let target = quiet().classify(&raw);
            if target.kind() == TargetKind::ApiKey {
                prop_assert!(is_api_key(&raw));
            }
            if !target.is_valid() {
                prop_assert_eq!(target.address(), format!("bitcoincash:{raw}"));
            }
        }
    }
}
