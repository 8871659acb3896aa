//! Deep-link export and import of whole card sets.
//!
//! Wire format:
//! `myapp://createSet?d=<percent-encoded Base64 of DEFLATE(JSON payload)>`.
//! The JSON payload is [`ExportedSetPayload`]; the compression is raw DEFLATE
//! (no zlib or gzip framing).

mod payload;

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use thiserror::Error;
use url::Url;

use crate::model::{CardSet, CardSetDraft};

pub use payload::{ExportedCard, ExportedSetPayload};

/// Query parameter that carries the encoded payload.
pub const PAYLOAD_PARAM: &str = "d";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("failed to serialize set payload: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("compression produced no output")]
    CompressionEmpty,

    #[error("payload of {size} bytes exceeds the {capacity} byte buffer")]
    PayloadTooLarge { size: usize, capacity: usize },

    #[error("decompression failed: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("decompression produced no output")]
    DecompressionEmpty,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid percent-encoding in payload: {0}")]
    PercentDecoding(#[source] std::string::FromUtf8Error),

    #[error("invalid link: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unexpected link scheme `{0}`")]
    SchemeMismatch(String),

    #[error("unexpected link host `{0}`")]
    HostMismatch(String),

    #[error("link has no `d` parameter")]
    MissingPayload,

    #[error("link has unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("payload does not match the set shape: {0}")]
    Shape(#[source] serde_json::Error),
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Deep-link settings. `Default` is the shipped wire contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub scheme: String,
    pub host: String,
    /// Size of the output buffer compression must fit into.
    pub max_compressed_bytes: usize,
    /// Upper bound on the inflated JSON accepted during import.
    pub max_decompressed_bytes: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            scheme: "myapp".into(),
            host: "createSet".into(),
            max_compressed_bytes: 1024 * 1024,
            max_decompressed_bytes: 8 * 1024 * 1024,
        }
    }
}

//
// ─── CODEC ─────────────────────────────────────────────────────────────────────
//

/// Encodes card sets into deep links and back.
#[derive(Debug, Clone, Default)]
pub struct SetCodec {
    config: CodecConfig,
}

impl SetCodec {
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Export a stored set. Ids and learned flags are not part of the link.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if serialization or compression fails.
    pub fn export_set(&self, set: &CardSet) -> Result<String, CodecError> {
        self.export_draft(&set.to_draft())
    }

    /// Export a draft as a deep link.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Serialize` if JSON encoding fails,
    /// `CodecError::CompressionEmpty` if nothing was produced, and
    /// `CodecError::PayloadTooLarge` if the compressed bytes overflow the buffer.
    pub fn export_draft(&self, draft: &CardSetDraft) -> Result<String, CodecError> {
        let encoded = self.encode_payload(&ExportedSetPayload::from(draft))?;
        Ok(format!(
            "{}://{}?{PAYLOAD_PARAM}={}",
            self.config.scheme,
            self.config.host,
            urlencoding::encode(&encoded)
        ))
    }

    /// Import a deep link into a fresh draft.
    ///
    /// Every stage must succeed; on any failure nothing is returned.
    ///
    /// # Errors
    ///
    /// Returns the `CodecError` variant of the first stage that failed.
    pub fn import_link(&self, link: &str) -> Result<CardSetDraft, CodecError> {
        let url = Url::parse(link.trim())?;
        if url.scheme() != self.config.scheme {
            return Err(CodecError::SchemeMismatch(url.scheme().to_owned()));
        }
        let host = url.host_str().unwrap_or_default();
        if host != self.config.host {
            return Err(CodecError::HostMismatch(host.to_owned()));
        }

        let raw = payload_param(url.query().unwrap_or_default())?;
        let base64 = urlencoding::decode(raw).map_err(CodecError::PercentDecoding)?;
        let payload = self.decode_payload(&base64)?;
        Ok(CardSetDraft::from(payload))
    }

    /// JSON → DEFLATE → Base64.
    ///
    /// # Errors
    ///
    /// See [`SetCodec::export_draft`].
    pub fn encode_payload(&self, payload: &ExportedSetPayload) -> Result<String, CodecError> {
        let json = serde_json::to_vec(payload).map_err(CodecError::Serialize)?;
        let compressed = deflate(&json, self.config.max_compressed_bytes)?;
        tracing::debug!(
            json_bytes = json.len(),
            compressed_bytes = compressed.len(),
            cards = payload.cards.len(),
            "encoded set payload"
        );
        Ok(BASE64.encode(compressed))
    }

    /// Base64 → INFLATE → JSON.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Base64`, `CodecError::Decompression`,
    /// `CodecError::DecompressionEmpty`, `CodecError::PayloadTooLarge` or
    /// `CodecError::Shape` depending on the failing stage.
    pub fn decode_payload(&self, encoded: &str) -> Result<ExportedSetPayload, CodecError> {
        let compressed = BASE64.decode(encoded.trim())?;
        let json = inflate(&compressed, self.config.max_decompressed_bytes)?;
        tracing::debug!(
            compressed_bytes = compressed.len(),
            json_bytes = json.len(),
            "decoded set payload"
        );
        serde_json::from_slice(&json).map_err(CodecError::Shape)
    }
}

fn payload_param(query: &str) -> Result<&str, CodecError> {
    let mut found = None;
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != PAYLOAD_PARAM || found.is_some() {
            return Err(CodecError::UnknownParameter(key.to_owned()));
        }
        found = Some(value);
    }
    found
        .filter(|value| !value.is_empty())
        .ok_or(CodecError::MissingPayload)
}

fn deflate(bytes: &[u8], capacity: usize) -> Result<Vec<u8>, CodecError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(CodecError::Compression)?;
    let compressed = encoder.finish().map_err(CodecError::Compression)?;
    if compressed.is_empty() {
        return Err(CodecError::CompressionEmpty);
    }
    if compressed.len() > capacity {
        return Err(CodecError::PayloadTooLarge {
            size: compressed.len(),
            capacity,
        });
    }
    Ok(compressed)
}

fn inflate(bytes: &[u8], capacity: usize) -> Result<Vec<u8>, CodecError> {
    let limit = u64::try_from(capacity).unwrap_or(u64::MAX).saturating_add(1);
    let mut out = Vec::new();
    DeflateDecoder::new(bytes)
        .take(limit)
        .read_to_end(&mut out)
        .map_err(CodecError::Decompression)?;
    if out.is_empty() {
        return Err(CodecError::DecompressionEmpty);
    }
    if out.len() > capacity {
        return Err(CodecError::PayloadTooLarge {
            size: out.len(),
            capacity,
        });
    }
    Ok(out)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardDraft, CardId, CardSetId};
    use crate::time::fixed_now;

    fn draft() -> CardSetDraft {
        CardSetDraft::new(
            "Capitals",
            "European capitals",
            "Paris is the capital of France. Berlin is the capital of Germany.",
            vec![
                CardDraft::new("France", "Paris"),
                CardDraft::new("Germany", "Berlin"),
            ],
        )
    }

    fn sorted_pairs(draft: &CardSetDraft) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = draft
            .cards
            .iter()
            .map(|c| (c.question.clone(), c.answer.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn export_builds_expected_link_shape() {
        let link = SetCodec::default().export_draft(&draft()).unwrap();
        assert!(link.starts_with("myapp://createSet?d="));
        let value = &link["myapp://createSet?d=".len()..];
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '%' | '-' | '_' | '.' | '~'))
        );
    }

    #[test]
    fn round_trip_keeps_fields_and_cards() {
        let codec = SetCodec::default();
        let original = draft();
        let link = codec.export_draft(&original).unwrap();
        let imported = codec.import_link(&link).unwrap();
        assert_eq!(imported.name, original.name);
        assert_eq!(imported.description, original.description);
        assert_eq!(imported.source_text, original.source_text);
        assert_eq!(sorted_pairs(&imported), sorted_pairs(&original));
    }

    #[test]
    fn round_trip_of_empty_set() {
        let codec = SetCodec::default();
        let empty = CardSetDraft::default();
        let imported = codec.import_link(&codec.export_draft(&empty).unwrap()).unwrap();
        assert_eq!(imported, empty);
    }

    #[test]
    fn round_trip_of_unicode_and_reserved_characters() {
        let codec = SetCodec::default();
        let original = CardSetDraft::new(
            "日本語 & more",
            "a=b?c#d",
            "line one\nline two \"quoted\"",
            vec![
                CardDraft::new("こんにちは", "hello"),
                CardDraft::new("1 + 1 = ?", "2 / two"),
                CardDraft::new("same", "same"),
                CardDraft::new("same", "same"),
            ],
        );
        let imported = codec.import_link(&codec.export_draft(&original).unwrap()).unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn export_of_stored_set_drops_ids_and_learned_flags() {
        let mut next = 40;
        let mut set = draft().assign_ids(
            CardSetId::new(3),
            || {
                next += 1;
                CardId::new(next)
            },
            fixed_now(),
        );
        set.apply_learned(CardId::new(41), true).unwrap();

        let codec = SetCodec::default();
        let imported = codec.import_link(&codec.export_set(&set).unwrap()).unwrap();
        assert_eq!(imported, draft());
    }

    #[test]
    fn corrupted_base64_is_rejected() {
        let err = SetCodec::default()
            .import_link("myapp://createSet?d=%%%%not-base64!!")
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::Base64(_) | CodecError::PercentDecoding(_)
        ));

        let err = SetCodec::default()
            .import_link("myapp://createSet?d=not*base64")
            .unwrap_err();
        assert!(matches!(err, CodecError::Base64(_)));
    }

    #[test]
    fn wrong_scheme_or_host_is_rejected() {
        let codec = SetCodec::default();
        let link = codec.export_draft(&draft()).unwrap();

        let other_scheme = link.replacen("myapp://", "otherapp://", 1);
        assert!(matches!(
            codec.import_link(&other_scheme).unwrap_err(),
            CodecError::SchemeMismatch(s) if s == "otherapp"
        ));

        let other_host = link.replacen("createSet", "deleteSet", 1);
        assert!(matches!(
            codec.import_link(&other_host).unwrap_err(),
            CodecError::HostMismatch(h) if h == "deleteSet"
        ));
    }

    #[test]
    fn missing_or_unknown_parameters_are_rejected() {
        let codec = SetCodec::default();
        assert!(matches!(
            codec.import_link("myapp://createSet").unwrap_err(),
            CodecError::MissingPayload
        ));
        assert!(matches!(
            codec.import_link("myapp://createSet?d=").unwrap_err(),
            CodecError::MissingPayload
        ));

        let link = codec.export_draft(&draft()).unwrap();
        assert!(matches!(
            codec.import_link(&format!("{link}&x=1")).unwrap_err(),
            CodecError::UnknownParameter(k) if k == "x"
        ));
        assert!(matches!(
            codec.import_link(&format!("{link}&d=AAAA")).unwrap_err(),
            CodecError::UnknownParameter(k) if k == "d"
        ));
    }

    #[test]
    fn valid_base64_of_garbage_fails_decompression() {
        let garbage = BASE64.encode([0xff_u8, 0xfe, 0xfd, 0xfc, 0xfb]);
        let link = format!("myapp://createSet?d={}", urlencoding::encode(&garbage));
        let err = SetCodec::default().import_link(&link).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Decompression(_) | CodecError::DecompressionEmpty
        ));
    }

    #[test]
    fn json_with_wrong_shape_is_rejected() {
        let compressed = deflate(br#"{"name":"x","cards":[]}"#, 1024).unwrap();
        let link = format!(
            "myapp://createSet?d={}",
            urlencoding::encode(&BASE64.encode(compressed))
        );
        let err = SetCodec::default().import_link(&link).unwrap_err();
        assert!(matches!(err, CodecError::Shape(_)));
    }

    #[test]
    fn compressed_buffer_capacity_is_enforced() {
        let codec = SetCodec::new(CodecConfig {
            max_compressed_bytes: 8,
            ..CodecConfig::default()
        });
        let err = codec.export_draft(&draft()).unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge { capacity: 8, .. }));
    }

    #[test]
    fn decompressed_size_cap_is_enforced() {
        let writer = SetCodec::default();
        let link = writer.export_draft(&draft()).unwrap();

        let reader = SetCodec::new(CodecConfig {
            max_decompressed_bytes: 16,
            ..CodecConfig::default()
        });
        let err = reader.import_link(&link).unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge { capacity: 16, .. }));
    }

    #[test]
    fn custom_scheme_and_host_round_trip() {
        let codec = SetCodec::new(CodecConfig {
            scheme: "flashset".into(),
            host: "import".into(),
            ..CodecConfig::default()
        });
        let link = codec.export_draft(&draft()).unwrap();
        assert!(link.starts_with("flashset://import?d="));
        assert_eq!(codec.import_link(&link).unwrap(), draft());
        assert!(SetCodec::default().import_link(&link).is_err());
    }
}
