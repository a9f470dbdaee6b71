//! Protocol meta codec.
//!
//! The meta string is the link between an on-chain transaction and an action
//! code: `actioncodes:` followed by `&`-joined `key=value` pairs in a fixed
//! key order, values percent-encoded. It travels verbatim inside a memo
//! instruction, so the byte-size ceiling and the encoding character set are
//! wire contracts.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use actioncodes_core::constants::{
    MAX_META_BYTES, MAX_META_PARAMS_BYTES, META_PREFIX, META_VERSION,
};
use actioncodes_core::error::ProtocolError;
use actioncodes_core::types::ActionCode;
use actioncodes_crypto::code_hash;

/// The characters `encodeURIComponent` leaves bare; everything else is
/// percent-encoded. Both sides of the protocol must agree on this set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// ── ProtocolMetaFields ───────────────────────────────────────────────────────

/// The payload attached to a transaction to bind it to an action code.
///
/// `id` is the code hash, `int` the intent owner's pubkey. `iss` names a
/// distinct issuer when one co-signs; an issuer equal to `int` is elided from
/// the serialized form. `p` carries free-form structured parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMetaFields {
    pub ver: u32,
    pub id: String,
    pub int: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<serde_json::Value>,
}

impl ProtocolMetaFields {
    pub fn new(id: impl Into<String>, intent_owner: impl Into<String>) -> Self {
        Self {
            ver: META_VERSION,
            id: id.into(),
            int: intent_owner.into(),
            iss: None,
            p: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.p = Some(params);
        self
    }

    /// Meta for an action code: `id` is the code hash, `int` the code's
    /// pubkey.
    pub fn for_code(code: &ActionCode) -> Self {
        Self::new(code_hash(&code.code), code.pubkey.clone())
    }

    /// The issuer to check signatures for, when distinct from the intent
    /// owner.
    pub fn distinct_issuer(&self) -> Option<&str> {
        match &self.iss {
            Some(iss) if iss != &self.int => Some(iss),
            _ => None,
        }
    }

    // ── Serialization ────────────────────────────────────────────────────────

    /// Serialize to the wire string, enforcing the byte ceilings.
    pub fn build(&self) -> Result<String, ProtocolError> {
        if self.ver != META_VERSION {
            return Err(ProtocolError::InvalidMetaFormat(format!(
                "unsupported meta version {}",
                self.ver
            )));
        }
        if self.id.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "id" });
        }
        if self.int.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "int" });
        }

        let mut out = format!(
            "{META_PREFIX}ver={}&id={}&int={}",
            self.ver,
            utf8_percent_encode(&self.id, COMPONENT),
            utf8_percent_encode(&self.int, COMPONENT),
        );
        if let Some(iss) = self.distinct_issuer() {
            out.push_str("&iss=");
            out.push_str(&utf8_percent_encode(iss, COMPONENT).to_string());
        }
        if let Some(params) = &self.p {
            let compact =
                serde_json::to_string(params).expect("json value serialization is infallible");
            let encoded = utf8_percent_encode(&compact, COMPONENT).to_string();
            if encoded.len() > MAX_META_PARAMS_BYTES {
                return Err(ProtocolError::MetaTooLarge {
                    max: MAX_META_PARAMS_BYTES,
                });
            }
            out.push_str("&p=");
            out.push_str(&encoded);
        }

        if out.len() > MAX_META_BYTES {
            return Err(ProtocolError::MetaTooLarge {
                max: MAX_META_BYTES,
            });
        }
        Ok(out)
    }

    /// Parse a wire string back into fields.
    ///
    /// Unknown and duplicate keys are rejected; `ver`, `id`, and `int` are
    /// required; values are trimmed after percent-decoding.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        if input.len() > MAX_META_BYTES {
            return Err(ProtocolError::MetaTooLarge {
                max: MAX_META_BYTES,
            });
        }
        let body = input
            .strip_prefix(META_PREFIX)
            .ok_or_else(|| ProtocolError::InvalidMetaFormat("missing actioncodes: prefix".into()))?;

        let mut ver: Option<String> = None;
        let mut id: Option<String> = None;
        let mut int: Option<String> = None;
        let mut iss: Option<String> = None;
        let mut p: Option<String> = None;

        for pair in body.split('&') {
            let (key, raw_value) = pair.split_once('=').ok_or_else(|| {
                ProtocolError::InvalidMetaFormat(format!("malformed pair `{pair}`"))
            })?;
            let value = percent_decode_str(raw_value)
                .decode_utf8()
                .map_err(|_| {
                    ProtocolError::InvalidMetaFormat(format!("key `{key}` is not valid UTF-8"))
                })?
                .trim()
                .to_string();

            let slot = match key {
                "ver" => &mut ver,
                "id" => &mut id,
                "int" => &mut int,
                "iss" => &mut iss,
                "p" => &mut p,
                _ => {
                    return Err(ProtocolError::InvalidMetaFormat(format!(
                        "unknown key `{key}`"
                    )))
                }
            };
            if slot.replace(value).is_some() {
                return Err(ProtocolError::InvalidMetaFormat(format!(
                    "duplicate key `{key}`"
                )));
            }
        }

        let ver = ver.ok_or(ProtocolError::MissingRequiredField { field: "ver" })?;
        let id = id.ok_or(ProtocolError::MissingRequiredField { field: "id" })?;
        let int = int.ok_or(ProtocolError::MissingRequiredField { field: "int" })?;

        let ver: u32 = ver.parse().map_err(|_| {
            ProtocolError::InvalidMetaFormat(format!("`ver` is not a decimal integer: `{ver}`"))
        })?;
        let p = p
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|_| {
                    ProtocolError::InvalidMetaFormat("`p` is not valid JSON".into())
                })
            })
            .transpose()?;

        Ok(Self {
            ver,
            id,
            int,
            iss,
            p,
        })
    }
}
