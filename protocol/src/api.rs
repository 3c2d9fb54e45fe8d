//! # JSON Facade
//!
//! The three operations a wallet front end needs, with request and response
//! shapes that match what existing Bytom-style clients send and expect:
//!
//! | Operation                  | Input                          | Output                           |
//! |----------------------------|--------------------------------|----------------------------------|
//! | [`get_address`]            | raw private key (hex)          | `{xpub, address}`                |
//! | [`create_raw_transaction`] | [`BuildRequest`]               | [`Template`]                     |
//! | [`sign_raw_transaction`]   | raw private key + [`Template`] | `{transaction, sign_complete}`   |
//!
//! Each has a `_json` twin taking and returning strings, which is what the
//! CLI and the HTTP server call.
//!
//! Raw private keys are decoded into zeroizing buffers and dropped as soon
//! as the extended key has been built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::actions::{decode_actions, merge_spend_actions, DecodeContext};
use crate::config::Config;
use crate::crypto::{XPrv, XPub};
use crate::error::{Error, Result};
use crate::identity::{derive_address, DerivedAddress};
use crate::transaction::{self, sign_template, Template, TxData};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Transaction time-to-live. On the wire either an integer number of
/// milliseconds or a duration string such as `"5m"` or `"90s"`; zero (or
/// `null`) means "use the default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ttl(pub Duration);

impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0.as_millis() as u64)
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(u64),
            Text(String),
            Null,
        }

        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Ok(Ttl(Duration::from_millis(ms))),
            Raw::Text(s) => humantime::parse_duration(&s)
                .map(Ttl)
                .map_err(serde::de::Error::custom),
            Raw::Null => Ok(Ttl::default()),
        }
    }
}

/// Input of [`create_raw_transaction`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Transaction to extend; a fresh version-1 transaction when absent.
    #[serde(default)]
    pub base_transaction: Option<TxData>,
    /// Actions as loose JSON objects, each with a `type` tag.
    #[serde(default, deserialize_with = "crate::transaction::template::null_as_empty")]
    pub actions: Vec<Value>,
    /// Key spend actions will be signed with.
    #[serde(default)]
    pub xpub: Option<XPub>,
    #[serde(default)]
    pub ttl: Ttl,
    /// Overrides the base transaction's time range when non-zero.
    #[serde(default)]
    pub time_range: u64,
}

/// A built template and the deadline it was built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTemplate {
    pub template: Template,
    pub max_time: DateTime<Utc>,
}

fn zeroizing_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Zeroizing<String>, D::Error> {
    String::deserialize(deserializer).map(Zeroizing::new)
}

/// A key plus the template to sign with it, as posted to the sign
/// endpoint.
#[derive(Clone, Deserialize)]
pub struct SignRequest {
    #[serde(deserialize_with = "zeroizing_string")]
    pub raw_private_key: Zeroizing<String>,
    pub template: Template,
}

impl std::fmt::Debug for SignRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignRequest")
            .field("raw_private_key", &"[REDACTED]")
            .field("template", &self.template)
            .finish()
    }
}

/// Output of [`sign_raw_transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub transaction: Template,
    pub sign_complete: bool,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

fn decode_key_hex(raw_private_key: &str) -> Result<XPrv> {
    let bytes = Zeroizing::new(
        hex::decode(raw_private_key.trim()).map_err(|_| Error::InvalidKeyEncoding)?,
    );
    Ok(XPrv::from_bytes(&bytes)?)
}

/// Extended public key and receive address of a hex-encoded raw private
/// key.
pub fn get_address(raw_private_key: &str, config: &Config) -> Result<DerivedAddress> {
    let bytes = Zeroizing::new(
        hex::decode(raw_private_key.trim()).map_err(|_| Error::InvalidKeyEncoding)?,
    );
    derive_address(&bytes, config.network)
}

/// Decode, merge and build the request's actions into an unsigned
/// template.
///
/// # Errors
///
/// Decoding stops at the first bad action. Build failures are aggregated:
/// [`Error::ActionBuildFailure`] lists every action that failed.
pub fn create_raw_transaction(request: &BuildRequest, config: &Config) -> Result<BuiltTemplate> {
    let ctx = DecodeContext {
        xpub: request.xpub,
        network: config.network,
    };
    let actions = merge_spend_actions(decode_actions(&request.actions, &ctx)?)?;

    let ttl = if request.ttl.0.is_zero() {
        config.default_ttl
    } else {
        request.ttl.0
    };
    let max_time = chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or(Error::TtlOutOfRange(ttl))?;

    let template = transaction::build(
        request.base_transaction.clone(),
        &actions,
        max_time,
        request.time_range,
    )?;

    info!(
        actions = actions.len(),
        inputs = template.raw_transaction.inputs.len(),
        outputs = template.raw_transaction.outputs.len(),
        tx_id = %template.hashes().id,
        "created raw transaction"
    );
    Ok(BuiltTemplate { template, max_time })
}

/// Sign everything `raw_private_key` can sign in `template`.
///
/// # Errors
///
/// A malformed key or template fails the whole operation; a key that
/// matches nothing is not an error, it just leaves `sign_complete` false.
pub fn sign_raw_transaction(raw_private_key: &str, mut template: Template) -> Result<SignResponse> {
    let xprv = decode_key_hex(raw_private_key)?;
    let sign_complete = sign_template(&mut template, &xprv)?;
    debug!(sign_complete, "signed raw transaction");
    Ok(SignResponse {
        transaction: template,
        sign_complete,
    })
}

// ---------------------------------------------------------------------------
// String-in, string-out variants
// ---------------------------------------------------------------------------

pub fn get_address_json(raw_private_key: &str, config: &Config) -> Result<String> {
    Ok(serde_json::to_string(&get_address(raw_private_key, config)?)?)
}

/// `request` is a [`BuildRequest`] as JSON; the result is the template.
pub fn create_raw_transaction_json(request: &str, config: &Config) -> Result<String> {
    let request: BuildRequest = serde_json::from_str(request)?;
    let built = create_raw_transaction(&request, config)?;
    Ok(serde_json::to_string(&built.template)?)
}

/// `template` is a template as JSON; the result is a [`SignResponse`].
pub fn sign_raw_transaction_json(raw_private_key: &str, template: &str) -> Result<String> {
    let template: Template = serde_json::from_str(template)?;
    Ok(serde_json::to_string(&sign_raw_transaction(
        raw_private_key,
        template,
    )?)?)
}
