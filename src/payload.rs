//! The `/api/config` payload and where its values come from.
//!
//! Values are looked up through [`EnvSource`] so handlers never touch the
//! process environment directly, which keeps them testable with a plain
//! map.

use std::{collections::HashMap, env, io};

use serde::Serialize;
use serde_json::ser::Formatter;

/// Read-only lookup of named configuration values.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `key`, or `None` when it is unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the live process environment on every lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        // Non-Unicode values are treated as unset.
        env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Environment variable feeding each payload field, in wire order.
pub const ENV_KEYS: [&str; 4] = [
    "BUSINESS_PORTFOLIO_ID",
    "ACCESS_TOKEN",
    "FACEBOOK_APP_ID",
    "FACEBOOK_CONFIG_ID",
];

/// Credentials handed to the front end. Field order is the wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    pub business_portfolio_id: String,
    pub access_token: String,
    pub facebook_app_id: String,
    pub facebook_config_id: String,
}

impl ConfigPayload {
    /// Builds the payload, substituting `""` for any unset variable.
    pub fn from_source(source: &dyn EnvSource) -> Self {
        let [portfolio, token, app_id, config_id] =
            ENV_KEYS.map(|key| source.get(key).unwrap_or_default());

        Self {
            business_portfolio_id: portfolio,
            access_token: token,
            facebook_app_id: app_id,
            facebook_config_id: config_id,
        }
    }

    /// Serializes as `{"key": "value", "key": "value"}`.
    ///
    /// Quotes, backslashes and control characters inside values are escaped,
    /// so the output is always valid JSON.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut ser = serde_json::Serializer::with_formatter(Vec::new(), SpacedFormatter);
        self.serialize(&mut ser)?;
        Ok(ser.into_inner())
    }
}

/// Compact JSON with a space after every `:` and `,`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
