//! Destinations - resolved export targets and the option maps they are bound from

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Wire protocol family of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Plaintext line protocol over TCP
    #[serde(alias = "line")]
    Graphite,
    /// Binary packet protocol over UDP
    #[serde(alias = "binary")]
    Collectd,
    /// Renders line-protocol records into the log (dry run)
    Log,
}

impl Protocol {
    /// Protocol name as used in config files and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graphite => "graphite",
            Self::Collectd => "collectd",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "graphite" | "line" => Ok(Self::Graphite),
            "collectd" | "binary" => Ok(Self::Collectd),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown protocol '{other}'")),
        }
    }
}

/// Raw option value as it arrives from settings or command-line overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Render as text (numbers and bools are formatted)
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Interpret as a signed integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::Text(s) => s.trim().trim_start_matches('+').parse().ok(),
            _ => None,
        }
    }

    /// Interpret as a boolean (`true|yes|on|1` / `false|no|off|0`)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            Self::Float(_) => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Well-known option keys, in normalised form
pub mod keys {
    pub const HOST: &str = "host";
    pub const PORT: &str = "port";
    pub const TIMEOUT: &str = "timeout";
    pub const RETRY: &str = "retry";
    pub const PERF_PATH: &str = "perf path";
    pub const SEND_PERFDATA: &str = "send perfdata";
    pub const PAYLOAD_LENGTH: &str = "payload length";
    pub const PASSWORD: &str = "password";
    pub const TIME_OFFSET: &str = "time offset";

    /// Historical flag name sharing the payload length field
    pub const BUFFER_LENGTH: &str = "buffer length";

    pub const ALL: &[&str] = &[
        HOST,
        PORT,
        TIMEOUT,
        RETRY,
        PERF_PATH,
        SEND_PERFDATA,
        PAYLOAD_LENGTH,
        PASSWORD,
        TIME_OFFSET,
    ];
}

/// Normalise an option key: lowercase, `-`/`_` to space, `buffer length` to `payload length`
pub fn normalize_key(key: &str) -> String {
    let normalized: String = key
        .trim()
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    if normalized == keys::BUFFER_LENGTH {
        keys::PAYLOAD_LENGTH.to_string()
    } else {
        normalized
    }
}

/// Named option values keyed by normalised option name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, OptionValue>",
    into = "BTreeMap<String, OptionValue>"
)]
pub struct DestinationOptions {
    values: BTreeMap<String, OptionValue>,
}

impl From<BTreeMap<String, OptionValue>> for DestinationOptions {
    fn from(raw: BTreeMap<String, OptionValue>) -> Self {
        let mut options = Self::new();
        for (key, value) in raw {
            options.set(&key, value);
        }
        options
    }
}

impl From<DestinationOptions> for BTreeMap<String, OptionValue> {
    fn from(options: DestinationOptions) -> Self {
        options.values
    }
}

impl DestinationOptions {
    /// Empty option map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, normalising the key
    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Builder-style `set`
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Look up a value by any accepted spelling of its key
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(&normalize_key(key))
    }

    /// Non-empty text value
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(OptionValue::as_text)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&normalize_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate (normalised key, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys that do not bind to any destination field
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.values
            .keys()
            .map(String::as_str)
            .filter(|k| !keys::ALL.contains(k))
            .collect()
    }
}

/// Overlay `overrides` on top of `defaults`; override keys win
pub fn merge(defaults: &DestinationOptions, overrides: &DestinationOptions) -> DestinationOptions {
    let mut merged = defaults.clone();
    for (key, value) in overrides.iter() {
        merged.values.insert(key.to_string(), value.clone());
    }
    merged
}

/// Unresolved destination as supplied by the settings collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DestinationSettings {
    /// Unique operator-chosen name
    #[validate(length(min = 1, message = "destination alias cannot be empty"))]
    pub alias: String,

    /// Wire protocol
    pub protocol: Protocol,

    /// Alias of a destination whose options are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Option values
    #[serde(default)]
    pub options: DestinationOptions,
}

impl DestinationSettings {
    /// Settings with no options set
    pub fn new(alias: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            alias: alias.into(),
            protocol,
            parent: None,
            options: DestinationOptions::new(),
        }
    }

    /// Builder-style option setter
    pub fn with_option(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.options.set(key, value);
        self
    }
}

/// Resolved, immutable export target
///
/// `host` is never empty and `port` is always set once a `Destination` exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    pub alias: String,
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    /// Maximum connection attempts
    pub retry: u32,
    pub path_template: String,
    pub send_perf: bool,
    /// Name of this agent, substituted for `${hostname}`
    pub sender_host: String,
    /// Upper bound for one binary packet, in bytes
    pub payload_length: usize,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Seconds added to the pass timestamp
    pub time_offset: i64,
}

impl Destination {
    /// `host:port` for logs and messages
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Connection attempts actually made (at least one)
    pub fn attempts(&self) -> u32 {
        self.retry.max(1)
    }
}
