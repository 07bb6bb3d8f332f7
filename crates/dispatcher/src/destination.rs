//! Destination binding - option maps to resolved `Destination`
//!
//! Binding is total: missing or malformed optional values fall back to the
//! protocol defaults. Only an unresolvable host is an error.

use std::time::Duration;

use contracts::{
    keys, merge, ContractError, Destination, DestinationOptions, DestinationSettings, OptionValue,
    Protocol,
};
use tracing::{debug, warn};

/// Default timeout for resolve, connect and send (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum connection attempts
pub const DEFAULT_RETRY: u32 = 3;

/// Smallest payload length accepted for binary packets
pub const MIN_PAYLOAD_LENGTH: usize = 64;

/// Largest payload that fits one UDP datagram
pub const MAX_PAYLOAD_LENGTH: usize = 65507;

/// Protocol-specific fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolDefaults {
    pub host: Option<&'static str>,
    pub port: u16,
    pub path_template: &'static str,
    pub payload_length: usize,
}

impl ProtocolDefaults {
    /// Defaults for a protocol family
    pub fn for_protocol(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Graphite => Self {
                host: None,
                port: 2003,
                path_template: "system.${hostname}.${check_alias}.${perf_alias}",
                payload_length: crate::encoding::packet::DEFAULT_PAYLOAD_LENGTH,
            },
            Protocol::Collectd => Self {
                host: Some("239.192.74.66"),
                port: 25826,
                path_template: "${check_alias}/${perf_alias}",
                payload_length: crate::encoding::packet::DEFAULT_PAYLOAD_LENGTH,
            },
            Protocol::Log => Self {
                host: Some("localhost"),
                port: 0,
                path_template: "system.${hostname}.${check_alias}.${perf_alias}",
                payload_length: crate::encoding::packet::DEFAULT_PAYLOAD_LENGTH,
            },
        }
    }
}

/// Bind configured settings plus invocation overrides into a `Destination`
///
/// Overrides are merged on top of the configured options.
pub fn bind_destination(
    settings: &DestinationSettings,
    sender_host: &str,
    overrides: &DestinationOptions,
) -> Result<Destination, ContractError> {
    let options = merge(&settings.options, overrides);
    resolve_destination(&settings.alias, settings.protocol, &options, sender_host)
}

/// Resolve a flat option map into a `Destination`
pub fn resolve_destination(
    alias: &str,
    protocol: Protocol,
    options: &DestinationOptions,
    sender_host: &str,
) -> Result<Destination, ContractError> {
    let defaults = ProtocolDefaults::for_protocol(protocol);

    for key in options.unknown_keys() {
        debug!(destination = %alias, key = %key, "Ignoring unknown option");
    }

    let (host, embedded_port) = match options.get_text(keys::HOST) {
        Some(text) => split_host_port(text.trim()),
        None => (defaults.host.map(str::to_string).unwrap_or_default(), None),
    };
    if host.is_empty() {
        return Err(ContractError::destination(
            alias,
            "no host configured and protocol has no default host",
        ));
    }

    let port = match options.get(keys::PORT) {
        Some(_) => int_option(alias, options, keys::PORT, defaults.port, |p: &u16| *p > 0),
        None => embedded_port.unwrap_or(defaults.port),
    };

    let timeout_secs = int_option(alias, options, keys::TIMEOUT, DEFAULT_TIMEOUT_SECS, |t| {
        *t > 0
    });
    let retry = int_option(alias, options, keys::RETRY, DEFAULT_RETRY, |_| true);
    let payload_length = int_option(
        alias,
        options,
        keys::PAYLOAD_LENGTH,
        defaults.payload_length,
        |l: &usize| (MIN_PAYLOAD_LENGTH..=MAX_PAYLOAD_LENGTH).contains(l),
    );
    let time_offset = int_option(alias, options, keys::TIME_OFFSET, 0i64, |_| true);

    let send_perf = match options.get(keys::SEND_PERFDATA) {
        None => true,
        Some(value) => value.as_bool().unwrap_or_else(|| {
            warn!(
                destination = %alias,
                value = %value.as_text(),
                "Invalid 'send perfdata' value, using default"
            );
            true
        }),
    };

    let path_template = options
        .get_text(keys::PERF_PATH)
        .unwrap_or_else(|| defaults.path_template.to_string());

    let password = options.get_text(keys::PASSWORD);
    if password.is_some() {
        warn!(
            destination = %alias,
            "Password configured but packet signing is not supported; sending unsigned"
        );
    }

    Ok(Destination {
        alias: alias.to_string(),
        protocol,
        host,
        port,
        timeout: Duration::from_secs(timeout_secs),
        retry,
        path_template,
        send_perf,
        sender_host: sender_host.to_string(),
        payload_length,
        password,
        time_offset,
    })
}

/// Split `host:port` / `[v6]:port`; a bare IPv6 literal keeps all its colons
fn split_host_port(text: &str) -> (String, Option<u16>) {
    if let Some(rest) = text.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            return (host.to_string(), port);
        }
    }
    match text.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host.to_string(), Some(port)),
            Err(_) => (text.to_string(), None),
        },
        _ => (text.to_string(), None),
    }
}

/// Read an integer option, falling back to `default` when absent or invalid
fn int_option<T>(
    alias: &str,
    options: &DestinationOptions,
    key: &str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> T
where
    T: TryFrom<i64> + Copy + std::fmt::Display,
{
    let Some(value) = options.get(key) else {
        return default;
    };
    match value
        .as_int()
        .and_then(|i| T::try_from(i).ok())
        .filter(|v| valid(v))
    {
        Some(v) => v,
        None => {
            warn!(
                destination = %alias,
                key = %key,
                value = %OptionValue::as_text(value),
                default = %default,
                "Invalid option value, using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graphite(options: DestinationOptions) -> Result<Destination, ContractError> {
        resolve_destination("main", Protocol::Graphite, &options, "agent01")
    }

    #[test]
    fn test_graphite_defaults() {
        let dest = graphite(DestinationOptions::new().with("host", "graphite.local")).unwrap();
        assert_eq!(dest.host, "graphite.local");
        assert_eq!(dest.port, 2003);
        assert_eq!(dest.timeout, Duration::from_secs(30));
        assert_eq!(dest.retry, 3);
        assert!(dest.send_perf);
        assert_eq!(
            dest.path_template,
            "system.${hostname}.${check_alias}.${perf_alias}"
        );
        assert_eq!(dest.sender_host, "agent01");
        assert_eq!(dest.time_offset, 0);
    }

    #[test]
    fn test_graphite_without_host_is_config_error() {
        let err = graphite(DestinationOptions::new()).unwrap_err();
        assert!(matches!(err, ContractError::Destination { .. }));

        let err = graphite(DestinationOptions::new().with("host", "   ")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_collectd_defaults() {
        let dest = resolve_destination(
            "cd",
            Protocol::Collectd,
            &DestinationOptions::new(),
            "agent01",
        )
        .unwrap();
        assert_eq!(dest.host, "239.192.74.66");
        assert_eq!(dest.port, 25826);
        assert_eq!(dest.payload_length, 1452);
    }

    #[test]
    fn test_buffer_length_sets_payload_length() {
        let options = DestinationOptions::new().with("buffer-length", 512i64);
        let dest = resolve_destination("cd", Protocol::Collectd, &options, "a").unwrap();
        assert_eq!(dest.payload_length, 512);

        let options = DestinationOptions::new().with("payload-length", "900");
        let dest = resolve_destination("cd", Protocol::Collectd, &options, "a").unwrap();
        assert_eq!(dest.payload_length, 900);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let options = DestinationOptions::new()
            .with("host", "h")
            .with("port", "not-a-port")
            .with("timeout", -1i64)
            .with("retry", "many")
            .with("send perfdata", "maybe")
            .with("payload length", 10i64);
        let dest = graphite(options).unwrap();
        assert_eq!(dest.port, 2003);
        assert_eq!(dest.timeout, Duration::from_secs(30));
        assert_eq!(dest.retry, 3);
        assert!(dest.send_perf);
        assert_eq!(dest.payload_length, 1452);
    }

    #[test]
    fn test_host_with_embedded_port() {
        let dest = graphite(DestinationOptions::new().with("host", "10.1.1.1:2103")).unwrap();
        assert_eq!(dest.host, "10.1.1.1");
        assert_eq!(dest.port, 2103);

        // explicit port wins
        let dest = graphite(
            DestinationOptions::new()
                .with("host", "10.1.1.1:2103")
                .with("port", 2203i64),
        )
        .unwrap();
        assert_eq!(dest.port, 2203);

        let dest = graphite(DestinationOptions::new().with("host", "[::1]:2004")).unwrap();
        assert_eq!(dest.host, "::1");
        assert_eq!(dest.port, 2004);

        let dest = graphite(DestinationOptions::new().with("host", "fe80::1")).unwrap();
        assert_eq!(dest.host, "fe80::1");
        assert_eq!(dest.port, 2003);
    }

    #[test]
    fn test_bind_merges_overrides() {
        let settings = DestinationSettings::new("main", Protocol::Graphite)
            .with_option("host", "configured.local")
            .with_option("retry", 5i64)
            .with_option("send perfdata", false);
        let overrides = DestinationOptions::new()
            .with("host", "override.local")
            .with("time-offset", "-30");

        let dest = bind_destination(&settings, "agent", &overrides).unwrap();
        assert_eq!(dest.host, "override.local");
        assert_eq!(dest.retry, 5);
        assert!(!dest.send_perf);
        assert_eq!(dest.time_offset, -30);
    }

    #[test]
    fn test_password_and_unknown_keys_accepted() {
        let options = DestinationOptions::new()
            .with("password", "secret")
            .with("encryption", "aes");
        let dest = resolve_destination("cd", Protocol::Collectd, &options, "a").unwrap();
        assert_eq!(dest.password.as_deref(), Some("secret"));
    }
}
