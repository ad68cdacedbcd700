use crate::descriptor::{canonical_uri, ConnectionDescriptor, DEFAULT_SCHEME};
use app_config::{ConnectionEntry, ConnectionSource, ConnectionSpec, ScalarValue, SessionOptions};
use tracing::{debug, trace, warn};
use url::Url;

/// Selects how the legacy `save_path` string is decoded.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum ParseStrategy {
    /// Every segment is a URI such as
    /// `tcp://1.2.3.4:1121?persistent=1&weight=1&timeout=1`.
    #[default]
    Uri,
    /// Every segment is a `host:port` pair. Schemes, credentials and
    /// parameters are not supported, and malformed segments fall back to
    /// the defaults.
    Simple,
}

/// Turns session storage options into an ordered list of connection descriptors.
#[derive(Debug, Default, Copy, Clone)]
pub struct ConnectionDescriptorParser {
    strategy: ParseStrategy,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed connection URI {uri}")]
    MalformedUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid port {value}")]
    InvalidPort { value: String },
    #[error("Invalid value {value} for connection parameter {name}")]
    InvalidParameter { name: &'static str, value: String },
}

/// The values filling in for missing hosts and ports.
#[derive(Debug, Copy, Clone)]
struct Defaults<'a> {
    host: &'a str,
    port: u16,
}

impl ConnectionDescriptorParser {
    pub fn new(strategy: ParseStrategy) -> Self {
        Self { strategy }
    }

    /// Parses the connections configured in `options`.
    ///
    /// The descriptors are returned in declaration order. Options naming no
    /// connections at all yield an empty list. Any malformed connection fails
    /// the whole call.
    pub fn parse(
        &self,
        options: &SessionOptions,
        default_host: &str,
        default_port: u16,
    ) -> Result<Vec<ConnectionDescriptor>, ParseError> {
        let defaults = Defaults {
            host: default_host,
            port: default_port,
        };

        let descriptors = match options.source() {
            ConnectionSource::Host(server) => vec![from_spec(&server, None, defaults)?],
            ConnectionSource::Connection(entry) => vec![from_entry(entry, None, defaults)?],
            ConnectionSource::ConnectionList(entries) => entries
                .into_iter()
                .map(|(key, entry)| from_entry(entry, key, defaults))
                .collect::<Result<Vec<_>, _>>()?,
            ConnectionSource::SavePath(save_path) => self.parse_save_path(save_path, defaults)?,
            ConnectionSource::Unconfigured => {
                debug!("No connections configured");
                Vec::new()
            }
        };

        debug!(
            "Parsed {count} connection{plural}",
            count = descriptors.len(),
            plural = if descriptors.len() == 1 { "" } else { "s" }
        );
        Ok(descriptors)
    }

    fn parse_save_path(
        &self,
        save_path: &str,
        defaults: Defaults,
    ) -> Result<Vec<ConnectionDescriptor>, ParseError> {
        let segments = save_path
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty());

        match self.strategy {
            ParseStrategy::Uri => segments
                .map(|segment| from_uri_segment(segment, defaults))
                .collect(),
            ParseStrategy::Simple => Ok(segments
                .map(|segment| from_simple_segment(segment, defaults))
                .collect()),
        }
    }
}

fn from_entry(
    entry: &ConnectionEntry,
    key: Option<&str>,
    defaults: Defaults,
) -> Result<ConnectionDescriptor, ParseError> {
    match entry {
        ConnectionEntry::Address(address) if address.contains("://") => {
            let mut descriptor = from_uri_segment(address, defaults)?;
            if descriptor.alias.is_none() {
                descriptor.alias = key.map(String::from);
            }
            Ok(descriptor)
        }
        ConnectionEntry::Address(address) => from_spec(&split_address(address), key, defaults),
        ConnectionEntry::List(hosts) => {
            let spec = hosts
                .first()
                .map(ConnectionSpec::with_host)
                .unwrap_or_default();
            from_spec(&spec, key, defaults)
        }
        ConnectionEntry::Spec(spec) => from_spec(spec, key, defaults),
    }
}

/// Splits `host:port` addresses. Anything else is taken as the host.
fn split_address(address: &str) -> ConnectionSpec {
    if let Some((host, port)) = address.rsplit_once(':') {
        let is_port = !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
        let is_plain_host = !host.contains(':') || host.starts_with('[');
        if is_port && is_plain_host {
            return ConnectionSpec {
                host: Some(host.to_string()),
                port: Some(ScalarValue::from(port)),
                ..Default::default()
            };
        }
    }
    ConnectionSpec::with_host(address)
}

fn from_spec(
    spec: &ConnectionSpec,
    key: Option<&str>,
    defaults: Defaults,
) -> Result<ConnectionDescriptor, ParseError> {
    let scheme = non_empty(spec.scheme.as_deref()).unwrap_or(DEFAULT_SCHEME);
    let host = non_empty(spec.host.as_deref()).unwrap_or(defaults.host);
    let port = match &spec.port {
        Some(port) if !port.is_empty() => port
            .as_integer::<u16>()
            .ok_or_else(|| ParseError::InvalidPort {
                value: port.to_string(),
            })?,
        _ => defaults.port,
    };

    let uri = canonical_uri(
        scheme,
        host,
        port,
        non_empty(spec.user.as_deref()),
        spec.password(),
        non_empty(spec.path.as_deref()),
    )?;

    let mut descriptor = ConnectionDescriptor::from_uri(&uri, defaults.host, defaults.port);
    let parameters = Parameters {
        database: spec.database.clone(),
        alias: spec.alias.clone().or_else(|| key.map(String::from)),
        prefix: spec.prefix.clone(),
        persistent: spec.persistent.clone(),
        weight: spec.weight.clone(),
        timeout: spec.timeout.clone(),
    };
    parameters.apply_to(&mut descriptor)?;

    trace!("Normalized connection {descriptor}");
    Ok(descriptor)
}

fn from_uri_segment(segment: &str, defaults: Defaults) -> Result<ConnectionDescriptor, ParseError> {
    let text = if segment.contains("://") {
        segment.to_string()
    } else {
        format!("{DEFAULT_SCHEME}://{segment}")
    };

    let uri = Url::parse(&text).map_err(|source| ParseError::MalformedUri {
        uri: redact(&text),
        source,
    })?;

    let mut descriptor = ConnectionDescriptor::from_uri(&uri, defaults.host, defaults.port);
    Parameters::from_query(&uri).apply_to(&mut descriptor)?;

    trace!("Normalized connection {descriptor}");
    Ok(descriptor)
}

fn from_simple_segment(segment: &str, defaults: Defaults) -> ConnectionDescriptor {
    let mut parts = segment.split(':').map(str::trim);
    let host = parts
        .next()
        .filter(|host| !host.is_empty())
        .unwrap_or(defaults.host);

    let port = match parts.next().filter(|port| !port.is_empty()) {
        None => defaults.port,
        Some(port) => port.parse().unwrap_or_else(|_| {
            warn!(
                "Invalid port {port} for host {host}, using {default_port} instead",
                default_port = defaults.port
            );
            defaults.port
        }),
    };

    ConnectionDescriptor::new(DEFAULT_SCHEME, host, port)
}

/// Connection parameters that are not part of the URI itself.
#[derive(Debug, Default)]
struct Parameters {
    database: Option<ScalarValue>,
    alias: Option<String>,
    prefix: Option<String>,
    persistent: Option<ScalarValue>,
    weight: Option<ScalarValue>,
    timeout: Option<ScalarValue>,
}

impl Parameters {
    /// Reads the parameters from the query string. Unknown parameters
    /// such as `retry_interval` are ignored.
    fn from_query(uri: &Url) -> Self {
        let mut parameters = Self::default();
        for (name, value) in uri.query_pairs() {
            let value = value.into_owned();
            match name.as_ref() {
                "database" => parameters.database = Some(ScalarValue::from(value)),
                "alias" => parameters.alias = Some(value),
                "prefix" => parameters.prefix = Some(value),
                "persistent" => parameters.persistent = Some(ScalarValue::from(value)),
                "weight" => parameters.weight = Some(ScalarValue::from(value)),
                "timeout" => parameters.timeout = Some(ScalarValue::from(value)),
                _ => trace!("Ignoring connection parameter {name}"),
            }
        }
        parameters
    }

    fn apply_to(self, descriptor: &mut ConnectionDescriptor) -> Result<(), ParseError> {
        descriptor.database = self
            .database
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());
        descriptor.alias = self.alias.filter(|alias| !alias.is_empty());
        descriptor.prefix = self.prefix.filter(|prefix| !prefix.is_empty());
        descriptor.persistent = convert("persistent", self.persistent, ScalarValue::as_bool)?;
        descriptor.weight = convert("weight", self.weight, ScalarValue::as_integer::<u32>)?;
        descriptor.timeout = convert("timeout", self.timeout, ScalarValue::as_seconds)?;
        Ok(())
    }
}

/// Converts a present, non-empty value, failing if it has the wrong type.
fn convert<T>(
    name: &'static str,
    value: Option<ScalarValue>,
    f: impl Fn(&ScalarValue) -> Option<T>,
) -> Result<Option<T>, ParseError> {
    match value {
        Some(value) if !value.is_empty() => match f(&value) {
            Some(converted) => Ok(Some(converted)),
            None => Err(ParseError::InvalidParameter {
                name,
                value: value.to_string(),
            }),
        },
        _ => Ok(None),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Removes the user-info from a URI so it can be logged.
fn redact(uri: &str) -> String {
    if let Some((scheme, rest)) = uri.split_once("://") {
        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        if let Some(at) = rest[..authority_end].rfind('@') {
            return format!("{scheme}://***@{}", &rest[at + 1..]);
        }
    }
    uri.to_string()
}
