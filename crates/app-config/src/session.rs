use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// The default expiration time for stored sessions.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(86400);

/// The default key prefix for stored sessions.
pub const DEFAULT_PREFIX: &str = "sf2s";

/// Session storage options as found in configuration files.
///
/// The connections can be given in any of four shapes:
///
/// ```yaml
/// # A single server, the connection keys sit at the top level.
/// host: 10.0.0.1
/// port: 11211
///
/// # A single connection entry.
/// connection: "10.0.0.1:11211"
///
/// # A list (or keyed map) of connection entries.
/// connections:
///   - "10.0.0.1:11211"
///   - { host: 10.0.0.2, port: 11212, weight: 2 }
///
/// # The legacy save path.
/// save_path: "tcp://10.0.0.1:11211?persistent=1&weight=1&timeout=1,tcp://10.0.0.2:11212"
/// ```
///
/// Use [`SessionOptions::source`] to find out which of these applies.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Connection keys given at the top level, e.g. `host` and `port`.
    #[serde(flatten)]
    pub server: ConnectionSpec,
    /// A single connection entry.
    pub connection: Option<ConnectionEntry>,
    /// A list or keyed map of connection entries.
    pub connections: Option<Connections>,
    /// A comma-separated list of server addresses.
    ///
    /// ## Example
    /// ```text
    /// tcp://1.2.3.4:1121?persistent=1&weight=1&timeout=1,tcp://1.2.3.5:1121
    /// ```
    pub save_path: Option<String>,
    /// The number of seconds after which a stored session expires.
    /// Defaults to [`DEFAULT_EXPIRATION`].
    pub expiretime: Option<u32>,
    /// The prefix applied to every session key. Defaults to [`DEFAULT_PREFIX`].
    pub prefix: Option<String>,
}

/// The connection configuration shape selected from a [`SessionOptions`] bag.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionSource<'a> {
    /// The top-level `host` / `port` keys describe the only server.
    Host(ConnectionSpec),
    /// The `connection` key describes the only server.
    Connection(&'a ConnectionEntry),
    /// The `connections` key describes the servers, in declaration order.
    /// Entries of a keyed map carry their key.
    ConnectionList(Vec<(Option<&'a str>, &'a ConnectionEntry)>),
    /// The legacy `save_path` string.
    SavePath(&'a str),
    /// None of the recognized keys is present.
    Unconfigured,
}

impl SessionOptions {
    /// Creates options for the legacy `save_path` form.
    pub fn from_save_path<S: Into<String>>(save_path: S) -> Self {
        Self {
            save_path: Some(save_path.into()),
            ..Default::default()
        }
    }

    /// Creates options for a list of connection entries.
    pub fn from_connections<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ConnectionEntry>,
    {
        Self {
            connections: Some(Connections::List(entries.into_iter().collect())),
            ..Default::default()
        }
    }

    /// Selects the connection shape. The first matching rule wins:
    /// `host`/`port`, then `connection`, then `connections`, then `save_path`.
    pub fn source(&self) -> ConnectionSource<'_> {
        if self.server.host.is_some() || self.server.port.is_some() {
            let mut server = self.server.clone();
            // The top-level prefix is shared by the handler and the single server.
            server.prefix = self.prefix.clone();
            return ConnectionSource::Host(server);
        }

        if let Some(connection) = &self.connection {
            return ConnectionSource::Connection(connection);
        }

        if let Some(connections) = &self.connections {
            return ConnectionSource::ConnectionList(connections.entries());
        }

        match &self.save_path {
            Some(save_path) => ConnectionSource::SavePath(save_path),
            None => ConnectionSource::Unconfigured,
        }
    }
}

/// One server as described by a structured configuration entry.
///
/// Every field is optional; missing connection fields fall back to defaults
/// when the entry is normalized.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSpec {
    /// The URI scheme, `tcp` unless specified.
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<ScalarValue>,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Alias of `pass`; takes precedence when both are set.
    pub password: Option<String>,
    pub path: Option<String>,
    pub database: Option<ScalarValue>,
    pub alias: Option<String>,
    pub prefix: Option<String>,
    pub persistent: Option<ScalarValue>,
    pub weight: Option<ScalarValue>,
    /// The timeout in seconds.
    pub timeout: Option<ScalarValue>,
}

impl ConnectionSpec {
    /// Creates a specification naming only the host.
    pub fn with_host<S: Into<String>>(host: S) -> Self {
        Self {
            host: Some(host.into()),
            ..Default::default()
        }
    }

    /// Gets the password, accepting both `password` and `pass`.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().or(self.pass.as_deref())
    }
}

/// A single entry of the `connection` or `connections` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionEntry {
    /// A bare address such as `"10.0.0.1"`, `"10.0.0.1:11211"` or
    /// `"tcp://10.0.0.1:11211"`.
    Address(String),
    /// Host-only shorthand; the first element is the host.
    List(Vec<String>),
    /// A structured entry.
    Spec(ConnectionSpec),
}

impl From<&str> for ConnectionEntry {
    fn from(value: &str) -> Self {
        Self::Address(value.to_string())
    }
}

impl From<ConnectionSpec> for ConnectionEntry {
    fn from(value: ConnectionSpec) -> Self {
        Self::Spec(value)
    }
}

/// The `connections` key, either a list or a map keyed by alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Connections {
    List(Vec<ConnectionEntry>),
    Named(IndexMap<String, ConnectionEntry>),
}

impl Connections {
    /// Gets the entries in declaration order, together with their key
    /// if the entries are keyed.
    pub fn entries(&self) -> Vec<(Option<&str>, &ConnectionEntry)> {
        match self {
            Connections::List(list) => list.iter().map(|entry| (None, entry)).collect(),
            Connections::Named(map) => map
                .iter()
                .map(|(alias, entry)| (Some(alias.as_str()), entry))
                .collect(),
        }
    }
}

/// A loosely typed configuration value.
///
/// Values such as ports, weights or flags arrive as numbers from YAML files
/// but as text from URI query strings; this type accepts both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    /// Indicates whether this is an empty string.
    pub fn is_empty(&self) -> bool {
        matches!(self, ScalarValue::Text(text) if text.trim().is_empty())
    }

    /// Interprets the value as a flag. Numbers are `true` when non-zero;
    /// text accepts `1`/`0`, `true`/`false`, `on`/`off` and `yes`/`no`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(value) => Some(*value),
            ScalarValue::Integer(value) => Some(*value != 0),
            ScalarValue::Float(value) => Some(*value != 0.0),
            ScalarValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(true),
                "" | "0" | "false" | "off" | "no" => Some(false),
                _ => None,
            },
        }
    }

    /// Interprets the value as a non-negative integer fitting into `T`.
    pub fn as_integer<T: TryFrom<i64>>(&self) -> Option<T> {
        let value = match self {
            ScalarValue::Integer(value) => *value,
            ScalarValue::Float(value) if value.fract() == 0.0 => *value as i64,
            ScalarValue::Text(text) => text.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        if value < 0 {
            return None;
        }
        T::try_from(value).ok()
    }

    /// Interprets the value as a number of seconds.
    pub fn as_seconds(&self) -> Option<Duration> {
        let seconds = match self {
            ScalarValue::Integer(value) => *value as f64,
            ScalarValue::Float(value) => *value,
            ScalarValue::Text(text) => text.trim().parse::<f64>().ok()?,
            ScalarValue::Bool(_) => return None,
        };
        Duration::try_from_secs_f64(seconds).ok()
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Bool(value) => write!(f, "{value}"),
            ScalarValue::Integer(value) => write!(f, "{value}"),
            ScalarValue::Float(value) => write!(f, "{value}"),
            ScalarValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The options relayed to the session handler itself.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerOptions {
    /// The number of seconds after which a stored session expires.
    pub expiretime: Option<u32>,
    /// The prefix applied to every session key.
    pub prefix: Option<String>,
}

impl HandlerOptions {
    /// Gets the expiration time, falling back to [`DEFAULT_EXPIRATION`].
    pub fn expiration(&self) -> Duration {
        self.expiretime
            .map_or(DEFAULT_EXPIRATION, |secs| Duration::from_secs(secs as _))
    }

    /// Gets the key prefix, falling back to [`DEFAULT_PREFIX`].
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }
}

impl From<&SessionOptions> for HandlerOptions {
    fn from(options: &SessionOptions) -> Self {
        Self {
            expiretime: options.expiretime,
            prefix: options.prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_host_shape_works() {
        let yaml = r#"
            host: 10.0.0.1
            port: 1121
            weight: 2
            password: secret
            prefix: "sess_"
            expiretime: 300
        "#;

        let options: SessionOptions =
            serde_yaml::from_str(yaml).expect("Failed to deserialize session options");
        assert_eq!(options.server.host.as_deref(), Some("10.0.0.1"));
        assert_eq!(options.server.port, Some(ScalarValue::Integer(1121)));
        assert_eq!(options.server.password(), Some("secret"));
        assert_eq!(options.expiretime, Some(300));

        match options.source() {
            ConnectionSource::Host(server) => {
                assert_eq!(server.weight, Some(ScalarValue::Integer(2)));
                assert_eq!(server.prefix.as_deref(), Some("sess_"));
            }
            other => panic!("Unexpected source {other:?}"),
        }
    }

    #[test]
    fn deserialize_connection_list_works() {
        let yaml = r#"
            connections:
              - "h1:1121"
              - host: h2
                port: "1122"
                weight: 2
              - [h3]
        "#;

        let options: SessionOptions =
            serde_yaml::from_str(yaml).expect("Failed to deserialize session options");
        let ConnectionSource::ConnectionList(entries) = options.source() else {
            panic!("Expected a connection list");
        };

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (None, &ConnectionEntry::from("h1:1121")));
        match entries[1].1 {
            ConnectionEntry::Spec(spec) => {
                assert_eq!(spec.host.as_deref(), Some("h2"));
                assert_eq!(spec.port, Some(ScalarValue::from("1122")));
            }
            other => panic!("Unexpected entry {other:?}"),
        }
        assert_eq!(
            entries[2].1,
            &ConnectionEntry::List(vec![String::from("h3")])
        );
    }

    #[test]
    fn keyed_connections_keep_declaration_order() {
        let yaml = r#"
            connections:
              zulu: "h1"
              alpha: { host: h2 }
        "#;

        let options: SessionOptions =
            serde_yaml::from_str(yaml).expect("Failed to deserialize session options");
        let ConnectionSource::ConnectionList(entries) = options.source() else {
            panic!("Expected a connection list");
        };

        let aliases: Vec<_> = entries.iter().map(|(alias, _)| *alias).collect();
        assert_eq!(aliases, vec![Some("zulu"), Some("alpha")]);
    }

    #[test]
    fn source_precedence_works() {
        let mut options = SessionOptions::from_save_path("h1:1121");
        assert_eq!(options.source(), ConnectionSource::SavePath("h1:1121"));

        options.connections = Some(Connections::List(vec![ConnectionEntry::from("h2")]));
        assert!(matches!(
            options.source(),
            ConnectionSource::ConnectionList(_)
        ));

        options.connection = Some(ConnectionEntry::from("h3"));
        assert!(matches!(options.source(), ConnectionSource::Connection(_)));

        options.server.port = Some(ScalarValue::Integer(1121));
        assert!(matches!(options.source(), ConnectionSource::Host(_)));
    }

    #[test]
    fn empty_options_are_unconfigured() {
        let options: SessionOptions =
            serde_yaml::from_str("prefix: sess_").expect("Failed to deserialize session options");
        assert_eq!(options.source(), ConnectionSource::Unconfigured);
    }

    #[test]
    fn handler_options_take_only_expiretime_and_prefix() {
        let options = SessionOptions {
            expiretime: Some(60),
            prefix: Some(String::from("p_")),
            save_path: Some(String::from("h1:1121")),
            ..Default::default()
        };

        let handler_options = HandlerOptions::from(&options);
        assert_eq!(
            handler_options,
            HandlerOptions {
                expiretime: Some(60),
                prefix: Some(String::from("p_")),
            }
        );
        assert_eq!(handler_options.expiration(), Duration::from_secs(60));
        assert_eq!(HandlerOptions::default().prefix(), DEFAULT_PREFIX);
        assert_eq!(HandlerOptions::default().expiration(), DEFAULT_EXPIRATION);
    }

    #[test]
    fn scalar_conversions_work() {
        assert_eq!(ScalarValue::from("1").as_bool(), Some(true));
        assert_eq!(ScalarValue::from("Off").as_bool(), Some(false));
        assert_eq!(ScalarValue::from("maybe").as_bool(), None);
        assert_eq!(ScalarValue::Integer(3).as_integer::<u32>(), Some(3));
        assert_eq!(ScalarValue::from(" 11211 ").as_integer::<u16>(), Some(11211));
        assert_eq!(ScalarValue::Integer(70000).as_integer::<u16>(), None);
        assert_eq!(ScalarValue::Integer(-1).as_integer::<u32>(), None);
        assert_eq!(
            ScalarValue::from("1.5").as_seconds(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(ScalarValue::from("1e20").as_seconds(), None);
        assert_eq!(ScalarValue::Float(-1.0).as_seconds(), None);
        assert_eq!(ScalarValue::from("NaN").as_seconds(), None);
        assert!(ScalarValue::from("").is_empty());
    }
}
