//! Client configuration.
//!
//! An [`ApiConfig`] is loaded once, validated, and then shared read-only
//! (usually behind an `Arc`) by every call. It is read from a TOML file:
//!
//! ```toml
//! host = "api.allopass.com"
//! network_protocol = "https"
//! network_port = 443
//! network_timeout = 30
//! default_hash = "sha1"
//! default_format = "xml"
//!
//! [global_parameters]
//! locale = "en"
//!
//! [[accounts]]
//! email = "merchant@example.com"
//! api_key = "..."
//! private_key = "..."
//! ```
//!
//! Required keys are checked before any value is interpreted, so a missing
//! key is always reported as [`ApiError::ConfigMissingSection`] rather than
//! as a parse failure.

use std::{collections::BTreeMap, fmt, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{ApiError, Result},
    protocol::{HashAlgorithm, ParamValue, Parameters},
};

/// Default URL path prefix placed before every endpoint path.
pub const DEFAULT_PATH_PREFIX: &str = "rest";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const MAX_TIMEOUT_SECS: u64 = 300;

/// One merchant credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    email: Option<String>,
    api_key: String,
    private_key: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("api_key", &self.api_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl Account {
    /// Creates an account without an email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigCorrupted`] if either key is empty.
    pub fn new(api_key: impl Into<String>, private_key: impl Into<String>) -> Result<Self> {
        let account = Self { email: None, api_key: api_key.into(), private_key: private_key.into() };
        account.validate()?;
        Ok(account)
    }

    /// Attaches the email used to select this account.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Account email, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Public API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Shared secret used for signatures.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::ConfigCorrupted("account api_key must not be empty".to_owned()));
        }
        if self.private_key.trim().is_empty() {
            return Err(ApiError::ConfigCorrupted(
                "account private_key must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// URL scheme used to reach the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkProtocol {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    #[default]
    Https,
}

impl NetworkProtocol {
    /// URL scheme.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl FromStr for NetworkProtocol {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(ApiError::ConfigCorrupted(format!("unsupported network_protocol '{other}'"))),
        }
    }
}

/// Response encoding requested from the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// XML documents.
    #[default]
    Xml,
}

impl ResponseFormat {
    /// Value sent in the `format` parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            other => Err(ApiError::ConfigCorrupted(format!("unsupported default_format '{other}'"))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    host: Option<String>,
    network_protocol: Option<String>,
    network_port: Option<i64>,
    network_timeout: Option<i64>,
    default_hash: Option<String>,
    default_format: Option<String>,
    path_prefix: Option<String>,
    #[serde(default)]
    global_parameters: BTreeMap<String, ParamValue>,
    accounts: Option<Vec<RawAccount>>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    email: Option<String>,
    api_key: Option<String>,
    private_key: Option<String>,
}

fn required<T>(value: Option<T>, section: &str) -> Result<T> {
    value.ok_or_else(|| ApiError::ConfigMissingSection(section.to_owned()))
}

/// Validated service configuration.
///
/// # Examples
///
/// ```
/// use allopass_kit::config::{Account, ApiConfig};
///
/// # fn example() -> allopass_kit::error::Result<()> {
/// let config = ApiConfig::new(
///     "api.allopass.com",
///     vec![Account::new("key", "secret")?.with_email("merchant@example.com")],
/// )?;
///
/// assert_eq!(config.base_url(), "https://api.allopass.com:443/rest");
/// assert_eq!(config.resolve_account(None)?.api_key(), "key");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    host: String,
    protocol: NetworkProtocol,
    port: u16,
    timeout: Duration,
    hash: HashAlgorithm,
    format: ResponseFormat,
    path_prefix: String,
    global_parameters: Parameters,
    accounts: Vec<Account>,
}

impl ApiConfig {
    /// Builds a configuration with service defaults (https, port 443, 30s
    /// timeout, sha1, xml, `rest` prefix).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigCorrupted`] if `host` is unusable or
    /// `accounts` is empty.
    pub fn new(host: impl Into<String>, accounts: Vec<Account>) -> Result<Self> {
        let config = Self {
            host: host.into(),
            protocol: NetworkProtocol::Https,
            port: 443,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            hash: HashAlgorithm::Sha1,
            format: ResponseFormat::Xml,
            path_prefix: DEFAULT_PATH_PREFIX.to_owned(),
            global_parameters: Parameters::new(),
            accounts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// - [`ApiError::ConfigCorrupted`] if the document is not valid TOML or a
    ///   value is out of range
    /// - [`ApiError::ConfigMissingSection`] if a required key is absent
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(toml_str)
            .map_err(|e| ApiError::ConfigCorrupted(format!("invalid TOML: {e}")))?;

        let raw_accounts = required(raw.accounts, "accounts")?;
        let hash = required(raw.default_hash, "default_hash")?;
        let format = required(raw.default_format, "default_format")?;
        let timeout = required(raw.network_timeout, "network_timeout")?;
        let protocol = required(raw.network_protocol, "network_protocol")?;
        let port = required(raw.network_port, "network_port")?;
        let host = required(raw.host, "host")?;

        let mut accounts = Vec::with_capacity(raw_accounts.len());
        for (index, raw_account) in raw_accounts.into_iter().enumerate() {
            let account = Account {
                email: raw_account.email,
                api_key: required(raw_account.api_key, &format!("accounts[{index}].api_key"))?,
                private_key: required(
                    raw_account.private_key,
                    &format!("accounts[{index}].private_key"),
                )?,
            };
            accounts.push(account);
        }

        let timeout = u64::try_from(timeout)
            .map_err(|_| ApiError::ConfigCorrupted("network_timeout must be positive".to_owned()))?;
        let port = u16::try_from(port).map_err(|_| {
            ApiError::ConfigCorrupted(format!("network_port {port} is not a valid port"))
        })?;

        let config = Self {
            host,
            protocol: protocol.parse()?,
            port,
            timeout: Duration::from_secs(timeout),
            hash: hash.parse()?,
            format: format.parse()?,
            path_prefix: raw
                .path_prefix
                .unwrap_or_else(|| DEFAULT_PATH_PREFIX.to_owned())
                .trim_matches('/')
                .to_owned(),
            global_parameters: Parameters::from(raw.global_parameters),
            accounts,
        };
        config.validate()?;

        debug!(
            host = %config.host,
            accounts = config.accounts.len(),
            hash = %config.hash,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigMissing`] if the file does not exist,
    /// [`ApiError::ConfigCorrupted`] if it cannot be read, plus every error of
    /// [`from_toml`](Self::from_toml).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ApiError::ConfigMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigCorrupted(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Validates value ranges and account invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigCorrupted`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() || host.contains(['/', ':', ' ']) {
            return Err(ApiError::ConfigCorrupted(format!("invalid host '{}'", self.host)));
        }
        if self.port == 0 {
            return Err(ApiError::ConfigCorrupted("network_port must not be 0".to_owned()));
        }
        let timeout = self.timeout.as_secs();
        if timeout == 0 || timeout > MAX_TIMEOUT_SECS {
            return Err(ApiError::ConfigCorrupted(format!(
                "network_timeout must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        if self.accounts.is_empty() {
            return Err(ApiError::ConfigCorrupted("at least one account is required".to_owned()));
        }
        for account in &self.accounts {
            account.validate()?;
        }
        self.global_parameters.ensure_unreserved().map_err(|e| {
            ApiError::ConfigCorrupted(format!("global_parameters: {e}"))
        })?;
        Ok(())
    }

    /// Replaces the transport scheme.
    #[must_use]
    pub fn with_protocol(mut self, protocol: NetworkProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Replaces the port.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigCorrupted`] for port 0.
    pub fn with_port(mut self, port: u16) -> Result<Self> {
        self.port = port;
        self.validate()?;
        Ok(self)
    }

    /// Replaces the request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigCorrupted`] outside 1..=300 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    /// Replaces the signature digest.
    #[must_use]
    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Replaces the URL path prefix. Surrounding slashes are dropped.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = prefix.trim_matches('/').to_owned();
        self
    }

    /// Adds a parameter merged into every request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigCorrupted`] if `name` is a reserved protocol name.
    pub fn with_global_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Result<Self> {
        self.global_parameters.insert(name, value);
        self.validate()?;
        Ok(self)
    }

    /// Puts an explicit credential pair in front of the configured accounts,
    /// making it the default account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigCorrupted`] if either key is empty.
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self> {
        self.accounts.insert(0, Account::new(api_key, private_key)?);
        Ok(self)
    }

    /// Selects the signing account.
    ///
    /// `None` selects the first configured account. `Some(email)` selects the
    /// first account with that exact email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AccountNotFound`] if no account has `email`.
    pub fn resolve_account(&self, email: Option<&str>) -> Result<&Account> {
        match email {
            None => self
                .accounts
                .first()
                .ok_or_else(|| ApiError::AccountNotFound("<default>".to_owned())),
            Some(email) => self
                .accounts
                .iter()
                .find(|account| account.email() == Some(email))
                .ok_or_else(|| ApiError::AccountNotFound(email.to_owned())),
        }
    }

    /// `protocol://host:port/prefix`, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let mut url = format!("{}://{}:{}", self.protocol.as_str(), self.host.trim(), self.port);
        if !self.path_prefix.is_empty() {
            url.push('/');
            url.push_str(&self.path_prefix);
        }
        url
    }

    /// Service host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// URL scheme.
    #[must_use]
    pub const fn protocol(&self) -> NetworkProtocol {
        self.protocol
    }

    /// Service port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Signature digest.
    #[must_use]
    pub const fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Response format.
    #[must_use]
    pub const fn format(&self) -> ResponseFormat {
        self.format
    }

    /// URL path prefix.
    #[must_use]
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Parameters merged into every request.
    #[must_use]
    pub const fn global_parameters(&self) -> &Parameters {
        &self.global_parameters
    }

    /// Configured accounts in file order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        host = "api.allopass.com"
        network_protocol = "https"
        network_port = 443
        network_timeout = 30
        default_hash = "sha1"
        default_format = "xml"

        [global_parameters]
        locale = "en"

        [[accounts]]
        email = "a@x"
        api_key = "key-a"
        private_key = "secret-a"

        [[accounts]]
        email = "b@x"
        api_key = "key-b"
        private_key = "secret-b"
    "#;

    #[test]
    fn test_from_toml_valid() {
        let config = ApiConfig::from_toml(VALID).unwrap();
        assert_eq!(config.host(), "api.allopass.com");
        assert_eq!(config.protocol(), NetworkProtocol::Https);
        assert_eq!(config.port(), 443);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.hash(), HashAlgorithm::Sha1);
        assert_eq!(config.format(), ResponseFormat::Xml);
        assert_eq!(config.path_prefix(), "rest");
        assert_eq!(config.accounts().len(), 2);
        assert_eq!(
            config.global_parameters().get("locale"),
            Some(&ParamValue::Text("en".to_owned()))
        );
    }

    #[test]
    fn test_base_url() {
        let config = ApiConfig::from_toml(VALID).unwrap();
        assert_eq!(config.base_url(), "https://api.allopass.com:443/rest");
        let config = config.with_path_prefix("/");
        assert_eq!(config.base_url(), "https://api.allopass.com:443");
    }

    #[test]
    fn test_resolve_account_default_is_first() {
        let config = ApiConfig::from_toml(VALID).unwrap();
        assert_eq!(config.resolve_account(None).unwrap().api_key(), "key-a");
    }

    #[test]
    fn test_resolve_account_by_email() {
        let config = ApiConfig::from_toml(VALID).unwrap();
        assert_eq!(config.resolve_account(Some("b@x")).unwrap().api_key(), "key-b");
    }

    #[test]
    fn test_resolve_account_unknown_email() {
        let config = ApiConfig::from_toml(VALID).unwrap();
        let err = config.resolve_account(Some("c@x")).unwrap_err();
        assert!(matches!(err, ApiError::AccountNotFound(ref email) if email == "c@x"));
    }

    #[test]
    fn test_missing_section_reported_by_name() {
        for key in
            ["host", "network_protocol", "network_port", "network_timeout", "default_hash", "default_format"]
        {
            let toml: String = VALID
                .lines()
                .filter(|line| !line.trim_start().starts_with(&format!("{key} =")))
                .collect::<Vec<_>>()
                .join("\n");
            let err = ApiConfig::from_toml(&toml).unwrap_err();
            assert!(
                matches!(err, ApiError::ConfigMissingSection(ref section) if section == key),
                "expected missing {key}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_missing_accounts() {
        let toml = r#"
            host = "api.allopass.com"
            network_protocol = "https"
            network_port = 443
            network_timeout = 30
            default_hash = "sha1"
            default_format = "xml"
        "#;
        let err = ApiConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ApiError::ConfigMissingSection(ref s) if s == "accounts"));
    }

    #[test]
    fn test_account_missing_private_key() {
        let toml = VALID.replace("private_key = \"secret-b\"", "");
        let err = ApiConfig::from_toml(&toml).unwrap_err();
        assert!(matches!(err, ApiError::ConfigMissingSection(ref s) if s == "accounts[1].private_key"));
    }

    #[test]
    fn test_empty_api_key_is_corrupted() {
        let toml = VALID.replace("api_key = \"key-a\"", "api_key = \"\"");
        assert!(matches!(ApiConfig::from_toml(&toml), Err(ApiError::ConfigCorrupted(_))));
    }

    #[test]
    fn test_invalid_toml_is_corrupted() {
        let err = ApiConfig::from_toml("host = [unterminated").unwrap_err();
        assert!(matches!(err, ApiError::ConfigCorrupted(_)));
    }

    #[test]
    fn test_timeout_bounds() {
        let zero = VALID.replace("network_timeout = 30", "network_timeout = 0");
        assert!(matches!(ApiConfig::from_toml(&zero), Err(ApiError::ConfigCorrupted(_))));

        let large = VALID.replace("network_timeout = 30", "network_timeout = 301");
        assert!(matches!(ApiConfig::from_toml(&large), Err(ApiError::ConfigCorrupted(_))));

        let max = VALID.replace("network_timeout = 30", "network_timeout = 300");
        assert!(ApiConfig::from_toml(&max).is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let toml = VALID.replace("network_port = 443", "network_port = 70000");
        assert!(matches!(ApiConfig::from_toml(&toml), Err(ApiError::ConfigCorrupted(_))));
    }

    #[test]
    fn test_unsupported_format_and_hash() {
        let json = VALID.replace("default_format = \"xml\"", "default_format = \"json\"");
        assert!(matches!(ApiConfig::from_toml(&json), Err(ApiError::ConfigCorrupted(_))));

        let md5 = VALID.replace("default_hash = \"sha1\"", "default_hash = \"md5\"");
        assert!(matches!(ApiConfig::from_toml(&md5), Err(ApiError::ConfigCorrupted(_))));
    }

    #[test]
    fn test_reserved_global_parameter_rejected() {
        let toml = VALID.replace("locale = \"en\"", "api_key = \"override\"");
        assert!(matches!(ApiConfig::from_toml(&toml), Err(ApiError::ConfigCorrupted(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ApiConfig::from_file("/nonexistent/allopass.toml").unwrap_err();
        assert!(matches!(err, ApiError::ConfigMissing(_)));
    }

    #[test]
    fn test_with_credentials_becomes_default() {
        let config = ApiConfig::from_toml(VALID).unwrap().with_credentials("k", "s").unwrap();
        let account = config.resolve_account(None).unwrap();
        assert_eq!(account.api_key(), "k");
        assert_eq!(account.email(), None);
        assert_eq!(config.resolve_account(Some("a@x")).unwrap().api_key(), "key-a");
    }

    #[test]
    fn test_programmatic_builder() {
        let config = ApiConfig::new("localhost", vec![Account::new("k", "s").unwrap()])
            .unwrap()
            .with_protocol(NetworkProtocol::Http)
            .with_port(8080)
            .unwrap()
            .with_hash(HashAlgorithm::Sha512);
        assert_eq!(config.base_url(), "http://localhost:8080/rest");
        assert_eq!(config.hash(), HashAlgorithm::Sha512);
        assert!(config.clone().with_timeout(Duration::from_secs(0)).is_err());
    }

    #[test]
    fn test_new_requires_account() {
        assert!(matches!(ApiConfig::new("h", Vec::new()), Err(ApiError::ConfigCorrupted(_))));
    }

    #[test]
    fn test_account_debug_redacts_private_key() {
        let account = Account::new("key", "top-secret").unwrap();
        assert!(!format!("{account:?}").contains("top-secret"));
    }
}
