// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Proxy-Authorization` credentials (RFC 7235 §4.4).
//!
//! Every field is bounded before it is stored: scheme and parameter names
//! are tokens of at most 64 bytes, values at most 2048 bytes without control
//! characters, and at most 30 parameters per header.

use std::collections::BTreeMap;
use std::fmt;

use smol_str::SmolStr;

const MAX_SCHEME_LEN: usize = 64;
const MAX_PARAMS: usize = 30;
const MAX_NAME_LEN: usize = 64;
const MAX_VALUE_LEN: usize = 2048;

/// Digest fields that are always sent as quoted strings.
const QUOTED_DIGEST_FIELDS: &[&str] = &["cnonce", "nonce", "realm", "response", "uri", "username"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// Scheme with nothing after it.
    MissingParams,
    BadScheme(SmolStr),
    BadParamName(SmolStr),
    ControlChar { param: SmolStr },
    TooLong { field: &'static str, max: usize },
    TooManyParams { max: usize },
    DuplicateParam(SmolStr),
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationError::MissingParams => write!(f, "scheme not followed by parameters"),
            AuthorizationError::BadScheme(scheme) => write!(f, "bad scheme {:?}", scheme),
            AuthorizationError::BadParamName(name) => write!(f, "bad parameter name {:?}", name),
            AuthorizationError::ControlChar { param } => {
                write!(f, "control character in {}", param)
            }
            AuthorizationError::TooLong { field, max } => {
                write!(f, "{} longer than {} bytes", field, max)
            }
            AuthorizationError::TooManyParams { max } => {
                write!(f, "more than {} parameters", max)
            }
            AuthorizationError::DuplicateParam(name) => write!(f, "{} given twice", name),
        }
    }
}

impl std::error::Error for AuthorizationError {}

/// RFC 7230 `tchar`.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_tchar)
}

fn bounded(field: &'static str, s: &str, max: usize) -> Result<(), AuthorizationError> {
    if s.len() > max {
        return Err(AuthorizationError::TooLong { field, max });
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{}", ch)?;
    }
    f.write_str("\"")
}

/// A scheme plus case-insensitive parameters.
///
/// # Examples
///
/// ```
/// use warden_core::ProxyAuthorization;
///
/// let mut auth = ProxyAuthorization::new("Digest").unwrap();
/// auth.add_param("username", "alice").unwrap();
/// auth.add_param("qop", "auth").unwrap();
///
/// assert!(auth.is_digest());
/// assert_eq!(auth.param("USERNAME"), Some("alice"));
/// assert_eq!(auth.to_string(), "Digest qop=auth, username=\"alice\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAuthorization {
    scheme: SmolStr,
    params: BTreeMap<SmolStr, SmolStr>,
}

impl ProxyAuthorization {
    pub fn new(scheme: impl Into<SmolStr>) -> Result<Self, AuthorizationError> {
        let scheme = scheme.into();
        bounded("scheme", &scheme, MAX_SCHEME_LEN)?;
        if !is_token(&scheme) {
            return Err(AuthorizationError::BadScheme(scheme));
        }
        Ok(Self {
            scheme,
            params: BTreeMap::new(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_digest(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("digest")
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name.to_ascii_lowercase().as_str())
            .map(SmolStr::as_str)
    }

    /// Adds a parameter. A name already present is an error.
    pub fn add_param(
        &mut self,
        name: impl Into<SmolStr>,
        value: impl Into<SmolStr>,
    ) -> Result<(), AuthorizationError> {
        self.store(name.into(), value.into(), false)
    }

    /// Adds or replaces a parameter; the last value for a name wins.
    pub fn add_param_overwrite(
        &mut self,
        name: impl Into<SmolStr>,
        value: impl Into<SmolStr>,
    ) -> Result<(), AuthorizationError> {
        self.store(name.into(), value.into(), true)
    }

    fn store(
        &mut self,
        name: SmolStr,
        value: SmolStr,
        replace: bool,
    ) -> Result<(), AuthorizationError> {
        bounded("parameter name", &name, MAX_NAME_LEN)?;
        if !is_token(&name) {
            return Err(AuthorizationError::BadParamName(name));
        }
        bounded("parameter value", &value, MAX_VALUE_LEN)?;
        // HTAB is legal inside quoted-string.
        if value.chars().any(|c| c.is_control() && c != '\t') {
            return Err(AuthorizationError::ControlChar { param: name });
        }

        let key = SmolStr::new(name.to_ascii_lowercase());
        let present = self.params.contains_key(&key);
        if present && !replace {
            return Err(AuthorizationError::DuplicateParam(key));
        }
        if !present && self.params.len() >= MAX_PARAMS {
            return Err(AuthorizationError::TooManyParams { max: MAX_PARAMS });
        }
        self.params.insert(key, value);
        Ok(())
    }
}

impl fmt::Display for ProxyAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scheme)?;
        let mut sep = " ";
        for (name, value) in &self.params {
            write!(f, "{}{}=", sep, name)?;
            sep = ", ";
            let quoted = self.is_digest() && QUOTED_DIGEST_FIELDS.contains(&name.as_str());
            if quoted || !is_token(value) {
                write_quoted(f, value)?;
            } else {
                f.write_str(value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_scheme() {
        assert!(ProxyAuthorization::new("").is_err());
        assert!(ProxyAuthorization::new("Dig est").is_err());
        assert_eq!(
            ProxyAuthorization::new("D".repeat(65)),
            Err(AuthorizationError::TooLong {
                field: "scheme",
                max: MAX_SCHEME_LEN
            })
        );
    }

    #[test]
    fn params_are_case_insensitive() {
        let mut auth = ProxyAuthorization::new("Digest").unwrap();
        auth.add_param("NONCE", "5f5e1000").unwrap();
        assert_eq!(auth.param("nonce"), Some("5f5e1000"));
        assert_eq!(auth.param("Nonce"), Some("5f5e1000"));
        assert_eq!(auth.param("missing"), None);
    }

    #[test]
    fn duplicates_only_allowed_when_overwriting() {
        let mut auth = ProxyAuthorization::new("Digest").unwrap();
        auth.add_param("username", "alice").unwrap();
        assert_eq!(
            auth.add_param("USERNAME", "bob"),
            Err(AuthorizationError::DuplicateParam("username".into()))
        );
        auth.add_param_overwrite("username", "bob").unwrap();
        assert_eq!(auth.param("username"), Some("bob"));
    }

    #[test]
    fn rejects_control_chars_but_not_tab() {
        let mut auth = ProxyAuthorization::new("Digest").unwrap();
        assert!(matches!(
            auth.add_param("uri", "/a\r\nb"),
            Err(AuthorizationError::ControlChar { .. })
        ));
        auth.add_param("opaque", "a\tb").unwrap();
    }

    #[test]
    fn bounds_names_values_and_count() {
        let mut auth = ProxyAuthorization::new("Digest").unwrap();
        assert!(matches!(
            auth.add_param("n".repeat(MAX_NAME_LEN + 1), "v"),
            Err(AuthorizationError::TooLong { field: "parameter name", .. })
        ));
        assert!(matches!(
            auth.add_param("cnonce", "x".repeat(MAX_VALUE_LEN + 1)),
            Err(AuthorizationError::TooLong { field: "parameter value", .. })
        ));
        auth.add_param("cnonce", "x".repeat(MAX_VALUE_LEN)).unwrap();

        for i in 1..MAX_PARAMS {
            auth.add_param(format!("p{}", i), "v").unwrap();
        }
        assert_eq!(
            auth.add_param_overwrite("extra", "v"),
            Err(AuthorizationError::TooManyParams { max: MAX_PARAMS })
        );
        // Replacing an existing name is not a new parameter.
        auth.add_param_overwrite("p1", "w").unwrap();
    }

    #[test]
    fn display_quotes_digest_fields() {
        let mut auth = ProxyAuthorization::new("Digest").unwrap();
        auth.add_param("username", "alice").unwrap();
        auth.add_param("qop", "auth").unwrap();
        auth.add_param("nc", "00000001").unwrap();
        auth.add_param("realm", "warden \"proxy\"").unwrap();
        assert_eq!(
            auth.to_string(),
            "Digest nc=00000001, qop=auth, realm=\"warden \\\"proxy\\\"\", username=\"alice\""
        );
    }

    #[test]
    fn display_quotes_non_tokens_for_other_schemes() {
        let mut auth = ProxyAuthorization::new("Custom").unwrap();
        auth.add_param("username", "alice").unwrap();
        auth.add_param("path", "/a b").unwrap();
        assert_eq!(auth.to_string(), "Custom path=\"/a b\", username=alice");
    }
}
