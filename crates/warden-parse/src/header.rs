use smol_str::SmolStr;
use warden_core::{AuthorizationError, ProxyAuthorization};

/// Parses a `Proxy-Authorization` value of the form `scheme key=value, ...`.
///
/// The scheme must be followed by a space. Parts without `=` are ignored,
/// and the last occurrence of a repeated key wins. The caller decides
/// whether the scheme and parameter set are acceptable.
pub fn parse_proxy_authorization(value: &str) -> Result<ProxyAuthorization, AuthorizationError> {
    let (scheme, remainder) = value
        .trim_start()
        .split_once(' ')
        .ok_or(AuthorizationError::MissingParams)?;

    let mut header = ProxyAuthorization::new(SmolStr::new(scheme.trim()))?;
    for part in split_quoted_commas(remainder) {
        if let Some((name, val)) = part.split_once('=') {
            header.add_param_overwrite(SmolStr::new(name.trim()), unquote(val.trim()))?;
        }
    }
    Ok(header)
}

fn unquote(value: &str) -> SmolStr {
    let inner = match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) => inner,
        None => return SmolStr::new(value),
    };
    if !inner.contains('\\') {
        return SmolStr::new(inner);
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    SmolStr::new(out)
}

fn split_quoted_commas(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for ch in input.chars() {
        match ch {
            _ if escaped => {
                escaped = false;
                current.push(ch);
            }
            '\\' if in_quotes => {
                escaped = true;
                current.push(ch);
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_owned());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_owned());
    }
    parts
}
