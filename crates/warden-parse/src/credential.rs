use warden_core::{ConfigError, UserCredential};

/// Parses one `username:password[:port]` entry.
///
/// Returns `Ok(None)` for empty input. An empty port field (`user:pass:`)
/// leaves the credential unrestricted.
pub fn parse_credential_entry(entry: &str) -> Result<Option<UserCredential>, ConfigError> {
    if entry.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = entry.split(':').collect();
    if fields.len() < 2 || fields.len() > 3 {
        return Err(ConfigError::MalformedCredential(entry.to_owned()));
    }

    let (user, passwd) = (fields[0], fields[1]);
    if user.is_empty() || passwd.is_empty() {
        return Err(ConfigError::EmptyField(entry.to_owned()));
    }

    let port = match fields.get(2) {
        Some(raw) if !raw.is_empty() => match raw.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => return Err(ConfigError::InvalidPort(entry.to_owned())),
        },
        _ => 0,
    };

    Ok(Some(UserCredential::new(user, passwd, port)))
}
