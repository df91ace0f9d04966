//! Input validation for values that end up in paths, config files and SQL

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LampError, Result};

#[allow(clippy::expect_used)]
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
        .expect("domain pattern is valid")
});

#[allow(clippy::expect_used)]
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("identifier pattern is valid"));

#[allow(clippy::expect_used)]
static DB_HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%:-]+$").expect("host pattern is valid"));

const MAX_DOMAIN_LEN: usize = 253;
const MAX_IDENTIFIER_LEN: usize = 64;

/// Hostnames like `blog.example.com`; labels up to 63 characters, alphabetic TLD
pub fn is_valid_domain(domain: &str) -> bool {
    domain.len() <= MAX_DOMAIN_LEN && DOMAIN_RE.is_match(domain)
}

pub fn validate_domain(domain: &str) -> Result<&str> {
    if is_valid_domain(domain) {
        Ok(domain)
    } else {
        Err(LampError::invalid("domain", domain))
    }
}

/// Database and user names; interpolated into SQL, so nothing but `[A-Za-z0-9_]`
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && IDENTIFIER_RE.is_match(name)
}

pub fn validate_identifier<'a>(what: &str, name: &'a str) -> Result<&'a str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(LampError::invalid(what, name))
    }
}

/// Host part of a `user@host` account: hostnames, addresses and the `%` wildcard
pub fn validate_db_host(host: &str) -> Result<&str> {
    if host.len() <= MAX_DOMAIN_LEN && DB_HOST_RE.is_match(host) {
        Ok(host)
    } else {
        Err(LampError::invalid("database host", host))
    }
}

/// Passwords go inside single-quoted SQL literals
pub fn validate_password(password: &str) -> Result<&str> {
    if password.is_empty() || password.contains(['\'', '\\', '\n', '\0']) {
        return Err(LampError::invalid(
            "password",
            "must be non-empty and free of quotes, backslashes and newlines",
        ));
    }
    Ok(password)
}
