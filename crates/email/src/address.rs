//! Email address parsing and rendering.

use std::fmt;

use crate::error::EmailError;

/// A validated email address, optionally carrying a display name.
///
/// Accepted forms are `local@domain` and `Display Name <local@domain>`.
/// Validation is syntactic only; whether the mailbox exists is the
/// provider's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    name: Option<String>,
    local: String,
    domain: String,
}

impl Address {
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid(input, "empty address"));
        }

        let (name, spec) = if let Some(open) = input.find('<') {
            let Some(rest) = input[open + 1..].strip_suffix('>') else {
                return Err(invalid(input, "unterminated display name form"));
            };
            let name = input[..open].trim();
            let name = (!name.is_empty()).then(|| name.to_string());
            (name, rest.trim())
        } else if input.ends_with('>') {
            return Err(invalid(input, "'>' without matching '<'"));
        } else {
            (None, input)
        };

        let mut parts = spec.split('@');
        let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            (_, None, _) => return Err(invalid(input, "missing '@' separator")),
            _ => return Err(invalid(input, "more than one '@' separator")),
        };
        if local.is_empty() {
            return Err(invalid(input, "empty local part"));
        }
        if domain.is_empty() {
            return Err(invalid(input, "empty domain"));
        }
        for part in [local, domain] {
            if part.chars().any(|c| c.is_whitespace() || "<>,".contains(c)) {
                return Err(invalid(input, "forbidden character in address"));
            }
        }

        Ok(Address {
            name,
            local: local.to_string(),
            domain: domain.to_string(),
        })
    }

    /// Parses a comma-separated address list. Empty items are skipped, so
    /// an all-whitespace input yields an empty list.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, EmailError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The bare `local@domain` form, without the display name.
    pub fn address(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}@{}>", name, self.local, self.domain),
            None => write!(f, "{}@{}", self.local, self.domain),
        }
    }
}

fn invalid(address: &str, reason: &str) -> EmailError {
    EmailError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}
