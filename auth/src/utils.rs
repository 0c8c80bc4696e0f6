//! Email helpers for login requests.

use dreamstart_forms::rules::is_email;

/// Built-in list of disposable / throwaway mail providers.
pub const DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "20minutemail.com",
    "33mail.com",
    "anonbox.net",
    "dispostable.com",
    "dropmail.me",
    "emailondeck.com",
    "fakeinbox.com",
    "getairmail.com",
    "getnada.com",
    "guerrillamail.biz",
    "guerrillamail.com",
    "guerrillamail.de",
    "guerrillamail.net",
    "guerrillamail.org",
    "guerrillamailblock.com",
    "harakirimail.com",
    "inboxkitten.com",
    "mail-temp.com",
    "mailcatch.com",
    "maildrop.cc",
    "mailinator.com",
    "mailinator.net",
    "mailnesia.com",
    "mintemail.com",
    "mohmal.com",
    "mytemp.email",
    "sharklasers.com",
    "spam4.me",
    "spamgourmet.com",
    "temp-mail.io",
    "temp-mail.org",
    "tempail.com",
    "tempmail.dev",
    "tempmailo.com",
    "tempr.email",
    "throwawaymail.com",
    "trashmail.com",
    "trashmail.de",
    "yopmail.com",
    "yopmail.fr",
    "yopmail.net",
];

/// Domain part of an address, lowercased.
///
/// ```
/// use dreamstart_auth::utils::email_domain;
///
/// assert_eq!(email_domain("User@Example.COM").as_deref(), Some("example.com"));
/// assert_eq!(email_domain("no-at-sign"), None);
/// ```
#[must_use]
pub fn email_domain(email: &str) -> Option<String> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().to_lowercase())
        .filter(|domain| !domain.is_empty())
}

/// Returns `true` if `domain` or any parent domain is on the built-in list
/// or in `extra`.
///
/// ```
/// use dreamstart_auth::utils::is_disposable_domain;
///
/// assert!(is_disposable_domain("mailinator.com", &[]));
/// assert!(is_disposable_domain("eu.mailinator.com", &[]));
/// assert!(!is_disposable_domain("gmail.com", &[]));
/// assert!(is_disposable_domain("burner.test", &["burner.test".to_string()]));
/// ```
#[must_use]
pub fn is_disposable_domain(domain: &str, extra: &[String]) -> bool {
    let domain = domain.to_lowercase();
    let mut candidate = domain.as_str();

    loop {
        if DISPOSABLE_DOMAINS.contains(&candidate) || extra.iter().any(|d| d == candidate) {
            return true;
        }
        match candidate.split_once('.') {
            Some((_, parent)) if parent.contains('.') => candidate = parent,
            _ => return false,
        }
    }
}

/// Returns `true` if `email` is well-formed and not from a disposable provider.
#[must_use]
pub fn is_deliverable_email(email: &str, extra_blocked: &[String]) -> bool {
    is_email(email)
        && email_domain(email).is_some_and(|domain| !is_disposable_domain(&domain, extra_blocked))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_deliverable_email("user@example.com", &[]));
        assert!(is_deliverable_email("user+tag@subdomain.example.com", &[]));
    }

    #[test]
    fn test_malformed_emails() {
        assert!(!is_deliverable_email("invalid", &[]));
        assert!(!is_deliverable_email("@example.com", &[]));
        assert!(!is_deliverable_email("user@", &[]));
    }

    #[test]
    fn test_disposable_emails() {
        assert!(!is_deliverable_email("user@mailinator.com", &[]));
        assert!(!is_deliverable_email("user@YOPMAIL.com", &[]));
        assert!(!is_deliverable_email("user@x.guerrillamail.com", &[]));
        assert!(!is_deliverable_email("user@corp.test", &["corp.test".to_string()]));
    }

    #[test]
    fn test_top_level_domain_is_never_matched_alone() {
        assert!(!is_disposable_domain("com", &[]));
    }
}
