// ── Login identifiers ──
//
// The login form accepts a username or an email address. Remote accounts
// are matched by email (usernames are not unique across sites), so the
// distinction drives both the local lookup and account provisioning.

/// How a login identifier should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Email,
    Login,
}

impl IdentifierKind {
    pub fn of(identifier: &str) -> Self {
        if is_email(identifier) {
            Self::Email
        } else {
            Self::Login
        }
    }
}

const LOCAL_PART_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";

/// Syntactic email check: `local@sub.domain` with conservative character
/// sets, at least two domain labels and no empty labels.
pub fn is_email(candidate: &str) -> bool {
    if candidate.len() < 6 {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(c))
    {
        return false;
    }
    if domain.contains("..") {
        return false;
    }
    let domain = domain.trim_matches(['.', ' ', '\t', '\n', '\r']);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        let label = label.trim_matches('-');
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Reduce free text to a valid login name: ASCII letters, digits and
/// ` _.-@`, with runs of whitespace collapsed.
pub fn sanitize_login(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || " _.-@".contains(*c))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Login name derived from the part of an email before `@`.
pub fn login_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    sanitize_login(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_emails() {
        assert!(is_email("bob@example.com"));
        assert!(is_email("first.last+tag@mail.example.co.uk"));
        assert_eq!(IdentifierKind::of("bob@example.com"), IdentifierKind::Email);
    }

    #[test]
    fn rejects_non_emails() {
        for candidate in [
            "bob",
            "b@e.c",
            "bob@localhost",
            "@example.com",
            "bob@@example.com",
            "bob@exa..mple.com",
            "bob smith@example.com",
            "bob@-.com",
        ] {
            assert!(!is_email(candidate), "{candidate}");
        }
        assert_eq!(IdentifierKind::of("bob"), IdentifierKind::Login);
    }

    #[test]
    fn sanitizes_login_names() {
        assert_eq!(sanitize_login("bob"), "bob");
        assert_eq!(sanitize_login("bob+news"), "bobnews");
        assert_eq!(sanitize_login("  ann   marie "), "ann marie");
        assert_eq!(sanitize_login("jöhn"), "jhn");
    }

    #[test]
    fn login_from_email_uses_local_part() {
        assert_eq!(login_from_email("bob@example.com"), "bob");
        assert_eq!(login_from_email("bob.smith+x@example.com"), "bob.smithx");
    }
}
