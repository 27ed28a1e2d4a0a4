/// Strategy for collapsing survey rows onto one respondent.
///
/// Email is the only key guaranteed unique per respondent, so it is the
/// default whenever the survey carries an email column. The surname key is a
/// best-effort fallback for older exports that only have a free-text name:
/// it merges rows whose last name token matches, which can both collide
/// different people and split one person who varies name order. Collisions
/// are surfaced through the duplicate-alias report, never merged silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    ByEmail,
    ByNormalizedName,
}

impl IdentityPolicy {
    /// Produces the canonical grouping key for one response.
    pub fn resolve(&self, name: &str, email: Option<&str>) -> String {
        match self {
            IdentityPolicy::ByEmail => match email.map(str::trim).filter(|e| !e.is_empty()) {
                Some(addr) => addr.to_lowercase(),
                // Rows without an email cell fall back to the name key so
                // they still group with each other.
                None => normalized_name_key(name),
            },
            IdentityPolicy::ByNormalizedName => normalized_name_key(name),
        }
    }
}

/// Lower-cased last whitespace-delimited token of a display name.
pub fn normalized_name_key(name: &str) -> String {
    name.split_whitespace()
        .last()
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_key_is_trimmed_and_lowercased() {
        let policy = IdentityPolicy::ByEmail;
        assert_eq!(
            policy.resolve("Mario Rossi", Some(" M.Rossi@Ospedale.it ")),
            "m.rossi@ospedale.it"
        );
    }

    #[test]
    fn email_policy_merges_name_variants() {
        let policy = IdentityPolicy::ByEmail;
        let a = policy.resolve("Mario Rossi", Some("rossi@asl.it"));
        let b = policy.resolve("Rossi Mario", Some("ROSSI@asl.it"));
        assert_eq!(a, b);
    }

    #[test]
    fn email_policy_falls_back_to_name_when_cell_is_empty() {
        let policy = IdentityPolicy::ByEmail;
        assert_eq!(policy.resolve("Mario Rossi", Some("  ")), "rossi");
        assert_eq!(policy.resolve("Mario Rossi", None), "rossi");
    }

    #[test]
    fn name_key_uses_last_token_lowercased() {
        assert_eq!(normalized_name_key("Anna Maria Bianchi"), "bianchi");
        assert_eq!(normalized_name_key("  BIANCHI  "), "bianchi");
        assert_eq!(normalized_name_key(""), "");
    }
}
