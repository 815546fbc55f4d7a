use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const ADMIN_ROLE: &str = "Admin";

/// One staff login as stored in the credentials table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Unique, compared case-insensitively.
    pub username: String,
    pub display_name: String,
    pub role: String,
    /// Lower-case hex SHA-256 of `salt + password`.
    pub password_hash: String,
}

impl Credential {
    pub fn new(username: &str, display_name: &str, role: &str, password: &str, salt: &str) -> Self {
        Self {
            username: canonical_username(username),
            display_name: display_name.trim().to_string(),
            role: role.trim().to_string(),
            password_hash: hash_password(salt, password),
        }
    }

    pub fn matches_username(&self, username: &str) -> bool {
        canonical_username(&self.username) == canonical_username(username)
    }

    pub fn verify(&self, password: &str, salt: &str) -> bool {
        self.password_hash.eq_ignore_ascii_case(&hash_password(salt, password))
    }

    pub fn operator(&self) -> Operator {
        Operator {
            username: canonical_username(&self.username),
            display_name: self.display_name.clone(),
            role: self.role.clone(),
        }
    }
}

/// The authenticated user of an interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub username: String,
    pub display_name: String,
    pub role: String,
}

impl Operator {
    pub fn is_admin(&self) -> bool {
        self.role.trim().eq_ignore_ascii_case(ADMIN_ROLE)
    }
}

pub fn canonical_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsalted_hash_is_plain_sha256() {
        assert_eq!(
            hash_password("", "abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn salt_changes_the_hash() {
        assert_ne!(hash_password("pepper", "abc"), hash_password("", "abc"));
    }

    #[test]
    fn username_match_ignores_case_and_whitespace() {
        let cred = Credential::new("Nancy", "Nancy", "Ventas", "secret", "");
        assert_eq!(cred.username, "nancy");
        assert!(cred.matches_username("  NANCY "));
        assert!(!cred.matches_username("nanc"));
    }

    #[test]
    fn verify_checks_salted_hash() {
        let cred = Credential::new("admin", "Admin", "Admin", "secret", "s1");
        assert!(cred.verify("secret", "s1"));
        assert!(!cred.verify("secret", ""));
        assert!(!cred.verify("Secret", "s1"));
        assert!(cred.operator().is_admin());
    }
}
