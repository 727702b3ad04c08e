//! Passwords, login tokens and the default accounts.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Role, User, ADMIN_ID};

/// sha-256 hex digest of a password.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Stored digest matches.
    Valid,
    /// Stored value is the plaintext password; it should be replaced by
    /// its digest.
    ValidLegacy,
    Invalid,
}

pub fn check_password(stored: &str, candidate: &str) -> PasswordCheck {
    if stored == hash_password(candidate) {
        PasswordCheck::Valid
    } else if !stored.is_empty() && stored == candidate {
        PasswordCheck::ValidLegacy
    } else {
        PasswordCheck::Invalid
    }
}

fn account(id: &str, password: &str, name: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        pw: hash_password(password),
        name: name.to_string(),
        role,
        subject: String::new(),
        linked_student: String::new(),
        math_class: String::new(),
        eng_class: String::new(),
    }
}

/// Accounts written to an empty users table.
pub fn default_users() -> Vec<User> {
    vec![
        User {
            subject: "전체".to_string(),
            ..account(ADMIN_ID, "admin123", "원장님", Role::Teacher)
        },
        User {
            subject: "영어".to_string(),
            ..account("t_eng", "1234", "최영석", Role::Teacher)
        },
        User {
            subject: "수학".to_string(),
            ..account("t_math", "1234", "어혜원", Role::Teacher)
        },
        User {
            math_class: "수학A".to_string(),
            eng_class: "영어B".to_string(),
            ..account("student1", "1234", "김철수", Role::Student)
        },
        User {
            linked_student: "student1".to_string(),
            ..account("parent1", "1234", "철수부모님", Role::Parent)
        },
    ]
}

/// How long a login stays valid.
pub const TOKEN_TTL: Duration = Duration::from_secs(12 * 60 * 60);

struct IssuedToken {
    user_id: String,
    issued_at: Instant,
}

/// Bearer tokens of logged-in users. Tokens expire `ttl` after login;
/// expired ones are dropped whenever a new token is issued.
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, IssuedToken>>,
    ttl: Duration,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::with_ttl(TOKEN_TTL)
    }
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a new token for `user_id`.
    pub async fn issue(&self, user_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, issued| issued.issued_at.elapsed() < self.ttl);
        tokens.insert(
            token.clone(),
            IssuedToken {
                user_id: user_id.to_string(),
                issued_at: Instant::now(),
            },
        );
        token
    }

    /// User id behind `token`, if it has not expired.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.tokens
            .read()
            .await
            .get(token)
            .filter(|issued| issued.issued_at.elapsed() < self.ttl)
            .map(|issued| issued.user_id.clone())
    }

    /// Forget `token`. Returns whether it was known.
    pub async fn revoke(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }
}
