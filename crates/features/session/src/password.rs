use kw_domain::model::application::User;
use kw_kernel::safe_nanoid;
use sha2::{Digest, Sha256};

const SALT_LENGTH: usize = 16;

#[must_use]
pub fn new_salt() -> String {
    safe_nanoid!(SALT_LENGTH)
}

/// Hex encoded SHA-256 of `salt` followed by `password`.
#[must_use]
pub fn hash(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[must_use]
pub fn verify(user: &User, password: &str) -> bool {
    let computed = hash(&user.salt, password);
    computed.len() == user.password_hash.len()
        && computed.bytes().zip(user.password_hash.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_depend_on_the_salt() {
        let a = hash("salt-a", "secret");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash("salt-a", "secret"));
        assert_ne!(a, hash("salt-b", "secret"));
        assert_ne!(new_salt(), new_salt());
    }
}
