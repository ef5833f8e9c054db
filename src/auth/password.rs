use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{debug, error};

/// Hashes and verifies secrets as self-describing Argon2id PHC strings.
#[derive(Clone)]
pub struct PasswordHelper {
    argon2: Argon2<'static>,
    params: Params,
}

impl Default for PasswordHelper {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl PasswordHelper {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            params,
        }
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// A malformed stored hash is a plain mismatch, never an error.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                debug!(error = %e, "stored hash is not a valid PHC string");
                false
            }
        }
    }

    /// Verifies `plain` and, when the stored hash was produced with other
    /// parameters than the current ones, returns a replacement hash.
    pub fn verify_and_update(&self, plain: &str, hash: &str) -> (bool, Option<String>) {
        if !self.verify(plain, hash) {
            return (false, None);
        }
        if !self.needs_rehash(hash) {
            return (true, None);
        }
        match self.hash(plain) {
            Ok(updated) => (true, Some(updated)),
            Err(_) => (true, None),
        }
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        if parsed.algorithm != argon2::ARGON2ID_IDENT {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(p) => {
                p.m_cost() != self.params.m_cost()
                    || p.t_cost() != self.params.t_cost()
                    || p.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}
