use std::env;

#[derive(Clone, Debug)]
pub struct PasswordConfig {
    /// bcrypt work factor, 4..=31.
    pub bcrypt_cost: u32,
}

impl PasswordConfig {
    pub fn from_env() -> Self {
        Self {
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|cost| (4..=31).contains(cost))
                .unwrap_or(8),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 8 }
    }
}
