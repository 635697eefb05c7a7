use crate::config::Config;

/// Credential verification seam for the admin gate. The route layer
/// only sees this trait, so the fixed default pair can be swapped for
/// something real without touching the login handler.
pub trait CredentialCheck: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// The single-operator default: one configured username/password pair.
pub struct FixedCredentials {
    username: String,
    password: String,
}

impl FixedCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        FixedCredentials {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        FixedCredentials::new(&config.admin_username, &config.admin_password)
    }
}

impl CredentialCheck for FixedCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}
