use crate::infrastructure::error::EngineError;
use std::sync::Mutex;

/// Read-only access to a provider credential. Refresh and interactive
/// authentication belong to the auth collaborator that fills the store;
/// the engine only branches on presence or absence.
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` means no credential is configured; adapters translate
    /// that into a source-unavailable failure.
    fn access_token(&self) -> Result<Option<String>, EngineError>;
}

/// Token kept in the platform keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service_name: String,
    account_name: String,
}

impl KeyringCredentialStore {
    pub fn new(service_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            account_name: account_name.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, EngineError> {
        keyring::Entry::new(&self.service_name, &self.account_name)
            .map_err(|error| EngineError::Credential(error.to_string()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn access_token(&self) -> Result<Option<String>, EngineError> {
        match self.entry()?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(EngineError::Credential(error.to_string())),
        }
    }
}

/// Token read from an environment variable, matching deployments that
/// provision credentials through the process environment.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    variable: String,
}

impl EnvCredentialStore {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl CredentialStore for EnvCredentialStore {
    fn access_token(&self) -> Result<Option<String>, EngineError> {
        match std::env::var(&self.variable) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(error) => Err(EngineError::Credential(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn access_token(&self) -> Result<Option<String>, EngineError> {
        let guard = self
            .token
            .lock()
            .map_err(|error| EngineError::Credential(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }
}
