use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "rostrum-directory";

pub struct CredentialStore;

impl CredentialStore {
    /// Store the directory password for a username in the OS keychain
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve the password for a username, if one is stored
    pub fn get_password(username: &str) -> Option<String> {
        Entry::new(SERVICE_NAME, username)
            .and_then(|entry| entry.get_password())
            .ok()
    }

    /// Delete stored credentials for a username
    pub fn delete(username: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}
