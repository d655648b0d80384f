use crate::{Error, Result};
use serde::Serialize;

/// Login descriptor for a website. Secrets are not modelled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: u64,
    pub site: String,
    pub username: String,
    pub auto_login: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct CredentialList {
    entries: Vec<Credential>,
    #[serde(skip)]
    next_id: u64,
}

impl CredentialList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential; a blank site is ignored and returns `None`
    pub fn add(&mut self, site: &str, username: &str, auto_login: bool) -> Option<&Credential> {
        let site = site.trim();
        if site.is_empty() {
            return None;
        }

        self.next_id += 1;
        self.entries.push(Credential {
            id: self.next_id,
            site: site.to_string(),
            username: username.trim().to_string(),
            auto_login,
        });
        self.entries.last()
    }

    pub fn remove(&mut self, id: u64) -> Result<Credential> {
        let idx = self
            .entries
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::CredentialNotFound(id))?;
        Ok(self.entries.remove(idx))
    }

    pub fn list(&self) -> &[Credential] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
