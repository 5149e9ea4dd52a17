//! Client registry
//!
//! Tracks classified clients in registration order, split by role, plus
//! the display names held by messengers.

use std::collections::HashMap;

use crate::client::Client;
use crate::error::RegistryError;
use crate::types::{ClientId, Role};

/// Registry of every classified client
///
/// Exclusively owns the `Client` records. Single-task access only:
/// the duplicate-name check in `register` is not meant to be raced.
#[derive(Debug, Default)]
pub struct Registry {
    /// All clients in registration order
    clients: Vec<Client>,
    /// Messenger display name -> ClientId
    names: HashMap<String, ClientId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a classified client
    ///
    /// Fails if the client is a messenger whose name is already held.
    pub fn register(&mut self, client: Client) -> Result<ClientId, RegistryError> {
        let id = client.id;
        if let Some(name) = client.name() {
            if self.names.contains_key(name) {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
            self.names.insert(name.to_string(), id);
        }
        self.clients.push(client);
        Ok(id)
    }

    /// Remove and return a client. `None` if it is not registered.
    pub fn unregister(&mut self, id: ClientId) -> Option<Client> {
        let index = self.clients.iter().position(|c| c.id == id)?;
        let client = self.clients.remove(index);
        if let Some(name) = client.name() {
            self.names.remove(name);
        }
        Some(client)
    }

    /// Check whether a messenger holds this name (case-sensitive)
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Snapshot of the ids holding a role, in registration order
    ///
    /// The snapshot stays valid while the registry is mutated.
    pub fn all_of_role(&self, role: Role) -> Vec<ClientId> {
        self.clients
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.id)
            .collect()
    }

    /// Snapshot of every registered id, in registration order
    pub fn ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|c| c.id).collect()
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    /// Live clients holding a role, in registration order
    pub fn iter_role(&self, role: Role) -> impl Iterator<Item = &Client> {
        self.clients.iter().filter(move |c| c.role == role)
    }

    pub fn iter_role_mut(&mut self, role: Role) -> impl Iterator<Item = &mut Client> {
        self.clients.iter_mut().filter(move |c| c.role == role)
    }

    /// Remove every client, viewers and messengers alike
    pub fn drain(&mut self) -> Vec<Client> {
        self.names.clear();
        std::mem::take(&mut self.clients)
    }

    pub fn count(&self, role: Role) -> usize {
        self.iter_role(role).count()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
