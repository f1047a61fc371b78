use crate::replica::core::network_identity::NetworkIdentityRef;
use atomic::Atomic;
use dashmap::DashMap;
use std::sync::atomic::Ordering;
use tklog::warn;

/// Explicit spawned entities context, passed to receiver side resolution
/// instead of living in ambient global state. Populated on spawn, entries
/// removed on despawn, cleared on shutdown. Inserts are last writer wins,
/// net id assignment is monotonic so an id is never concurrently re-keyed.
pub struct SpawnedRegistry {
    identities: DashMap<u32, NetworkIdentityRef>,
    next_net_id: Atomic<u32>,
}

impl SpawnedRegistry {
    pub fn new() -> Self {
        SpawnedRegistry {
            identities: DashMap::new(),
            next_net_id: Atomic::new(1),
        }
    }

    /// Assigns the next net id to the identity and registers it.
    pub fn spawn(&self, identity: &NetworkIdentityRef) -> u32 {
        let net_id = self.next_net_id.fetch_add(1, Ordering::Relaxed);
        identity.write().set_net_id(net_id);
        self.identities.insert(net_id, identity.clone());
        net_id
    }

    /// Registers an identity under the id it already carries. Id 0 means the
    /// identity was never spawned and cannot be looked up, so it is refused.
    pub fn insert(&self, identity: NetworkIdentityRef) {
        let net_id = identity.net_id();
        if net_id == 0 {
            warn!(format!(
                "Refusing to register identity {} with an unassigned net id",
                identity
            ));
            return;
        }
        self.identities.insert(net_id, identity);
    }

    pub fn get(&self, net_id: u32) -> Option<NetworkIdentityRef> {
        if net_id == 0 {
            return None;
        }
        self.identities
            .get(&net_id)
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, net_id: u32) -> bool {
        net_id != 0 && self.identities.contains_key(&net_id)
    }

    pub fn remove(&self, net_id: u32) -> Option<NetworkIdentityRef> {
        self.identities.remove(&net_id).map(|(_, identity)| identity)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn clear(&self) {
        self.identities.clear();
    }

    pub fn reset_net_ids(&self) {
        self.next_net_id.store(1, Ordering::Relaxed);
    }
}

impl Default for SpawnedRegistry {
    fn default() -> Self {
        Self::new()
    }
}
