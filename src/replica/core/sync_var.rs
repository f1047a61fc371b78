use crate::replica::core::network_behaviour::NetworkBehaviour;
use crate::replica::core::network_identity::NetworkIdentityRef;
use crate::replica::core::network_reader::{
    DecodeError, NetworkReader, NetworkReaderTrait, Readable,
};
use crate::replica::core::network_writer::{NetworkWriter, NetworkWriterTrait, Writeable};
use crate::replica::core::spawned::SpawnedRegistry;
use std::fmt;
use tklog::warn;

/// Net id based equality for identity sync vars, used to decide whether a
/// newly received value actually changes state. An absent candidate equals a
/// zero current id. A present candidate compares by its current net id only,
/// which makes a present but not yet spawned candidate (id 0) equal to a
/// zero current id as well. Kept exactly like that on purpose, changing it
/// would resync fields whenever an entity briefly has no id.
pub fn sync_var_identity_equal(
    candidate: Option<&NetworkIdentityRef>,
    current_net_id: u32,
) -> bool {
    let candidate_net_id = match candidate {
        Some(identity) => {
            let net_id = identity.net_id();
            if net_id == 0 {
                warn!(format!(
                    "SyncVar NetworkIdentity {} has a zero netId. Maybe it is not spawned yet?",
                    identity
                ));
            }
            net_id
        }
        None => 0,
    };
    candidate_net_id == current_net_id
}

/// Receiver side resolution never trusts a cached reference, it goes through
/// the spawned table. Absent ids and id 0 resolve to none.
pub fn resolve_on_receiver(net_id: u32, spawned: &SpawnedRegistry) -> Option<NetworkIdentityRef> {
    spawned.get(net_id)
}

impl NetworkBehaviour {
    pub fn set_sync_var_identity(
        &mut self,
        new_value: Option<NetworkIdentityRef>,
        field: &mut Option<NetworkIdentityRef>,
        dirty_bit: u64,
        net_id_field: &mut u32,
    ) {
        if self.get_sync_var_hook_guard(dirty_bit) {
            return;
        }
        match &new_value {
            Some(identity) => {
                let net_id = identity.net_id();
                if net_id == 0 {
                    warn!(format!(
                        "SetSyncVarIdentity NetworkIdentity {} has a zero netId. Maybe it is not spawned yet?",
                        identity
                    ));
                }
                *net_id_field = net_id;
            }
            None => {
                *net_id_field = 0;
            }
        }
        // the reference itself is stored even when its entity has no id yet,
        // the id field alone decides what goes on the wire
        *field = new_value;
        self.set_sync_var_dirty_bits(dirty_bit);
    }

    pub fn get_sync_var_identity(
        &self,
        net_id_field: u32,
        field: &mut Option<NetworkIdentityRef>,
        spawned: &SpawnedRegistry,
    ) -> Option<NetworkIdentityRef> {
        // the authoritative side always trusts the direct reference
        if self.is_server {
            return field.clone();
        }
        let resolved = resolve_on_receiver(net_id_field, spawned);
        *field = resolved.clone();
        resolved
    }
}

/// Backing value for a sync var that points at another replicated component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkBehaviourSyncVar {
    pub net_id: u32,
    // limited to 255 behaviours per identity
    pub component_index: u8,
}

impl NetworkBehaviourSyncVar {
    pub fn new(net_id: u32, component_index: u8) -> Self {
        Self {
            net_id,
            component_index,
        }
    }

    pub fn equals(&self, net_id: u32, component_index: u8) -> bool {
        self.net_id == net_id && self.component_index == component_index
    }
}

impl fmt::Display for NetworkBehaviourSyncVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[netId:{} compIndex:{}]", self.net_id, self.component_index)
    }
}

impl Writeable for NetworkBehaviourSyncVar {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| {
            writer.write_uint(value.net_id);
            writer.write_byte(value.component_index);
        })
    }
}

impl Readable for NetworkBehaviourSyncVar {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| {
            let net_id = reader.read_uint()?;
            let component_index = reader.read_byte()?;
            Ok(NetworkBehaviourSyncVar::new(net_id, component_index))
        })
    }
}
