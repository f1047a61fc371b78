use crate::replica::core::network_behaviour::NetworkBehaviourTrait;
use crate::replica::core::network_reader::{DecodeError, NetworkReader, NetworkReaderTrait};
use crate::replica::core::network_writer::{NetworkWriter, NetworkWriterTrait};
use crate::replica::core::remote_calls::{RemoteCallType, RemoteProcedureCalls};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tklog::error;

// the entity dirty mask is one bit per component
pub const MAX_NETWORK_BEHAVIOURS: usize = 64;

/// A replicated entity. Net id 0 means not yet spawned. Components are
/// attached in a fixed order and keep that order for their whole lifetime,
/// the attach index is what the wire format addresses them by.
#[derive(Debug, Default)]
pub struct NetworkIdentity {
    net_id: u32,
    pub is_owned: bool,
    pub is_server: bool,
    pub is_client: bool,
    server_started: bool,
    client_started: bool,
    local_player_started: bool,
    pub network_behaviours: Vec<Box<dyn NetworkBehaviourTrait>>,
}

impl NetworkIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn net_id(&self) -> u32 {
        self.net_id
    }

    pub fn set_net_id(&mut self, net_id: u32) {
        self.net_id = net_id;
        for component in self.network_behaviours.iter_mut() {
            component.set_net_id(net_id);
        }
    }

    /// Attaches a component and returns its index. The first attached
    /// component gets index 0, the second index 1, and so on.
    pub fn add_behaviour(&mut self, mut behaviour: Box<dyn NetworkBehaviourTrait>) -> u8 {
        let index = self.network_behaviours.len() as u8;
        {
            let base = behaviour.network_behaviour_mut();
            base.index = index;
            base.net_id = self.net_id;
            base.is_server = self.is_server;
            base.is_client = self.is_client;
        }
        self.network_behaviours.push(behaviour);
        self.validate_components();
        index
    }

    pub fn validate_components(&self) {
        if self.network_behaviours.len() > MAX_NETWORK_BEHAVIOURS {
            error!(format!(
                "NetworkIdentity has too many components. Max is {}",
                MAX_NETWORK_BEHAVIOURS
            ));
        }
    }

    pub fn on_start_server(&mut self) {
        if self.server_started {
            return;
        }
        self.server_started = true;
        self.is_server = true;
        for component in self.network_behaviours.iter_mut() {
            component.network_behaviour_mut().is_server = true;
            component.on_start_server();
        }
    }

    pub fn on_stop_server(&mut self) {
        for component in self.network_behaviours.iter_mut() {
            component.on_stop_server();
            component.network_behaviour_mut().is_server = false;
        }
        self.server_started = false;
        self.is_server = false;
    }

    pub fn on_start_client(&mut self) {
        if self.client_started {
            return;
        }
        self.client_started = true;
        self.is_client = true;
        for component in self.network_behaviours.iter_mut() {
            component.network_behaviour_mut().is_client = true;
            component.on_start_client();
        }
    }

    pub fn on_stop_client(&mut self) {
        for component in self.network_behaviours.iter_mut() {
            component.on_stop_client();
            component.network_behaviour_mut().is_client = false;
        }
        self.client_started = false;
        self.is_client = false;
    }

    pub fn on_start_local_player(&mut self) {
        if self.local_player_started {
            return;
        }
        self.local_player_started = true;
        for component in self.network_behaviours.iter_mut() {
            component.on_start_local_player();
        }
    }

    // components past the mask width never make it into a flush, the cap is
    // reported by validate_components
    fn mask_len(&self) -> usize {
        self.network_behaviours.len().min(MAX_NETWORK_BEHAVIOURS)
    }

    fn dirty_mask(&self, initial_state: bool) -> u64 {
        let mut mask = 0u64;
        for (i, component) in self.network_behaviours.iter().enumerate().take(self.mask_len()) {
            if initial_state || component.is_dirty() {
                mask |= 1 << i;
            }
        }
        mask
    }

    fn is_component_dirty(mask: u64, index: usize) -> bool {
        (mask & (1 << index)) != 0
    }

    /// Entity level flush. Initial state serializes every component in full,
    /// a delta pass serializes only dirty components and acknowledges them by
    /// clearing their dirty state, under the same borrow so no mutation can
    /// slip between the snapshot and the clear.
    pub fn serialize(&mut self, initial_state: bool, writer: &mut NetworkWriter) {
        self.validate_components();
        let mask = self.dirty_mask(initial_state);
        writer.compress_var_ulong(mask);

        for i in 0..self.mask_len() {
            if Self::is_component_dirty(mask, i) {
                let component = &mut self.network_behaviours[i];
                component.serialize(writer, initial_state);
                if !initial_state {
                    component.clear_all_dirty_bits();
                }
            }
        }
    }

    pub fn deserialize(
        &mut self,
        reader: &mut NetworkReader,
        initial_state: bool,
    ) -> Result<(), DecodeError> {
        let mask = reader.decompress_var_ulong()?;
        for i in 0..self.mask_len() {
            if Self::is_component_dirty(mask, i) {
                self.network_behaviours[i].deserialize(reader, initial_state)?;
            }
        }
        Ok(())
    }

    pub fn clear_all_components_dirty_bits(&mut self) {
        for component in self.network_behaviours.iter_mut() {
            component.clear_all_dirty_bits();
        }
    }

    /// Dispatches a received remote call to the addressed component through
    /// the hash keyed registry.
    pub fn handle_remote_call(
        &mut self,
        component_index: u8,
        function_hash: u16,
        call_type: RemoteCallType,
        reader: &mut NetworkReader,
        conn_id: u64,
    ) -> bool {
        if component_index as usize >= self.network_behaviours.len() {
            error!(format!(
                "Component index {} out of bounds for netId {}",
                component_index, self.net_id
            ));
            return false;
        }
        if call_type == RemoteCallType::Command
            && RemoteProcedureCalls::command_requires_authority(function_hash)
        {
            let owner = self.network_behaviours[component_index as usize]
                .network_behaviour()
                .connection_to_client;
            if owner != conn_id {
                error!(format!(
                    "Command rejected, connection {} does not own netId {}",
                    conn_id, self.net_id
                ));
                return false;
            }
        }
        if !RemoteProcedureCalls::invoke(
            function_hash,
            call_type,
            self,
            component_index,
            reader,
            conn_id,
        ) {
            error!(format!(
                "Failed to invoke remote call for function hash {}",
                function_hash
            ));
            return false;
        }
        true
    }

    pub fn reset_state(&mut self) {
        self.net_id = 0;
        self.is_owned = false;
        self.is_server = false;
        self.is_client = false;
        self.server_started = false;
        self.client_started = false;
        self.local_player_started = false;
        for component in self.network_behaviours.iter_mut() {
            component.set_net_id(0);
            let base = component.network_behaviour_mut();
            base.is_server = false;
            base.is_client = false;
        }
    }
}

/// Shared handle to a replicated entity. Equality is handle identity, the
/// net id based equality used by sync vars lives in the resolution helpers.
#[derive(Debug, Clone)]
pub struct NetworkIdentityRef(Arc<RwLock<NetworkIdentity>>);

impl NetworkIdentityRef {
    pub fn new(identity: NetworkIdentity) -> Self {
        NetworkIdentityRef(Arc::new(RwLock::new(identity)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, NetworkIdentity> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, NetworkIdentity> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn net_id(&self) -> u32 {
        self.read().net_id()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for NetworkIdentityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Display for NetworkIdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[netId:{}]", self.net_id())
    }
}
