use crate::replica::core::network_reader::{DecodeError, NetworkReader, NetworkReaderTrait};
use crate::replica::core::network_time::NetworkTime;
use crate::replica::core::network_writer::{NetworkWriter, NetworkWriterTrait};
use crate::replica::core::sync_object::SyncObjectHandle;
use std::any::Any;
use std::fmt::Debug;
use tklog::{error, warn};

// one bit per sync object, so the mask width is the hard cap
pub const MAX_SYNC_OBJECTS: usize = 64;

/// Shared base state of every replicated component. Concrete components embed
/// one of these and expose it through `NetworkBehaviourTrait`.
#[derive(Debug, Default)]
pub struct NetworkBehaviour {
    pub sync_interval: f64,
    pub last_sync_time: f64,
    // position among the replicated components on the same identity,
    // assigned at attach time
    pub index: u8,
    pub sync_var_dirty_bits: u64,
    pub sync_var_hook_guard: u64,
    pub net_id: u32,
    pub connection_to_client: u64,
    pub is_server: bool,
    pub is_client: bool,
    pub sync_objects: Vec<SyncObjectHandle>,
}

impl NetworkBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        (self.sync_var_dirty_bits != 0 || self.sync_object_dirty_bits() != 0)
            && NetworkTime::local_time() - self.last_sync_time >= self.sync_interval
    }

    pub fn set_sync_var_dirty_bits(&mut self, dirty_bit: u64) {
        self.sync_var_dirty_bits |= dirty_bit;
    }

    pub fn set_dirty(&mut self) {
        self.set_sync_var_dirty_bits(u64::MAX);
    }

    // recomputed on demand, the collections self report
    pub fn sync_object_dirty_bits(&self) -> u64 {
        let mut dirty_bits = 0u64;
        for (i, sync_object) in self.sync_objects.iter().enumerate() {
            if sync_object.lock().is_dirty() {
                dirty_bits |= 1 << i;
            }
        }
        dirty_bits
    }

    pub fn init_sync_object(&mut self, sync_object: SyncObjectHandle) -> usize {
        let index = self.sync_objects.len();
        if index >= MAX_SYNC_OBJECTS {
            error!(format!(
                "Sync object limit of {} reached, ignoring the new one",
                MAX_SYNC_OBJECTS
            ));
            return index;
        }
        self.sync_objects.push(sync_object);
        index
    }

    pub fn clear_all_dirty_bits(&mut self) {
        self.last_sync_time = NetworkTime::local_time();
        self.sync_var_dirty_bits = 0;
        for sync_object in &self.sync_objects {
            sync_object.lock().clear_changes();
        }
    }

    pub fn get_sync_var_hook_guard(&self, dirty_bit: u64) -> bool {
        (dirty_bit & self.sync_var_hook_guard) != 0
    }

    pub fn set_sync_var_hook_guard(&mut self, dirty_bit: u64, value: bool) {
        if value {
            self.sync_var_hook_guard |= dirty_bit;
        } else {
            self.sync_var_hook_guard &= !dirty_bit;
        }
    }

    pub fn sync_var_equal<T: PartialEq>(a: &T, b: &T) -> bool {
        a == b
    }

    pub fn set_sync_var<T>(&mut self, value: T, field: &mut T, dirty_bit: u64) {
        self.set_sync_var_dirty_bits(dirty_bit);
        *field = value;
    }

    // restores the low byte of a miscounted payload size from the safety tail
    pub fn error_correction(size: usize, safety: u8) -> usize {
        let cleared = size & 0xFFFF_FF00;
        cleared | safety as usize
    }
}

pub trait NetworkBehaviourTrait: Any + Send + Sync + Debug {
    fn network_behaviour(&self) -> &NetworkBehaviour;
    fn network_behaviour_mut(&mut self) -> &mut NetworkBehaviour;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    // overridden by components that carry sync vars
    fn serialize_sync_vars(&mut self, _writer: &mut NetworkWriter, _initial_state: bool) {}
    fn deserialize_sync_vars(
        &mut self,
        _reader: &mut NetworkReader,
        _initial_state: bool,
    ) -> Result<(), DecodeError> {
        Ok(())
    }

    // lifecycle hooks, invoked by the owning identity
    fn on_start_server(&mut self) {}
    fn on_stop_server(&mut self) {}
    fn on_start_client(&mut self) {}
    fn on_stop_client(&mut self) {}
    fn on_start_local_player(&mut self) {}

    fn index(&self) -> u8 {
        self.network_behaviour().index
    }

    fn set_index(&mut self, value: u8) {
        self.network_behaviour_mut().index = value;
    }

    fn net_id(&self) -> u32 {
        self.network_behaviour().net_id
    }

    fn set_net_id(&mut self, value: u32) {
        self.network_behaviour_mut().net_id = value;
    }

    fn is_dirty(&self) -> bool {
        self.network_behaviour().is_dirty()
    }

    fn set_sync_var_dirty_bits(&mut self, dirty_bit: u64) {
        self.network_behaviour_mut().set_sync_var_dirty_bits(dirty_bit);
    }

    fn set_dirty(&mut self) {
        self.network_behaviour_mut().set_dirty();
    }

    fn sync_object_dirty_bits(&self) -> u64 {
        self.network_behaviour().sync_object_dirty_bits()
    }

    fn init_sync_object(&mut self, sync_object: SyncObjectHandle) -> usize {
        self.network_behaviour_mut().init_sync_object(sync_object)
    }

    fn has_sync_objects(&self) -> bool {
        !self.network_behaviour().sync_objects.is_empty()
    }

    fn clear_all_dirty_bits(&mut self) {
        self.network_behaviour_mut().clear_all_dirty_bits();
    }

    /// Wraps the payload in a 1 byte safety tail so a receiver can detect a
    /// component whose serialization drifted out of sync with the sender.
    fn serialize(&mut self, writer: &mut NetworkWriter, initial_state: bool) {
        let header_position = writer.get_position();
        writer.write_byte(0);
        let content_position = writer.get_position();

        self.on_serialize(writer, initial_state);

        let end_position = writer.get_position();
        writer.set_position(header_position);
        let safety = ((end_position - content_position) & 0xFF) as u8;
        writer.write_byte(safety);
        writer.set_position(end_position);
    }

    fn on_serialize(&mut self, writer: &mut NetworkWriter, initial_state: bool) {
        self.serialize_sync_objects(writer, initial_state);
        self.serialize_sync_vars(writer, initial_state);
    }

    fn serialize_sync_objects(&mut self, writer: &mut NetworkWriter, initial_state: bool) {
        if initial_state {
            self.serialize_objects_all(writer);
        } else {
            self.serialize_sync_object_delta(writer);
        }
    }

    fn serialize_objects_all(&mut self, writer: &mut NetworkWriter) {
        for sync_object in self.network_behaviour().sync_objects.iter() {
            sync_object.lock().on_serialize_all(writer);
        }
    }

    fn serialize_sync_object_delta(&mut self, writer: &mut NetworkWriter) {
        let dirty_bits = self.sync_object_dirty_bits();
        writer.write_ulong(dirty_bits);
        for (i, sync_object) in self.network_behaviour().sync_objects.iter().enumerate() {
            if dirty_bits & (1 << i) != 0 {
                sync_object.lock().on_serialize_delta(writer);
            }
        }
    }

    fn deserialize(
        &mut self,
        reader: &mut NetworkReader,
        initial_state: bool,
    ) -> Result<(), DecodeError> {
        let safety = reader.read_byte()?;
        let chunk_start = reader.get_position();

        let result = self.on_deserialize(reader, initial_state);

        let size = reader.get_position() - chunk_start;
        let size_hash = (size & 0xFF) as u8;
        if result.is_ok() && size_hash != safety {
            warn!(format!(
                "Deserialize failed, size mismatch. Expected: {}, Received: {}",
                size_hash, safety
            ));
            let corrected_size = NetworkBehaviour::error_correction(size, safety);
            reader.set_position(chunk_start + corrected_size);
            return Err(DecodeError::Invalid("component payload size"));
        }
        result
    }

    fn on_deserialize(
        &mut self,
        reader: &mut NetworkReader,
        initial_state: bool,
    ) -> Result<(), DecodeError> {
        self.deserialize_sync_objects(reader, initial_state)?;
        self.deserialize_sync_vars(reader, initial_state)
    }

    fn deserialize_sync_objects(
        &mut self,
        reader: &mut NetworkReader,
        initial_state: bool,
    ) -> Result<(), DecodeError> {
        if initial_state {
            self.deserialize_objects_all(reader)
        } else {
            self.deserialize_sync_object_delta(reader)
        }
    }

    fn deserialize_objects_all(&mut self, reader: &mut NetworkReader) -> Result<(), DecodeError> {
        for sync_object in self.network_behaviour().sync_objects.iter() {
            sync_object.lock().on_deserialize_all(reader)?;
        }
        Ok(())
    }

    fn deserialize_sync_object_delta(
        &mut self,
        reader: &mut NetworkReader,
    ) -> Result<(), DecodeError> {
        let dirty_bits = reader.read_ulong()?;
        for (i, sync_object) in self.network_behaviour().sync_objects.iter().enumerate() {
            if dirty_bits & (1 << i) != 0 {
                sync_object.lock().on_deserialize_delta(reader)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::core::sync_list::SyncList;
    use crate::replica::core::sync_object::SyncObject;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct EmptyBehaviour {
        network_behaviour: NetworkBehaviour,
    }

    impl NetworkBehaviourTrait for EmptyBehaviour {
        fn network_behaviour(&self) -> &NetworkBehaviour {
            &self.network_behaviour
        }

        fn network_behaviour_mut(&mut self) -> &mut NetworkBehaviour {
            &mut self.network_behaviour
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn shared_list() -> Arc<Mutex<SyncList<i32>>> {
        Arc::new(Mutex::new(SyncList::new()))
    }

    #[test]
    fn test_dirty_until_cleared() {
        let mut comp = EmptyBehaviour::default();
        assert!(!comp.is_dirty());

        comp.set_sync_var_dirty_bits(1);
        assert!(comp.is_dirty());
        comp.set_sync_var_dirty_bits(1);
        assert!(comp.is_dirty());

        comp.clear_all_dirty_bits();
        assert!(!comp.is_dirty());
    }

    #[test]
    fn test_min_sync_interval_throttles_dirty() {
        let mut comp = EmptyBehaviour::default();
        comp.network_behaviour_mut().sync_interval = 3600.0;
        comp.network_behaviour_mut().last_sync_time = NetworkTime::local_time();
        comp.set_sync_var_dirty_bits(1);
        assert!(!comp.is_dirty());
    }

    #[test]
    fn test_clear_all_dirty_bits_clears_sync_objects() {
        let mut comp = EmptyBehaviour::default();
        let list = shared_list();
        list.lock().unwrap().add(42);
        assert!(list.lock().unwrap().is_dirty());

        comp.init_sync_object(list.clone().into());
        assert!(comp.is_dirty());

        comp.clear_all_dirty_bits();
        assert!(!comp.is_dirty());
        assert!(!list.lock().unwrap().is_dirty());
    }

    #[test]
    fn test_sync_object_dirty_bits() {
        let mut comp = EmptyBehaviour::default();
        assert_eq!(comp.sync_object_dirty_bits(), 0b00);

        let first = shared_list();
        first.lock().unwrap().add(42);
        comp.init_sync_object(first.clone().into());

        let second = shared_list();
        comp.init_sync_object(second.clone().into());

        // only the first is dirty
        assert_eq!(comp.sync_object_dirty_bits(), 0b01);

        second.lock().unwrap().add(43);
        assert_eq!(comp.sync_object_dirty_bits(), 0b11);

        comp.clear_all_dirty_bits();
        assert_eq!(comp.sync_object_dirty_bits(), 0b00);
    }

    #[test]
    fn test_init_sync_object_assigns_attachment_order() {
        let mut comp = EmptyBehaviour::default();
        assert_eq!(comp.init_sync_object(shared_list().into()), 0);
        assert_eq!(comp.init_sync_object(shared_list().into()), 1);
        assert!(comp.has_sync_objects());
    }

    #[test]
    fn test_serialize_and_deserialize_objects_all() {
        let mut comp = EmptyBehaviour::default();
        let list = shared_list();
        list.lock().unwrap().add(42);
        list.lock().unwrap().add(43);
        comp.init_sync_object(list.clone().into());

        let mut writer = NetworkWriter::new();
        comp.serialize_objects_all(&mut writer);

        list.lock().unwrap().clear();
        assert_eq!(list.lock().unwrap().len(), 0);

        let mut reader = NetworkReader::new(writer.to_bytes());
        comp.deserialize_objects_all(&mut reader).unwrap();
        let restored = list.lock().unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0], 42);
        assert_eq!(restored[1], 43);
    }

    #[test]
    fn test_serialize_and_deserialize_objects_delta() {
        let mut comp = EmptyBehaviour::default();
        let list = shared_list();
        list.lock().unwrap().add(42);
        list.lock().unwrap().add(43);
        comp.init_sync_object(list.clone().into());

        let mut writer = NetworkWriter::new();
        comp.serialize_sync_object_delta(&mut writer);

        // receiver side starts from the last acknowledged state
        let mut receiver = EmptyBehaviour::default();
        let remote = shared_list();
        receiver.init_sync_object(remote.clone().into());

        let mut reader = NetworkReader::new(writer.to_bytes());
        receiver.deserialize_sync_object_delta(&mut reader).unwrap();
        let restored = remote.lock().unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0], 42);
        assert_eq!(restored[1], 43);
    }

    #[test]
    fn test_delta_skips_clean_collections() {
        let mut comp = EmptyBehaviour::default();
        let dirty = shared_list();
        dirty.lock().unwrap().add(1);
        let clean = shared_list();
        clean.lock().unwrap().add(2);
        clean.lock().unwrap().clear_changes();

        comp.init_sync_object(dirty.clone().into());
        comp.init_sync_object(clean.clone().into());

        let mut writer = NetworkWriter::new();
        comp.serialize_sync_object_delta(&mut writer);

        let mut reader = NetworkReader::new(writer.to_bytes());
        assert_eq!(reader.read_ulong().unwrap(), 0b01);
    }

    #[test]
    fn test_full_serialize_round_trip_with_safety_tail() {
        let mut comp = EmptyBehaviour::default();
        let list = shared_list();
        list.lock().unwrap().add(7);
        comp.init_sync_object(list.clone().into());

        let mut writer = NetworkWriter::new();
        comp.serialize(&mut writer, true);

        list.lock().unwrap().clear();
        let mut reader = NetworkReader::new(writer.to_bytes());
        comp.deserialize(&mut reader, true).unwrap();
        assert_eq!(list.lock().unwrap().len(), 1);
        assert_eq!(list.lock().unwrap()[0], 7);
    }

    #[test]
    fn test_safety_tail_mismatch_rejected() {
        let mut comp = EmptyBehaviour::default();
        // claims 3 content bytes but carries none
        let mut reader = NetworkReader::new(vec![3u8]);
        assert!(comp.deserialize(&mut reader, true).is_err());
    }

    // sync var glue written the way generated component code writes it:
    // delta passes carry the field dirty mask, full passes carry everything
    #[derive(Debug)]
    struct PlayerBehaviour {
        network_behaviour: NetworkBehaviour,
        health: i32,
        player_name: String,
    }

    impl PlayerBehaviour {
        const HEALTH_BIT: u64 = 1 << 0;
        const NAME_BIT: u64 = 1 << 1;

        fn new() -> Self {
            PlayerBehaviour {
                network_behaviour: NetworkBehaviour::new(),
                health: 100,
                player_name: String::new(),
            }
        }

        fn set_health(&mut self, value: i32) {
            self.network_behaviour
                .set_sync_var(value, &mut self.health, Self::HEALTH_BIT);
        }

        fn set_player_name(&mut self, value: String) {
            self.network_behaviour
                .set_sync_var(value, &mut self.player_name, Self::NAME_BIT);
        }
    }

    impl NetworkBehaviourTrait for PlayerBehaviour {
        fn network_behaviour(&self) -> &NetworkBehaviour {
            &self.network_behaviour
        }

        fn network_behaviour_mut(&mut self) -> &mut NetworkBehaviour {
            &mut self.network_behaviour
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn serialize_sync_vars(&mut self, writer: &mut NetworkWriter, initial_state: bool) {
            if initial_state {
                writer.write_int(self.health);
                writer.write_str(&self.player_name);
                return;
            }
            let dirty_bits = self.network_behaviour.sync_var_dirty_bits;
            writer.write_ulong(dirty_bits);
            if dirty_bits & Self::HEALTH_BIT != 0 {
                writer.write_int(self.health);
            }
            if dirty_bits & Self::NAME_BIT != 0 {
                writer.write_str(&self.player_name);
            }
        }

        fn deserialize_sync_vars(
            &mut self,
            reader: &mut NetworkReader,
            initial_state: bool,
        ) -> Result<(), DecodeError> {
            if initial_state {
                self.health = reader.read_int()?;
                self.player_name = reader.read_string()?;
                return Ok(());
            }
            let dirty_bits = reader.read_ulong()?;
            if dirty_bits & Self::HEALTH_BIT != 0 {
                self.health = reader.read_int()?;
            }
            if dirty_bits & Self::NAME_BIT != 0 {
                self.player_name = reader.read_string()?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_sync_var_full_round_trip() {
        let mut sender = PlayerBehaviour::new();
        sender.set_health(64);
        sender.set_player_name("Alice".to_string());

        let mut writer = NetworkWriter::new();
        sender.serialize(&mut writer, true);

        let mut receiver = PlayerBehaviour::new();
        let mut reader = NetworkReader::new(writer.to_bytes());
        receiver.deserialize(&mut reader, true).unwrap();

        assert_eq!(receiver.health, 64);
        assert_eq!(receiver.player_name, "Alice");
    }

    #[test]
    fn test_sync_var_delta_carries_only_dirty_fields() {
        let mut sender = PlayerBehaviour::new();
        sender.set_player_name("Bob".to_string());
        sender.clear_all_dirty_bits();

        // only health changes after the last flush
        sender.set_health(12);

        let mut writer = NetworkWriter::new();
        sender.serialize(&mut writer, false);
        sender.clear_all_dirty_bits();

        let mut receiver = PlayerBehaviour::new();
        receiver.player_name = "Bob".to_string();
        let mut reader = NetworkReader::new(writer.to_bytes());
        receiver.deserialize(&mut reader, false).unwrap();

        assert_eq!(receiver.health, 12);
        assert_eq!(receiver.player_name, "Bob");
    }

    #[test]
    fn test_set_sync_var_marks_dirty() {
        let mut comp = EmptyBehaviour::default();
        let mut health = 100i32;
        let base = comp.network_behaviour_mut();
        base.set_sync_var(75, &mut health, 1 << 3);
        assert_eq!(health, 75);
        assert_eq!(base.sync_var_dirty_bits, 1 << 3);
        assert!(comp.is_dirty());
    }

    #[test]
    fn test_hook_guard_round_trip() {
        let mut base = NetworkBehaviour::new();
        assert!(!base.get_sync_var_hook_guard(1));
        base.set_sync_var_hook_guard(1, true);
        assert!(base.get_sync_var_hook_guard(1));
        base.set_sync_var_hook_guard(1, false);
        assert!(!base.get_sync_var_hook_guard(1));
    }

    #[test]
    fn test_error_correction() {
        assert_eq!(NetworkBehaviour::error_correction(0x0300, 0x05), 0x0305);
        assert_eq!(NetworkBehaviour::error_correction(0x0312, 0x05), 0x0305);
    }
}
