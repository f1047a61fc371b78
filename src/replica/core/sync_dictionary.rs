use crate::replica::core::network_reader::{
    DecodeError, NetworkReader, NetworkReaderTrait, Readable,
};
use crate::replica::core::network_writer::{NetworkWriter, NetworkWriterTrait, Writeable};
use crate::replica::core::sync_object::SyncObject;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add = 0,
    Clear = 1,
    Remove = 2,
    Set = 3,
}

impl Operation {
    fn from_byte(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Operation::Add),
            1 => Ok(Operation::Clear),
            2 => Ok(Operation::Remove),
            3 => Ok(Operation::Set),
            _ => Err(DecodeError::Invalid("sync dictionary operation")),
        }
    }
}

#[derive(Debug, Clone)]
enum Change<K, V> {
    Add(K, V),
    Set(K, V),
    Remove(K),
    Clear,
}

pub type Callback<K, V> = Arc<dyn Fn(Operation, &K, Option<&V>) + Send + Sync>;

pub struct SyncDictionary<K, V> {
    objects: HashMap<K, V>,
    changes: Vec<Change<K, V>>,
    pub on_change: Option<Callback<K, V>>,
}

impl<K, V> SyncDictionary<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        SyncDictionary {
            objects: HashMap::new(),
            changes: Vec::new(),
            on_change: None,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.objects.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.objects.contains_key(key)
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, K, V> {
        self.objects.iter()
    }

    pub fn insert(&mut self, key: K, value: V) {
        let operation = if self.objects.contains_key(&key) {
            self.changes.push(Change::Set(key.clone(), value.clone()));
            Operation::Set
        } else {
            self.changes.push(Change::Add(key.clone(), value.clone()));
            Operation::Add
        };
        self.objects.insert(key.clone(), value.clone());
        if let Some(callback) = &self.on_change {
            callback(operation, &key, Some(&value));
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let old_value = self.objects.remove(key)?;
        self.changes.push(Change::Remove(key.clone()));
        if let Some(callback) = &self.on_change {
            callback(Operation::Remove, key, Some(&old_value));
        }
        Some(old_value)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.changes.push(Change::Clear);
    }
}

impl<K, V> Default for SyncDictionary<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug, V: Debug> fmt::Debug for SyncDictionary<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDictionary")
            .field("objects", &self.objects)
            .field("changes", &self.changes.len())
            .finish()
    }
}

impl<K, V> SyncObject for SyncDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Writeable + Readable + 'static,
    V: Clone + Debug + Send + Writeable + Readable + 'static,
{
    fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn on_serialize_all(&self, writer: &mut NetworkWriter) {
        writer.compress_var_ulong(self.objects.len() as u64);
        for (key, value) in &self.objects {
            writer.write(key);
            writer.write(value);
        }
    }

    fn on_serialize_delta(&self, writer: &mut NetworkWriter) {
        writer.compress_var_ulong(self.changes.len() as u64);
        for change in &self.changes {
            match change {
                Change::Add(key, value) => {
                    writer.write_byte(Operation::Add as u8);
                    writer.write(key);
                    writer.write(value);
                }
                Change::Set(key, value) => {
                    writer.write_byte(Operation::Set as u8);
                    writer.write(key);
                    writer.write(value);
                }
                Change::Remove(key) => {
                    writer.write_byte(Operation::Remove as u8);
                    writer.write(key);
                }
                Change::Clear => {
                    writer.write_byte(Operation::Clear as u8);
                }
            }
        }
    }

    fn on_deserialize_all(&mut self, reader: &mut NetworkReader) -> Result<(), DecodeError> {
        let count = reader.decompress_var_ulong()? as usize;
        self.objects.clear();
        self.changes.clear();
        for _ in 0..count {
            let key: K = reader.read()?;
            let value: V = reader.read()?;
            self.objects.insert(key, value);
        }
        Ok(())
    }

    fn on_deserialize_delta(&mut self, reader: &mut NetworkReader) -> Result<(), DecodeError> {
        let count = reader.decompress_var_ulong()? as usize;
        for _ in 0..count {
            let operation = Operation::from_byte(reader.read_byte()?)?;
            match operation {
                Operation::Add | Operation::Set => {
                    let key: K = reader.read()?;
                    let value: V = reader.read()?;
                    self.objects.insert(key.clone(), value.clone());
                    if let Some(callback) = &self.on_change {
                        callback(operation, &key, Some(&value));
                    }
                }
                Operation::Remove => {
                    let key: K = reader.read()?;
                    let old_value = self.objects.remove(&key);
                    if let Some(callback) = &self.on_change {
                        callback(Operation::Remove, &key, old_value.as_ref());
                    }
                }
                Operation::Clear => {
                    self.objects.clear();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_lifecycle() {
        let mut map = SyncDictionary::new();
        assert!(!map.is_dirty());
        map.insert(1u32, "one".to_string());
        assert!(map.is_dirty());
        map.clear_changes();
        assert!(!map.is_dirty());
        map.remove(&1);
        assert!(map.is_dirty());
    }

    #[test]
    fn test_serialize_all_round_trip() {
        let mut map = SyncDictionary::new();
        map.insert(1u32, "one".to_string());
        map.insert(2u32, "two".to_string());

        let mut writer = NetworkWriter::new();
        map.on_serialize_all(&mut writer);

        let mut copy: SyncDictionary<u32, String> = SyncDictionary::new();
        let mut reader = NetworkReader::new(writer.to_bytes());
        copy.on_deserialize_all(&mut reader).unwrap();

        assert_eq!(copy.len(), 2);
        assert_eq!(copy.get(&1), Some(&"one".to_string()));
        assert_eq!(copy.get(&2), Some(&"two".to_string()));
    }

    #[test]
    fn test_delta_replay() {
        let mut map = SyncDictionary::new();
        map.insert(1u32, 10i64);
        map.insert(2u32, 20i64);
        map.insert(1u32, 11i64);
        map.remove(&2);

        let mut writer = NetworkWriter::new();
        map.on_serialize_delta(&mut writer);

        let mut copy: SyncDictionary<u32, i64> = SyncDictionary::new();
        let mut reader = NetworkReader::new(writer.to_bytes());
        copy.on_deserialize_delta(&mut reader).unwrap();

        assert_eq!(copy.len(), 1);
        assert_eq!(copy.get(&1), Some(&11i64));
        assert!(!copy.contains_key(&2));
    }
}
