use crate::replica::core::network_reader::{
    DecodeError, NetworkReader, NetworkReaderTrait, Readable,
};
use crate::replica::core::network_writer::{NetworkWriter, NetworkWriterTrait, Writeable};
use crate::replica::core::sync_object::SyncObject;
use std::fmt;
use std::fmt::Debug;
use std::ops::Index;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add = 0,
    Clear = 1,
    Insert = 2,
    RemoveAt = 3,
    Set = 4,
}

impl Operation {
    fn from_byte(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Operation::Add),
            1 => Ok(Operation::Clear),
            2 => Ok(Operation::Insert),
            3 => Ok(Operation::RemoveAt),
            4 => Ok(Operation::Set),
            _ => Err(DecodeError::Invalid("sync list operation")),
        }
    }
}

// replayable operation log entry
#[derive(Debug, Clone)]
enum Change<T> {
    Add(T),
    Insert(u32, T),
    Set(u32, T),
    RemoveAt(u32),
    Clear,
}

pub type Callback<T> = Arc<dyn Fn(Operation, usize, &T) + Send + Sync>;
pub type ClearCallback = Arc<dyn Fn() + Send + Sync>;

pub struct SyncList<T> {
    items: Vec<T>,
    changes: Vec<Change<T>>,
    pub on_add: Option<Callback<T>>,
    pub on_insert: Option<Callback<T>>,
    pub on_set: Option<Callback<T>>,
    pub on_remove: Option<Callback<T>>,
    pub on_clear: Option<ClearCallback>,
}

impl<T: Clone> SyncList<T> {
    pub fn new() -> Self {
        SyncList {
            items: Vec::new(),
            changes: Vec::new(),
            on_add: None,
            on_insert: None,
            on_set: None,
            on_remove: None,
            on_clear: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    // every mutation records a change, even when the net effect cancels out.
    // over-marking dirty is fine, under-marking would lose updates.
    pub fn add(&mut self, item: T) {
        let index = self.items.len();
        self.items.push(item.clone());
        self.changes.push(Change::Add(item.clone()));
        if let Some(callback) = &self.on_add {
            callback(Operation::Add, index, &item);
        }
    }

    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item.clone());
        self.changes.push(Change::Insert(index as u32, item.clone()));
        if let Some(callback) = &self.on_insert {
            callback(Operation::Insert, index, &item);
        }
    }

    pub fn set(&mut self, index: usize, item: T) {
        self.items[index] = item.clone();
        self.changes.push(Change::Set(index as u32, item.clone()));
        if let Some(callback) = &self.on_set {
            callback(Operation::Set, index, &item);
        }
    }

    pub fn remove_at(&mut self, index: usize) -> T {
        let old_item = self.items.remove(index);
        self.changes.push(Change::RemoveAt(index as u32));
        if let Some(callback) = &self.on_remove {
            callback(Operation::RemoveAt, index, &old_item);
        }
        old_item
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.changes.push(Change::Clear);
        if let Some(callback) = &self.on_clear {
            callback();
        }
    }
}

impl<T: Clone + PartialEq> SyncList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}

impl<T: Clone> Default for SyncList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for SyncList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T: Debug> fmt::Debug for SyncList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncList")
            .field("items", &self.items)
            .field("changes", &self.changes.len())
            .finish()
    }
}

impl<T> SyncObject for SyncList<T>
where
    T: Clone + Debug + Send + Writeable + Readable + 'static,
{
    fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn on_serialize_all(&self, writer: &mut NetworkWriter) {
        writer.compress_var_ulong(self.items.len() as u64);
        for item in &self.items {
            writer.write(item);
        }
    }

    fn on_serialize_delta(&self, writer: &mut NetworkWriter) {
        writer.compress_var_ulong(self.changes.len() as u64);
        for change in &self.changes {
            match change {
                Change::Add(item) => {
                    writer.write_byte(Operation::Add as u8);
                    writer.write(item);
                }
                Change::Insert(index, item) => {
                    writer.write_byte(Operation::Insert as u8);
                    writer.compress_var_ulong(*index as u64);
                    writer.write(item);
                }
                Change::Set(index, item) => {
                    writer.write_byte(Operation::Set as u8);
                    writer.compress_var_ulong(*index as u64);
                    writer.write(item);
                }
                Change::RemoveAt(index) => {
                    writer.write_byte(Operation::RemoveAt as u8);
                    writer.compress_var_ulong(*index as u64);
                }
                Change::Clear => {
                    writer.write_byte(Operation::Clear as u8);
                }
            }
        }
    }

    fn on_deserialize_all(&mut self, reader: &mut NetworkReader) -> Result<(), DecodeError> {
        let count = reader.decompress_var_ulong()? as usize;
        self.items.clear();
        self.changes.clear();
        for _ in 0..count {
            let item: T = reader.read()?;
            self.items.push(item);
        }
        Ok(())
    }

    // applies the sender's operation log in order. the receiver does not
    // re-record changes, it mirrors state.
    fn on_deserialize_delta(&mut self, reader: &mut NetworkReader) -> Result<(), DecodeError> {
        let count = reader.decompress_var_ulong()? as usize;
        for _ in 0..count {
            let operation = Operation::from_byte(reader.read_byte()?)?;
            match operation {
                Operation::Add => {
                    let item: T = reader.read()?;
                    let index = self.items.len();
                    self.items.push(item.clone());
                    if let Some(callback) = &self.on_add {
                        callback(Operation::Add, index, &item);
                    }
                }
                Operation::Clear => {
                    self.items.clear();
                    if let Some(callback) = &self.on_clear {
                        callback();
                    }
                }
                Operation::Insert => {
                    let index = reader.decompress_var_ulong()? as usize;
                    if index > self.items.len() {
                        return Err(DecodeError::Invalid("sync list insert index"));
                    }
                    let item: T = reader.read()?;
                    self.items.insert(index, item.clone());
                    if let Some(callback) = &self.on_insert {
                        callback(Operation::Insert, index, &item);
                    }
                }
                Operation::RemoveAt => {
                    let index = reader.decompress_var_ulong()? as usize;
                    if index >= self.items.len() {
                        return Err(DecodeError::Invalid("sync list remove index"));
                    }
                    let old_item = self.items.remove(index);
                    if let Some(callback) = &self.on_remove {
                        callback(Operation::RemoveAt, index, &old_item);
                    }
                }
                Operation::Set => {
                    let index = reader.decompress_var_ulong()? as usize;
                    if index >= self.items.len() {
                        return Err(DecodeError::Invalid("sync list set index"));
                    }
                    let item: T = reader.read()?;
                    self.items[index] = item.clone();
                    if let Some(callback) = &self.on_set {
                        callback(Operation::Set, index, &item);
                    }
                }
            }
        }
        Ok(())
    }
}
