use crate::replica::core::tools::utils::to_hex_string;
use bytes::Bytes;
use nalgebra::{Quaternion, Vector2, Vector3, Vector4};
use std::fmt;
use tklog::error;

pub struct NetworkWriter {
    pub data: Vec<u8>,
    pub position: usize,
}

impl NetworkWriter {
    // the limit of ushort is so we can write string size prefix as only 2 bytes.
    // -1 so we can still encode 'absent' into it too.
    pub const MAX_STRING_LENGTH: usize = u16::MAX as usize - 1;
    // 1500 bytes by default because on average, most packets will be <= MTU
    pub const DEFAULT_CAPACITY: usize = 1500;

    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(Self::DEFAULT_CAPACITY),
            position: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn ensure_capacity(&mut self, size: usize) {
        let current_capacity = self.capacity();
        if current_capacity < size {
            let new_capacity = size.max(current_capacity * 2);
            self.data.resize(new_capacity, 0);
        }
    }

    pub fn get_position(&self) -> usize {
        self.position
    }

    // moving the cursor backwards is how component payload headers get
    // back-patched after the payload size is known
    pub fn set_position(&mut self, value: usize) {
        self.position = value;
    }

    pub fn get_data(&self) -> Vec<u8> {
        self.data[..self.position].to_vec()
    }

    pub fn to_array_segment(&self) -> &[u8] {
        &self.data[..self.position]
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.to_array_segment())
    }

    pub fn write_byte(&mut self, value: u8) {
        self.ensure_capacity(self.position + 1);
        self.data[self.position] = value;
        self.position += 1;
    }

    pub fn write_bytes(&mut self, value: &[u8], offset: usize, count: usize) {
        self.ensure_capacity(self.position + count);
        self.data[self.position..self.position + count]
            .copy_from_slice(&value[offset..offset + count]);
        self.position += count;
    }

    pub fn write_bytes_all(&mut self, value: &[u8]) {
        self.write_bytes(value, 0, value.len());
    }

    pub fn write<T: Writeable>(&mut self, value: &T) {
        if let Some(write_fn) = T::get_writer() {
            write_fn(self, value);
        } else {
            error!(format!(
                "No writer found for type {}",
                std::any::type_name::<T>()
            ));
        }
    }
}

impl Default for NetworkWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-type encode function, resolved once through the trait system rather
/// than looked up per call.
pub trait Writeable {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)>
    where
        Self: Sized;
}

pub trait NetworkWriterTrait {
    fn write_bool(&mut self, value: bool);
    fn write_sbyte(&mut self, value: i8);
    fn write_char(&mut self, value: char);
    fn write_short(&mut self, value: i16);
    fn write_ushort(&mut self, value: u16);
    fn write_int(&mut self, value: i32);
    fn write_uint(&mut self, value: u32);
    fn write_long(&mut self, value: i64);
    fn write_ulong(&mut self, value: u64);
    fn write_float(&mut self, value: f32);
    fn write_double(&mut self, value: f64);
    fn write_str(&mut self, value: &str);
    fn write_bytes_and_size(&mut self, value: &[u8]);
    fn write_vector2(&mut self, value: Vector2<f32>);
    fn write_vector3(&mut self, value: Vector3<f32>);
    fn write_vector4(&mut self, value: Vector4<f32>);
    fn write_quaternion(&mut self, value: Quaternion<f32>);
    fn compress_var_ulong(&mut self, value: u64);
    fn compress_var_long(&mut self, value: i64);
}

impl fmt::Display for NetworkWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} @ {}/{}]",
            to_hex_string(self.to_array_segment()),
            self.position,
            self.capacity()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_byte_grows_buffer() {
        let mut writer = NetworkWriter::new();
        for i in 0..2000u32 {
            writer.write_byte((i & 0xFF) as u8);
        }
        assert_eq!(writer.get_position(), 2000);
        assert_eq!(writer.to_array_segment().len(), 2000);
    }

    #[test]
    fn test_reset_keeps_buffer() {
        let mut writer = NetworkWriter::new();
        writer.write_byte(1);
        writer.write_byte(2);
        writer.reset();
        assert_eq!(writer.get_position(), 0);
        assert_eq!(writer.to_array_segment(), &[] as &[u8]);
    }

    #[test]
    fn test_back_patching_header() {
        let mut writer = NetworkWriter::new();
        writer.write_byte(0);
        writer.write_byte(42);
        writer.write_byte(43);
        let end = writer.get_position();
        writer.set_position(0);
        writer.write_byte(2);
        writer.set_position(end);
        assert_eq!(writer.to_array_segment(), &[2, 42, 43]);
    }

    #[test]
    fn test_to_bytes_snapshot() {
        let mut writer = NetworkWriter::new();
        writer.write_bytes_all(&[9, 8, 7]);
        let snapshot = writer.to_bytes();
        writer.write_byte(6);
        assert_eq!(snapshot.as_ref(), &[9, 8, 7]);
    }
}
