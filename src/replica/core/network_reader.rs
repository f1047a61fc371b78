use crate::replica::core::tools::utils::to_hex_string;
use bytes::Bytes;
use nalgebra::{Quaternion, Vector2, Vector3, Vector4};
use std::fmt;
use std::string::FromUtf8Error;
use thiserror::Error;

/// A failed read is fatal to that single read only. The reader stays usable,
/// the caller decides whether the surrounding payload is salvageable.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("read out of range: {needed} bytes needed, {remaining} remaining")]
    OutOfRange { needed: usize, remaining: usize },
    #[error("invalid utf-8 in string payload")]
    InvalidUtf8(#[from] FromUtf8Error),
    #[error("no reader registered for type {0}")]
    MissingReader(&'static str),
    #[error("invalid value for {0}")]
    Invalid(&'static str),
}

pub struct NetworkReader {
    data: Bytes,
    position: usize,
}

impl NetworkReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        NetworkReader {
            data: data.into(),
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn get_position(&self) -> usize {
        self.position
    }

    // clamped so a corrected position from a damaged payload can never put
    // the cursor past the end of the segment
    pub fn set_position(&mut self, value: usize) {
        self.position = value.min(self.data.len());
    }

    pub fn set_data(&mut self, data: impl Into<Bytes>) {
        self.data = data.into();
        self.position = 0;
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let segment = self.read_segment(1)?;
        Ok(segment[0])
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, DecodeError> {
        Ok(self.read_segment(count)?.to_vec())
    }

    pub fn read_segment(&mut self, count: usize) -> Result<&[u8], DecodeError> {
        if self.remaining() < count {
            return Err(DecodeError::OutOfRange {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let segment = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(segment)
    }

    pub fn read_bytes_all(&mut self) -> Vec<u8> {
        let rest = self.data[self.position..].to_vec();
        self.position = self.data.len();
        rest
    }

    pub fn read<T: Readable>(&mut self) -> Result<T, DecodeError> {
        match T::get_reader() {
            Some(read_fn) => read_fn(self),
            None => Err(DecodeError::MissingReader(std::any::type_name::<T>())),
        }
    }
}

/// Per-type decode function, resolved once through the trait system rather
/// than looked up per call.
pub trait Readable {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>>
    where
        Self: Sized;
}

pub trait NetworkReaderTrait {
    fn read_bool(&mut self) -> Result<bool, DecodeError>;
    fn read_sbyte(&mut self) -> Result<i8, DecodeError>;
    fn read_char(&mut self) -> Result<char, DecodeError>;
    fn read_short(&mut self) -> Result<i16, DecodeError>;
    fn read_ushort(&mut self) -> Result<u16, DecodeError>;
    fn read_int(&mut self) -> Result<i32, DecodeError>;
    fn read_uint(&mut self) -> Result<u32, DecodeError>;
    fn read_long(&mut self) -> Result<i64, DecodeError>;
    fn read_ulong(&mut self) -> Result<u64, DecodeError>;
    fn read_float(&mut self) -> Result<f32, DecodeError>;
    fn read_double(&mut self) -> Result<f64, DecodeError>;
    fn read_string(&mut self) -> Result<String, DecodeError>;
    fn read_bytes_and_size(&mut self) -> Result<Vec<u8>, DecodeError>;
    fn read_vector2(&mut self) -> Result<Vector2<f32>, DecodeError>;
    fn read_vector3(&mut self) -> Result<Vector3<f32>, DecodeError>;
    fn read_vector4(&mut self) -> Result<Vector4<f32>, DecodeError>;
    fn read_quaternion(&mut self) -> Result<Quaternion<f32>, DecodeError>;
    fn decompress_var_ulong(&mut self) -> Result<u64, DecodeError>;
    fn decompress_var_long(&mut self) -> Result<i64, DecodeError>;
}

impl fmt::Display for NetworkReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} @ {}/{}]",
            to_hex_string(&self.data),
            self.position,
            self.capacity()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end_is_out_of_range() {
        let mut reader = NetworkReader::new(vec![1u8, 2]);
        assert_eq!(reader.read_byte().unwrap(), 1);
        assert_eq!(reader.read_byte().unwrap(), 2);
        match reader.read_byte() {
            Err(DecodeError::OutOfRange { needed, remaining }) => {
                assert_eq!(needed, 1);
                assert_eq!(remaining, 0);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_read_leaves_reader_usable() {
        let mut reader = NetworkReader::new(vec![7u8]);
        assert!(reader.read_bytes(4).is_err());
        assert_eq!(reader.read_byte().unwrap(), 7);
    }

    #[test]
    fn test_set_position_is_clamped() {
        let mut reader = NetworkReader::new(vec![1u8, 2, 3]);
        reader.set_position(100);
        assert_eq!(reader.get_position(), 3);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_bytes_all() {
        let mut reader = NetworkReader::new(vec![1u8, 2, 3]);
        assert_eq!(reader.read_byte().unwrap(), 1);
        assert_eq!(reader.read_bytes_all(), vec![2, 3]);
        assert_eq!(reader.remaining(), 0);
    }
}
