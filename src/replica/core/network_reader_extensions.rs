use crate::replica::core::network_reader::{
    DecodeError, NetworkReader, NetworkReaderTrait, Readable,
};
use crate::replica::core::tools::compress;
use nalgebra::{Quaternion, Vector2, Vector3, Vector4};

impl NetworkReaderTrait for NetworkReader {
    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_byte()? != 0)
    }

    fn read_sbyte(&mut self) -> Result<i8, DecodeError> {
        Ok(self.read_byte()? as i8)
    }

    fn read_char(&mut self) -> Result<char, DecodeError> {
        let code = self.read_ushort()?;
        char::from_u32(code as u32).ok_or(DecodeError::Invalid("char"))
    }

    fn read_short(&mut self) -> Result<i16, DecodeError> {
        let segment = self.read_segment(2)?;
        Ok(i16::from_le_bytes([segment[0], segment[1]]))
    }

    fn read_ushort(&mut self) -> Result<u16, DecodeError> {
        let segment = self.read_segment(2)?;
        Ok(u16::from_le_bytes([segment[0], segment[1]]))
    }

    fn read_int(&mut self) -> Result<i32, DecodeError> {
        let segment = self.read_segment(4)?;
        Ok(i32::from_le_bytes([segment[0], segment[1], segment[2], segment[3]]))
    }

    fn read_uint(&mut self) -> Result<u32, DecodeError> {
        let segment = self.read_segment(4)?;
        Ok(u32::from_le_bytes([segment[0], segment[1], segment[2], segment[3]]))
    }

    fn read_long(&mut self) -> Result<i64, DecodeError> {
        let segment = self.read_segment(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(segment);
        Ok(i64::from_le_bytes(bytes))
    }

    fn read_ulong(&mut self) -> Result<u64, DecodeError> {
        let segment = self.read_segment(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(segment);
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_float(&mut self) -> Result<f32, DecodeError> {
        let segment = self.read_segment(4)?;
        Ok(f32::from_le_bytes([segment[0], segment[1], segment[2], segment[3]]))
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        let segment = self.read_segment(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(segment);
        Ok(f64::from_le_bytes(bytes))
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let size = self.read_ushort()? as usize;
        if size == 0 {
            // absent string, decoded as empty
            return Ok(String::new());
        }
        let bytes = self.read_bytes(size - 1)?;
        Ok(String::from_utf8(bytes)?)
    }

    fn read_bytes_and_size(&mut self) -> Result<Vec<u8>, DecodeError> {
        let size = self.read_uint()? as usize;
        if size == 0 {
            return Ok(Vec::new());
        }
        self.read_bytes(size - 1)
    }

    fn read_vector2(&mut self) -> Result<Vector2<f32>, DecodeError> {
        Ok(Vector2::new(self.read_float()?, self.read_float()?))
    }

    fn read_vector3(&mut self) -> Result<Vector3<f32>, DecodeError> {
        Ok(Vector3::new(
            self.read_float()?,
            self.read_float()?,
            self.read_float()?,
        ))
    }

    fn read_vector4(&mut self) -> Result<Vector4<f32>, DecodeError> {
        Ok(Vector4::new(
            self.read_float()?,
            self.read_float()?,
            self.read_float()?,
            self.read_float()?,
        ))
    }

    fn read_quaternion(&mut self) -> Result<Quaternion<f32>, DecodeError> {
        let x = self.read_float()?;
        let y = self.read_float()?;
        let z = self.read_float()?;
        let w = self.read_float()?;
        Ok(Quaternion::new(w, x, y, z))
    }

    fn decompress_var_ulong(&mut self) -> Result<u64, DecodeError> {
        compress::decompress_var_uint(self)
    }

    fn decompress_var_long(&mut self) -> Result<i64, DecodeError> {
        compress::decompress_var_int(self)
    }
}

impl Readable for u8 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_byte())
    }
}

impl Readable for i8 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_sbyte())
    }
}

impl Readable for bool {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_bool())
    }
}

impl Readable for char {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_char())
    }
}

impl Readable for i16 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_short())
    }
}

impl Readable for u16 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_ushort())
    }
}

impl Readable for i32 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_int())
    }
}

impl Readable for u32 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_uint())
    }
}

impl Readable for i64 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_long())
    }
}

impl Readable for u64 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_ulong())
    }
}

impl Readable for f32 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_float())
    }
}

impl Readable for f64 {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_double())
    }
}

impl Readable for String {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_string())
    }
}

impl Readable for Vec<u8> {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_bytes_and_size())
    }
}

impl Readable for Vector2<f32> {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_vector2())
    }
}

impl Readable for Vector3<f32> {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_vector3())
    }
}

impl Readable for Vector4<f32> {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_vector4())
    }
}

impl Readable for Quaternion<f32> {
    fn get_reader() -> Option<fn(&mut NetworkReader) -> Result<Self, DecodeError>> {
        Some(|reader| reader.read_quaternion())
    }
}
