use crate::replica::core::network_writer::{NetworkWriter, NetworkWriterTrait, Writeable};
use crate::replica::core::tools::compress;
use nalgebra::{Quaternion, Vector2, Vector3, Vector4};
use tklog::error;

impl NetworkWriterTrait for NetworkWriter {
    fn write_bool(&mut self, value: bool) {
        self.write_byte(value as u8);
    }

    fn write_sbyte(&mut self, value: i8) {
        self.write_byte(value as u8);
    }

    fn write_char(&mut self, value: char) {
        self.write_ushort(value as u16);
    }

    fn write_short(&mut self, value: i16) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    fn write_ushort(&mut self, value: u16) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    fn write_int(&mut self, value: i32) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    fn write_uint(&mut self, value: u32) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    fn write_long(&mut self, value: i64) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    fn write_ulong(&mut self, value: u64) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    fn write_float(&mut self, value: f32) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    fn write_double(&mut self, value: f64) {
        self.write_bytes_all(&value.to_le_bytes());
    }

    // size prefix is 1 + length so a zero prefix can mean 'absent'
    fn write_str(&mut self, value: &str) {
        let bytes = value.as_bytes();
        if bytes.len() > Self::MAX_STRING_LENGTH {
            error!(format!(
                "String length {} exceeds maximum of {}",
                bytes.len(),
                Self::MAX_STRING_LENGTH
            ));
            self.write_ushort(0);
            return;
        }
        self.write_ushort(1 + bytes.len() as u16);
        self.write_bytes_all(bytes);
    }

    fn write_bytes_and_size(&mut self, value: &[u8]) {
        self.write_uint(1 + value.len() as u32);
        self.write_bytes_all(value);
    }

    fn write_vector2(&mut self, value: Vector2<f32>) {
        self.write_float(value.x);
        self.write_float(value.y);
    }

    fn write_vector3(&mut self, value: Vector3<f32>) {
        self.write_float(value.x);
        self.write_float(value.y);
        self.write_float(value.z);
    }

    fn write_vector4(&mut self, value: Vector4<f32>) {
        self.write_float(value.x);
        self.write_float(value.y);
        self.write_float(value.z);
        self.write_float(value.w);
    }

    fn write_quaternion(&mut self, value: Quaternion<f32>) {
        self.write_float(value.coords.x);
        self.write_float(value.coords.y);
        self.write_float(value.coords.z);
        self.write_float(value.coords.w);
    }

    fn compress_var_ulong(&mut self, value: u64) {
        compress::compress_var_uint(self, value);
    }

    fn compress_var_long(&mut self, value: i64) {
        compress::compress_var_int(self, value);
    }
}

impl Writeable for u8 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_byte(*value))
    }
}

impl Writeable for i8 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_sbyte(*value))
    }
}

impl Writeable for bool {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_bool(*value))
    }
}

impl Writeable for char {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_char(*value))
    }
}

impl Writeable for i16 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_short(*value))
    }
}

impl Writeable for u16 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_ushort(*value))
    }
}

impl Writeable for i32 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_int(*value))
    }
}

impl Writeable for u32 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_uint(*value))
    }
}

impl Writeable for i64 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_long(*value))
    }
}

impl Writeable for u64 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_ulong(*value))
    }
}

impl Writeable for f32 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_float(*value))
    }
}

impl Writeable for f64 {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_double(*value))
    }
}

impl Writeable for String {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_str(value))
    }
}

impl Writeable for Vec<u8> {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_bytes_and_size(value))
    }
}

impl Writeable for Vector2<f32> {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_vector2(*value))
    }
}

impl Writeable for Vector3<f32> {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_vector3(*value))
    }
}

impl Writeable for Vector4<f32> {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_vector4(*value))
    }
}

impl Writeable for Quaternion<f32> {
    fn get_writer() -> Option<fn(&mut NetworkWriter, &Self)> {
        Some(|writer, value| writer.write_quaternion(*value))
    }
}
