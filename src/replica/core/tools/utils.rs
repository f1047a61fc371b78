pub fn to_hex_string(data: &[u8]) -> String {
    let mut hex_string = String::with_capacity(data.len() * 2);
    for byte in data {
        hex_string.push_str(&format!("{:02X}", byte));
    }
    hex_string
}
