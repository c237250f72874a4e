/// Decodes a raw capture buffer into signed 16-bit little-endian samples.
///
/// Produces `floor(buffer.len() / 2)` samples; a trailing odd byte is silently
/// dropped. The capture transport hands over whatever the OS delivered, so an
/// odd-length buffer is a normal occurrence, not an error.
pub fn decode_frame(buffer: &[u8]) -> Vec<i16> {
    buffer
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
