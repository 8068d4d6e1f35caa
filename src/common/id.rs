use rand::RngExt;
use std::fmt::Write;

/// Generate a random RFC4122 v4 UUID as raw 16 bytes
pub fn generate_uuid_bytes() -> [u8; 16] {
    let mut bytes = [0u8; 16];
    let mut rng = rand::rng();
    rng.fill(&mut bytes);
    // RFC4122 v4
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    bytes
}

/// Format raw UUID bytes as a lowercase hyphenated string
pub fn format_uuid(bytes: &[u8; 16]) -> String {
    let mut out = String::with_capacity(36);
    for (i, byte) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Generate a book identifier of the form `urn:uuid:xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`
pub fn generate_book_uuid() -> String {
    format!("urn:uuid:{}", format_uuid(&generate_uuid_bytes()))
}

/// Generate a short manifest id candidate, `id_` followed by five hex digits
pub fn generate_item_id() -> String {
    let uuid = format_uuid(&generate_uuid_bytes());
    format!("id_{}", &uuid[..5])
}
