/// Id for a field that has none, stable for the same name and position.
pub fn field_auto_id(name: Option<&str>, position: usize) -> String {
    let seed = format!("{}:{position}", name.unwrap_or_default());
    format!("field-{:05x}", fnv1a64(seed.as_bytes()) & 0xf_ffff)
}

pub fn error_slot_id(field_id: &str) -> String {
    format!("{field_id}-error")
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x00000100000001b3;

    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
