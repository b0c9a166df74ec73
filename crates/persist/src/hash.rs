/// Version of the field-name hash scheme.
///
/// Streams hashed under a different version cannot be matched field-by-field.
pub const NAME_HASH_VERSION: u32 = 1;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-8 bytes of a field name, stored on the wire
/// as a signed 32-bit value.
pub fn name_hash(name: &str) -> i32 {
    let mut hash = FNV32_OFFSET_BASIS;
    for byte in name.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV32_PRIME);
    }
    hash as i32
}

/// Name hash of a positional container slot (list element, map entry, array cell).
pub fn index_hash(index: usize) -> i32 {
    name_hash(&index.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_vectors() {
        assert_eq!(name_hash("") as u32, 0x811c_9dc5);
        assert_eq!(name_hash("a") as u32, 0xe40c_292c);
        assert_eq!(name_hash("foobar") as u32, 0xbf9c_f968);
    }

    #[test]
    fn repeated_calls_agree() {
        let first = name_hash("inventory");
        for _ in 0..100 {
            assert_eq!(name_hash("inventory"), first);
        }
    }

    #[test]
    fn distinct_names_differ() {
        assert_ne!(name_hash("health"), name_hash("mana"));
    }

    #[test]
    fn index_hash_hashes_decimal_text() {
        assert_eq!(index_hash(0), name_hash("0"));
        assert_eq!(index_hash(17), name_hash("17"));
    }
}
