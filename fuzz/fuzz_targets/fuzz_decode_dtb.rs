#![no_main]

use dtx_codec::{decode_binary, encode_to_vec, DtbVersion, EncodeConfig};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Fuzz binary decoding, plain and encrypted - test for panics and huge allocations
    let Ok(tree) = decode_binary(&mut Cursor::new(data)) else {
        return;
    };
    // whatever decodes must re-encode to a stable image
    for version in [DtbVersion::V2, DtbVersion::V3] {
        let config = EncodeConfig::new(version);
        if let Ok(first) = encode_to_vec(&tree, &config) {
            let again = decode_binary(&mut Cursor::new(&first)).expect("re-encoded tree should decode");
            let second = encode_to_vec(&again, &config).expect("decoded tree should encode");
            assert_eq!(first, second);
        }
    }
});
