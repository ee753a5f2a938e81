#![no_main]

use dtx_codec::{parse_text, parse_text_bytes, parse_text_with, ParseConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz the text parser - test for panics and runaway recursion
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(tree) = parse_text(text) {
            let reparsed = parse_text(&tree.to_dta()).expect("rendered text should parse");
            assert_eq!(reparsed, tree);
        }
        let _ = parse_text_with(text, &ParseConfig::with_directives());
    }
    let _ = parse_text_bytes(data);
});
