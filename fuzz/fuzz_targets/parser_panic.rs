#![no_main]
use glyphtex_syntax::{GapPolicy, Lexer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Lossy conversion keeps inputs that are almost text.
    let s = String::from_utf8_lossy(data);
    let _ = glyphtex_syntax::parse(&s);

    let strict = Lexer::latex().with_gap_policy(GapPolicy::Fail);
    for token in strict.tokenize(&s) {
        if token.is_err() {
            break;
        }
    }
});
