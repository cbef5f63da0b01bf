#![no_main]
use glyphtex_layout::{FixedMetrics, LayoutConfig, batch, markup_to_glyphs};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let metrics = FixedMetrics::default();
    if let Ok(layout) = markup_to_glyphs(&s, &metrics, &LayoutConfig::default()) {
        let batches = batch(&layout.glyphs, &metrics);
        assert_eq!(
            batches.iter().map(|b| b.len()).sum::<usize>(),
            layout.glyphs.len()
        );
    }
});
