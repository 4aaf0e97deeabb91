// Shared fixtures for the integration tests
//
// Every fragment is synthetic so the tests need no assets on disk.

#![allow(dead_code)]

use tear_matching::{CorpusEntry, FragmentMask, FragmentSide, TestTear};

pub const WIDTH: u32 = 200;
pub const HEIGHT: u32 = 160;

/// Controls whether annotated extractions are written next to the test binary
pub const DEBUG_OUTPUT: bool = false;

pub fn fragment(tear: TestTear, side: FragmentSide) -> FragmentMask {
    FragmentMask::create_test_fragment(WIDTH, HEIGHT, tear, side)
}

/// Four fragments from two torn sheets, plus a wider sheet torn like the first.
pub fn corpus() -> Vec<CorpusEntry> {
    vec![
        CorpusEntry::new("wave-top", fragment(TestTear::Wave, FragmentSide::Below)),
        CorpusEntry::new("wave-bottom", fragment(TestTear::Wave, FragmentSide::Above)),
        CorpusEntry::new("jagged-top", fragment(TestTear::Jagged, FragmentSide::Below)),
        CorpusEntry::new("jagged-bottom", fragment(TestTear::Jagged, FragmentSide::Above)),
        CorpusEntry::new(
            "wide-wave-top",
            FragmentMask::create_test_fragment(260, HEIGHT, TestTear::Wave, FragmentSide::Below),
        ),
    ]
}

/// A lobed blob torn on every side, turned by `phase` radians.
pub fn blob(lobes: f64, phase: f64) -> FragmentMask {
    FragmentMask::from_predicate(140, 140, |x, y| {
        let dx = x as f64 - 70.0;
        let dy = y as f64 - 70.0;
        let angle = dy.atan2(dx) - phase;
        let radius = 40.0 + 8.0 * (lobes * angle).sin() + 4.0 * (13.0 * angle).cos();
        dx.hypot(dy) <= radius
    })
}
