#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed documents must come back as Err, never panic.
    let text = String::from_utf8_lossy(data);
    if let Ok(report) = hwperf_parse::parse_hls_xml(&text) {
        let _ = report.has_any();
        let _ = hwperf_core::HlsSummary::from_report(&report);
    }
});
