#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let rec = hwperf_parse::parse_device_log(&text, Path::new("fuzz.log"));
    if let Some(stats) = rec.payload.stats {
        assert!(stats.p90_ms <= stats.max_ms);
        assert_eq!(stats.count, rec.payload.inference_times_ms.len());
    }
});
