#![no_main]

use hwperf_core::ExtractProfile;
use hwperf_parse::vivado::{fmax_est_mhz, parse_power, parse_timing, parse_utilization};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let profile = ExtractProfile::default();

    let timing = parse_timing(&text, &profile);
    let _ = fmax_est_mhz(&timing);

    let util = parse_utilization(&text, &profile);
    for (_, usage) in util.iter() {
        let _ = usage.utilization_pct();
    }

    let _ = parse_power(&text, &profile);
});
