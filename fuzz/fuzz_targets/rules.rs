#![no_main]

use libfuzzer_sys::fuzz_target;
use dotprobe::integrations::load_integrations_from_str;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = load_integrations_from_str(text);
    }
});
