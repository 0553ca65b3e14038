//! Fuzz target for HostEvent::decode_str
//!
//! Host envelopes arrive from untrusted page script. Decoding must never
//! panic: malformed input returns an error, unknown tags decode to
//! `Unrecognized`. A decoded failure always renders a message.

#![no_main]

use libfuzzer_sys::fuzz_target;
use minichat_proto::HostEvent;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(event) = HostEvent::decode_str(raw) {
        if let HostEvent::CompletionFailed(failure) = &event {
            assert!(failure.message().starts_with("Error: "));
        }
    }
});
