#![no_main]

use libfuzzer_sys::fuzz_target;

use alotbot::autoreply::is_repost;
use alotbot::channels::wire::decode_post;

fuzz_target!(|data: &str| {
    // Stream lines come from an untrusted relay; decoding must fail cleanly.
    if let Ok(post) = decode_post(data) {
        let _ = is_repost(&post);
    }
});
