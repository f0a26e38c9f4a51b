#![no_main]

use libfuzzer_sys::fuzz_target;

use alotbot::autoreply::ReplyTemplate;

fuzz_target!(|data: &str| {
    // First line is the template, the rest is post text matched against a
    // fixed two-group pattern. Construction may reject the template; a
    // template that is accepted must render without panicking.
    let (template, text) = data.split_once('\n').unwrap_or((data, ""));
    if let Ok(rule) = ReplyTemplate::case_insensitive("fuzz", r"(\w+) and (\w*) alot", template) {
        let _ = rule.render(text);
    }
    if let Ok(rule) = ReplyTemplate::new("fuzz", r"I love (\w+)?\s*alot", template) {
        let _ = rule.render(text);
    }
});
