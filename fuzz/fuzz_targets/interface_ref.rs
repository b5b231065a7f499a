#![no_main]

use goimpl::{Canonical, ReceiverSpec, SourceFormatter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let _ = ReceiverSpec::parse(&s);
    if let Ok(out) = Canonical.format(&s) {
        // Formatting is idempotent.
        assert_eq!(Canonical.format(&out).ok().as_deref(), Some(out.as_str()));
    }
});
