#![no_main]

use goimpl_parser::printer::render_type;
use goimpl_parser::{parse_source, parse_type_expr};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(file) = parse_source(src) else {
        return;
    };

    // Printed types must parse back to the same text.
    for (_, spec) in file.type_specs() {
        let printed = render_type(&spec.typ);
        if let Ok(again) = parse_type_expr(&printed) {
            assert_eq!(render_type(&again), printed);
        }
    }
});
