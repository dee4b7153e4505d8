#![no_main]

use libfuzzer_sys::fuzz_target;
use strata::{Diagnostic, Loader};

fuzz_target!(|data: &[u8]| {
    let strict = Loader::new().load_from_slice(data);

    // A sink never makes loading fail, and only reports errors when loading without one fails.
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let lenient = Loader::new().with_sink(&mut diagnostics).load_from_slice(data);
    if let Ok(values) = strict {
        assert_eq!(lenient.as_ref(), Ok(&values));
        assert!(diagnostics.iter().all(Diagnostic::is_warning));
    } else if strata::decode(data, None).is_ok() {
        assert!(lenient.is_ok());
    }
});
