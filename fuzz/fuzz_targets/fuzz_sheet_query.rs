#![no_main]

use libfuzzer_sys::fuzz_target;
use sheet_stack::{
    RestorePolicy, SheetStack, SheetSyncConfig, decode_query, merge_into_query, same_query,
};

fuzz_target!(|data: &[u8]| {
    // Query strings are not required to be UTF-8; the decoder is lossy.
    let query = String::from_utf8_lossy(data);
    if query.len() > 8192 {
        return;
    }

    for restore in [RestorePolicy::ActiveOnly, RestorePolicy::FullStack] {
        let config = SheetSyncConfig::default().with_restore(restore);

        // Decoding must never panic.
        let outcome = decode_query(&query, &config);
        assert!(outcome.descriptors.len() <= config.max_restore_depth);

        // Whatever survived re-encodes and decodes to the same stack.
        let mut stack = SheetStack::new();
        stack.replace(outcome.descriptors);
        let canonical = merge_into_query(&query, &stack, &config);
        let again = decode_query(&canonical, &config);
        assert_eq!(again.dropped, 0, "canonical query dropped a level: {canonical}");
        assert_eq!(again.descriptors.as_slice(), stack.as_slice());

        // Rewriting is idempotent.
        let twice = merge_into_query(&canonical, &stack, &config);
        assert!(same_query(&canonical, &twice), "{canonical} != {twice}");
    }
});
