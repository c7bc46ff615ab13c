#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = cover_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // Every accepted config must yield usable ids and names.
            for (id, cover) in cfg.covers() {
                assert!(!id.is_empty());
                assert!(!cover.display_name(&id).is_empty());
                assert!(cover.closing_time_ms() > 0);
            }
        }
    }
});
