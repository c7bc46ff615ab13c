#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<cover_io::StoreDocument>(data) else {
        return;
    };
    for id in doc.data.keys() {
        // Either a valid percent or a typed error; never a panic.
        if let Ok(Some(p)) = doc.position(id) {
            assert!(p <= 100);
        }
    }
});
