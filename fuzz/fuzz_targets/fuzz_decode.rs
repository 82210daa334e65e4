#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tagwire::config::CodecConfig;
use tagwire::wire_type;
use tagwire::{Decoder, Encoder, TypeRegistry};

#[derive(Debug, Clone, Default, PartialEq)]
struct Node {
    value: i64,
    label: String,
    ids: Vec<u32>,
    child: Option<Box<Node>>,
}
wire_type!(Node => "fuzz.Node" { value: i64, label: String, ids: Vec<u32>, child: Option<Box<Node>> });

fn registry() -> &'static TypeRegistry {
    static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        TypeRegistry::builder()
            .register::<Node>()
            .build()
            .unwrap_or_default()
    })
}

fuzz_target!(|data: &[u8]| {
    // Decode arbitrary bytes - must never panic, whatever the input
    let mut src = data;
    let mut decoder = Decoder::new(registry(), CodecConfig::default());
    if let Ok(Some(value)) = decoder.decode(&mut src) {
        // Anything that decodes must encode again
        let _ = Encoder::default().to_bytes(&value);
    }
});
