#![no_main]

use std::collections::BTreeSet;

use libfuzzer_sys::fuzz_target;
use mm_parser::parse;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let tags: BTreeSet<String> = ["sql", "db"].into_iter().map(String::from).collect();
    if let Ok(parsed) = parse(input, "fuzz.md", &tags) {
        let graph = &parsed.graph;
        assert!(graph.validate().is_empty());
        for edge in graph.edges() {
            assert!(graph.contains(&edge.source));
            assert!(graph.contains(&edge.target));
        }
    }
});
