// tests/segment_properties.rs
use headline_mixer::segment::{collapse_ws, segment};

#[test]
fn example_teaser_splits_into_three() {
    let out = segment(
        "Breaking news: city hall burns down! Residents evacuated.",
        "http://x/1",
    );
    let texts: Vec<&str> = out.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Breaking news", "City hall burns down!", "Residents evacuated"]
    );
    assert!(out.iter().all(|f| f.url == "http://x/1"));
}

#[test]
fn no_splitters_means_no_fragments() {
    assert!(segment("Just one sentence with no splitters", "http://x/2").is_empty());
    // a trailing period alone is not a splitter
    assert!(segment("Dog bites man.", "http://x/2").is_empty());
}

#[test]
fn output_starts_uppercase_when_input_piece_started_lowercase() {
    let samples = [
        "først: så! dernæst? til sidst",
        "ægte vare; ærlig talt - ok",
        "1. plads: 2. plads",
    ];
    for s in samples {
        for f in segment(s, "u") {
            let c = f.text.chars().next().unwrap();
            assert!(!c.is_lowercase(), "{:?} starts lowercase", f.text);
        }
    }
}

#[test]
fn fragments_never_carry_stray_separators() {
    let raw = "Valget:\n  resultatet er klar - statsministeren   taler;   se   det   her!  Nu:";
    let out = segment(raw, "u");
    assert!(out.len() >= 2);
    for f in &out {
        assert_eq!(f.text, collapse_ws(&f.text));
        assert!(!f.text.ends_with(':'));
        assert!(!f.text.ends_with(';'));
        assert!(!f.text.ends_with(" -"));
        assert!(!f.text.is_empty());
    }
}
