use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        InkError::no_content("x")
            .to_string()
            .contains("no content available:")
    );
    assert!(
        InkError::data_fetch("x")
            .to_string()
            .contains("data fetch error:")
    );
    assert!(InkError::render("x").to_string().contains("render error:"));
    assert!(InkError::publish("x").to_string().contains("publish error:"));
    assert!(
        InkError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = InkError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn publish_io_keeps_context() {
    let err = InkError::publish_io("write info.json", std::io::Error::other("disk full"));
    let msg = err.to_string();
    assert!(msg.contains("write info.json"));
    assert!(msg.contains("disk full"));
}
