use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SlidecastError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SlidecastError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(SlidecastError::render("x").to_string().contains("render error:"));
    assert!(SlidecastError::cache("x").to_string().contains("cache error:"));
    assert!(
        SlidecastError::presentation("x")
            .to_string()
            .contains("presentation error:")
    );
    assert!(
        SlidecastError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SlidecastError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let e = serde_json::from_str::<u32>("nope").unwrap_err();
    assert!(matches!(SlidecastError::from(e), SlidecastError::Serde(_)));
}
