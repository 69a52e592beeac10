use super::*;

#[test]
fn disabled_fonts_measure_by_char_count() {
    let mut fonts = Fonts::disabled();
    assert!(!fonts.is_enabled());
    let w = fonts.measure("abcd", 20.0).unwrap();
    assert!((w - 4.0 * 20.0 * FALLBACK_ADVANCE_EM).abs() < 1e-4);

    let shaped = fonts.shape("Zürich", 10.0).unwrap();
    assert!(shaped.layout.is_none());
    assert_eq!(shaped.height, 10.0);
}

#[test]
fn shape_rejects_bad_size() {
    let mut fonts = Fonts::disabled();
    assert!(fonts.shape("x", 0.0).is_err());
    assert!(fonts.shape("x", f32::NAN).is_err());
}

#[test]
fn from_bytes_rejects_garbage() {
    assert!(Fonts::from_bytes(b"definitely not a font".to_vec()).is_err());
}
