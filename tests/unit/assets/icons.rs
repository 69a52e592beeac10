use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "inkboard_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="black"/></svg>"#;

#[test]
fn rasterize_fit_keeps_aspect() {
    let tree = parse_svg(SQUARE.as_bytes()).unwrap();
    let img = rasterize_fit(&tree, 40).unwrap();
    assert_eq!((img.width, img.height), (40, 20));
    assert_eq!(img.rgba8_premul.len(), 40 * 20 * 4);
    // fully covered, opaque black
    assert_eq!(&img.rgba8_premul[0..4], &[0, 0, 0, 255]);
}

#[test]
fn parse_svg_rejects_garbage() {
    assert!(parse_svg(b"<svg").is_err());
}

#[test]
fn lookup_falls_back_then_skips() {
    let tmp = temp_dir("icons");
    std::fs::create_dir_all(&tmp).unwrap();

    let mut icons = IconSet::new(&tmp);
    assert!(icons.get("wi-day-sunny", 16).unwrap().is_none());

    std::fs::write(tmp.join(format!("{FALLBACK_ICON}.svg")), SQUARE).unwrap();
    let img = icons.get("wi-day-sunny", 16).unwrap().unwrap();
    assert_eq!((img.width, img.height), (16, 8));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn disabled_set_returns_none() {
    let mut icons = IconSet::disabled();
    assert!(icons.get("wi-day-sunny", 16).unwrap().is_none());
}
