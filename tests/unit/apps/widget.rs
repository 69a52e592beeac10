use super::*;
use chrono::{FixedOffset, TimeZone};

struct Solid {
    slot: Slot,
    size: (u32, u32),
    fail: bool,
}

impl Widget for Solid {
    fn kind(&self) -> &'static str {
        "solid"
    }

    fn slot(&self) -> Slot {
        self.slot
    }

    fn render(&self, _now: &Now, _res: &mut RenderResources) -> InkResult<Bitmap> {
        if self.fail {
            return Err(InkError::data_fetch("no data"));
        }
        let mut bmp = Bitmap::blank(self.size.0, self.size.1);
        for y in 0..self.size.1 {
            for x in 0..self.size.0 {
                bmp.set(x, y, true);
            }
        }
        Ok(bmp)
    }
}

fn now() -> Now {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 6, 12, 0, 0)
        .unwrap()
}

#[test]
fn widgets_land_at_their_slots() {
    let w = Solid {
        slot: Slot::new(100, 50, 10, 20),
        size: (10, 20),
        fail: false,
    };
    let raster = compose(&[&w], &now(), &mut RenderResources::disabled()).unwrap();
    let bmp = raster.bitmap();
    assert_eq!(bmp.count_black(), 200);
    assert!(bmp.is_black(100, 50));
    assert!(bmp.is_black(109, 69));
    assert!(!bmp.is_black(110, 69));
}

#[test]
fn failures_and_wrong_sizes_become_crossed_boxes() {
    let failing = Solid {
        slot: Slot::new(0, 0, 40, 20),
        size: (40, 20),
        fail: true,
    };
    let oversized = Solid {
        slot: Slot::new(200, 200, 40, 20),
        size: (41, 20),
        fail: false,
    };
    let raster = compose(
        &[&failing, &oversized],
        &now(),
        &mut RenderResources::disabled(),
    )
    .unwrap();
    let bmp = raster.bitmap();
    let expected = crossed_box(40, 20);
    for (x0, y0) in [(0u32, 0u32), (200, 200)] {
        for y in 0..20 {
            for x in 0..40 {
                assert_eq!(bmp.is_black(x0 + x, y0 + y), expected.is_black(x, y));
            }
        }
    }
}
