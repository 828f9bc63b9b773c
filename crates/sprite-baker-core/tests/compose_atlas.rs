use image::{Rgba, RgbaImage};
use sprite_baker_core::atlas::{AtlasOptions, AtlasSprite, compose_atlas};
use sprite_baker_core::atlas_index::AtlasIndex;
use sprite_baker_core::error::BuildError;
use std::path::Path;

fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba(px))
}

fn is_pow2(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

#[test]
fn canvas_is_rounded_up_to_powers_of_two() {
    let sprites = vec![
        AtlasSprite::new("wide.png", solid(30, 6, [255; 4])),
        AtlasSprite::new("tall.png", solid(5, 20, [255; 4])),
    ];
    let atlas = compose_atlas(sprites, &AtlasOptions::default()).expect("compose");
    assert!(is_pow2(atlas.width()) && is_pow2(atlas.height()));
    assert!(atlas.width() >= atlas.used_extent.0);
    assert!(atlas.height() >= atlas.used_extent.1);
    assert!(atlas.width() <= 4096 && atlas.height() <= 4096);
    for e in &atlas.entries {
        assert_eq!(e.sheet_index, 0);
        assert!(e.x + e.width <= atlas.width());
        assert!(e.y + e.height <= atlas.height());
    }
}

#[test]
fn single_sprite_layout_and_pivot() {
    let atlas = compose_atlas(
        vec![AtlasSprite::new("a.png", solid(10, 6, [255; 4]))],
        &AtlasOptions::default(),
    )
    .expect("compose");
    // 10x6 plus one pixel of padding
    assert_eq!(atlas.used_extent, (11, 7));
    assert_eq!((atlas.width(), atlas.height()), (16, 8));
    assert_eq!(atlas.map_text(), "a.png,0,0,0,10,6,5,3\n");
}

#[test]
fn odd_sizes_round_the_pivot_up() {
    let atlas = compose_atlas(
        vec![AtlasSprite::new("odd.png", solid(5, 7, [255; 4]))],
        &AtlasOptions::default(),
    )
    .expect("compose");
    let e = &atlas.entries[0];
    assert_eq!((e.pivot_x, e.pivot_y), (3, 4));
}

#[test]
fn trimmed_sprite_keeps_original_center_as_pivot() {
    let mut img = RgbaImage::new(8, 8);
    for y in 1..4 {
        for x in 2..6 {
            img.put_pixel(x, y, Rgba([10, 20, 30, 255]));
        }
    }
    let opts = AtlasOptions {
        trim: true,
        ..Default::default()
    };
    let atlas = compose_atlas(vec![AtlasSprite::new("t.png", img)], &opts).expect("compose");
    let e = &atlas.entries[0];
    assert_eq!((e.width, e.height), (4, 3));
    assert_eq!((e.pivot_x, e.pivot_y), (2, 3));
    assert_eq!(atlas.image.get_pixel(e.x, e.y), &Rgba([10, 20, 30, 255]));
}

#[test]
fn fully_transparent_sprite_is_not_trimmed_away() {
    let opts = AtlasOptions {
        trim: true,
        ..Default::default()
    };
    let atlas = compose_atlas(vec![AtlasSprite::new("empty.png", RgbaImage::new(6, 4))], &opts).expect("compose");
    let e = &atlas.entries[0];
    assert_eq!((e.width, e.height), (6, 4));
}

#[test]
fn premultiplied_alpha_is_applied_when_enabled() {
    let px = [200, 100, 50, 128];
    let on = compose_atlas(vec![AtlasSprite::new("p.png", solid(2, 2, px))], &AtlasOptions::default()).expect("compose");
    assert_eq!(on.image.get_pixel(0, 0), &Rgba([100, 50, 25, 128]));

    let opts = AtlasOptions {
        premultiply_alpha: false,
        ..Default::default()
    };
    let off = compose_atlas(vec![AtlasSprite::new("p.png", solid(2, 2, px))], &opts).expect("compose");
    assert_eq!(off.image.get_pixel(0, 0), &Rgba(px));
}

#[test]
fn placement_order_is_area_then_name() {
    let sprites = vec![
        AtlasSprite::new("small.png", solid(4, 4, [255; 4])),
        AtlasSprite::new("b.png", solid(8, 8, [255; 4])),
        AtlasSprite::new("a.png", solid(8, 8, [255; 4])),
    ];
    let atlas = compose_atlas(sprites, &AtlasOptions::default()).expect("compose");
    let names: Vec<&str> = atlas.entries.iter().map(|e| e.sprite_file_name.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.png", "small.png"]);

    let index = AtlasIndex::parse(&atlas.map_text(), Path::new("mem.atlasmap")).expect("parse");
    for (i, e) in atlas.entries.iter().enumerate() {
        assert_eq!(index.index_of(&e.sprite_file_name), Some(i));
    }
}

#[test]
fn overflow_reports_how_many_sprites_fit() {
    let opts = AtlasOptions {
        max_size: 16,
        ..Default::default()
    };
    let sprites = (0..3)
        .map(|i| AtlasSprite::new(format!("s{i}.png"), solid(10, 10, [255; 4])))
        .collect();
    match compose_atlas(sprites, &opts) {
        Err(BuildError::OutOfSpace {
            max_width,
            placed,
            total,
            ..
        }) => {
            assert_eq!(max_width, 16);
            assert_eq!(placed, 1);
            assert_eq!(total, 3);
        }
        Err(e) => panic!("unexpected error {e}"),
        Ok(_) => panic!("expected OutOfSpace"),
    }
}

#[test]
fn placed_boxes_stay_disjoint_and_on_canvas() {
    let sprites = (0..12u32)
        .map(|i| AtlasSprite::new(format!("s{i:02}.png"), solid(3 + i % 5, 2 + i % 4, [255; 4])))
        .collect();
    let atlas = compose_atlas(sprites, &AtlasOptions::default()).expect("compose");
    let canvas = sprite_baker_core::model::Rect::new(0, 0, atlas.width(), atlas.height());
    let boxes: Vec<_> = atlas.rects.iter().map(|r| r.placed_box().expect("placed")).collect();
    for (i, a) in boxes.iter().enumerate() {
        assert!(canvas.contains(a));
        for b in &boxes[i + 1..] {
            assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn names_that_break_the_map_format_are_rejected() {
    for bad in ["a,b.png", "two\nlines.png", "cr\r.png", ""] {
        let err = compose_atlas(vec![AtlasSprite::new(bad, solid(2, 2, [255; 4]))], &AtlasOptions::default())
            .err()
            .expect("rejected");
        assert!(matches!(err, BuildError::InvalidSprite { ref path, .. } if path == Path::new(bad)), "{bad:?}");
        assert_eq!(err.exit_code(), 12);
    }
}
