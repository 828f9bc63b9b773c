use rand::{Rng, SeedableRng, rngs::StdRng};
use sprite_baker_core::error::BuildError;
use sprite_baker_core::model::Rect;
use sprite_baker_core::packer::SpaceAllocator;
use sprite_baker_core::packer::free_list::FreeListAllocator;

#[test]
fn random_placements_are_disjoint_and_in_bounds() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut sizes: Vec<(u32, u32)> = (0..120)
        .map(|_| (rng.gen_range(1..=40), rng.gen_range(1..=40)))
        .collect();
    sizes.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

    let mut alloc = FreeListAllocator::new(1024, 1024).expect("alloc");
    let mut placed: Vec<Rect> = Vec::new();
    for (w, h) in sizes {
        let (x, y) = alloc.pack(w, h).expect("fits");
        placed.push(Rect::new(x, y, w, h));
    }

    let (used_w, used_h) = alloc.used_extent();
    let canvas = Rect::new(0, 0, 1024, 1024);
    for (i, a) in placed.iter().enumerate() {
        assert!(canvas.contains(a), "{:?} outside canvas", a);
        assert!(a.right() <= used_w && a.bottom() <= used_h);
        for b in &placed[i + 1..] {
            assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
        }
    }
}

#[test]
fn four_quadrants_fill_the_canvas_exactly() {
    let mut alloc = FreeListAllocator::new(64, 64).expect("alloc");
    let got: Vec<(u32, u32)> = (0..4).map(|_| alloc.pack(32, 32).expect("fits")).collect();
    assert_eq!(got, vec![(0, 0), (32, 0), (0, 32), (32, 32)]);
    assert_eq!(alloc.used_extent(), (64, 64));
    assert!(alloc.free_rects().is_empty());

    match alloc.pack(1, 1) {
        Err(BuildError::OutOfSpace { placed, total, .. }) => {
            assert_eq!(placed, 4);
            assert_eq!(total, 5);
        }
        other => panic!("expected OutOfSpace, got {:?}", other),
    }
}

#[test]
fn split_keeps_right_bottom_and_corner_pieces() {
    let mut alloc = FreeListAllocator::new(64, 32).expect("alloc");
    assert_eq!(alloc.pack(20, 10).expect("fits"), (0, 0));
    assert_eq!(
        alloc.free_rects(),
        &[
            Rect::new(20, 0, 44, 10),
            Rect::new(0, 10, 20, 22),
            Rect::new(20, 10, 44, 22),
        ]
    );
    assert_eq!(alloc.capacity(), (64, 32));
}

#[test]
fn oversized_request_is_an_error_not_a_clip() {
    let mut alloc = FreeListAllocator::new(32, 32).expect("alloc");
    assert!(matches!(alloc.pack(33, 8), Err(BuildError::OutOfSpace { .. })));
    assert_eq!(alloc.used_extent(), (0, 0));
}

#[test]
fn non_power_of_two_bounds_are_rejected() {
    assert!(matches!(
        FreeListAllocator::new(100, 64),
        Err(BuildError::InvalidConfig(_))
    ));
    assert!(FreeListAllocator::new(0, 64).is_err());
}
