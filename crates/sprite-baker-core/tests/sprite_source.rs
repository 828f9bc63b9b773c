use image::{Rgba, RgbaImage};
use serde_json::Value;
use sprite_baker_core::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Line-based stand-in for a sprite editor format:
/// `frame <w> <h> <ms>` and `tag <name> <from> <to> <repeat> <direction>`.
struct FakeDecoder;

impl SpriteDecoder for FakeDecoder {
    fn extension(&self) -> &str {
        "fakesprite"
    }

    fn decode(&self, path: &Path) -> Result<SpriteSheet, BuildError> {
        let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let stem = path.file_stem().expect("stem").to_string_lossy().into_owned();
        let bad = |line: &str| BuildError::InvalidSprite {
            path: path.to_path_buf(),
            reason: format!("cannot parse '{line}'"),
        };
        let mut sheet = SpriteSheet::default();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["frame", w, h, ms] => {
                    let (w, h): (u32, u32) = (w.parse().map_err(|_| bad(line))?, h.parse().map_err(|_| bad(line))?);
                    let shade = (sheet.frames.len() * 40) as u8;
                    sheet.frames.push(SpriteFrame {
                        name: format!("{stem}_{}", sheet.frames.len()),
                        duration_ms: ms.parse().map_err(|_| bad(line))?,
                        image: RgbaImage::from_pixel(w, h, Rgba([shade, 0, 0, 255])),
                    });
                }
                ["tag", name, from, to, repeat, dir] => sheet.tags.push(SpriteTag {
                    name: name.to_string(),
                    from: from.parse().map_err(|_| bad(line))?,
                    to: to.parse().map_err(|_| bad(line))?,
                    repeat: repeat.parse().map_err(|_| bad(line))?,
                    direction: match *dir {
                        "reverse" => LoopDirection::Reverse,
                        "pingpong" => LoopDirection::PingPong,
                        "pingpong_reverse" => LoopDirection::PingPongReverse,
                        _ => LoopDirection::Forward,
                    },
                }),
                _ => return Err(bad(line)),
            }
        }
        Ok(sheet)
    }
}

const KNIGHT: &str = "frame 8 8 100\nframe 8 8 120\nframe 12 8 200\ntag walk 0 1 0 forward\ntag attack 2 2 1 pingpong\n";

fn write_file(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, text).expect("write");
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json")
}

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

fn set_mtime(path: &Path, secs: u64) {
    let f = fs::File::options().write(true).open(path).expect("open");
    f.set_modified(at(secs)).expect("set mtime");
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).expect("metadata").modified().expect("mtime")
}

fn party_group(src: &Path) {
    write_file(&src.join("textures/party/party.makeatlas"), "");
    RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]))
        .save(src.join("textures/party/shield.png"))
        .expect("save png");
    write_file(&src.join("textures/party/mage.fakesprite"), "frame 6 6 90\nframe 6 6 90\n");
}

fn builder(src: &Path, dst: &Path) -> ContentBuilder {
    let cfg = BuildConfig::builder().source_dir(src).target_dir(dst).build();
    let decoders: Vec<Arc<dyn SpriteDecoder>> = vec![Arc::new(FakeDecoder)];
    ContentBuilder::with_decoders(cfg, decoders)
}

#[test]
fn each_tag_becomes_an_animation() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    write_file(&src.join("textures/chars/knight.fakesprite"), KNIGHT);

    let mut b = builder(&src, &dst);
    let report = b.build().expect("build");
    assert_eq!(report.tally("spritesource").rebuilt, 1);

    let index = AtlasIndex::load(&dst.join("textures/chars/knight.atlasmap")).expect("private map");
    assert_eq!(index.len(), 3);
    assert!(dst.join("textures/chars/knight.png").is_file());
    assert!(!dst.join("textures/chars/knight.fakesprite").exists());

    let walk = read_json(&dst.join("textures/chars/walk.spriteanim"));
    assert_eq!(walk["name"], "walk");
    assert_eq!(walk["loop"], true);
    assert_eq!(walk["pingPong"], false);
    assert_eq!(walk["reverse"], false);
    assert_eq!(walk["atlas"], "textures/chars/knight");
    assert_eq!(walk["frames"][0]["name"], index.index_of("knight_0").expect("k0") as u64);
    assert_eq!(walk["frames"][1]["name"], index.index_of("knight_1").expect("k1") as u64);
    assert_eq!(walk["frames"][1]["duration"], 120);

    let attack = read_json(&dst.join("textures/chars/attack.spriteanim"));
    assert_eq!(attack["loop"], false);
    assert_eq!(attack["pingPong"], true);
    assert_eq!(attack["frames"].as_array().expect("frames").len(), 1);

    let again = b.build().expect("second build");
    assert_eq!(again.tally("spritesource"), HandlerTally { rebuilt: 0, up_to_date: 1 });
    assert_eq!(again.removed, 0);
}

#[test]
fn sources_inside_a_group_share_the_group_atlas() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    party_group(&src);

    builder(&src, &dst).build().expect("build");

    let index = AtlasIndex::load(&dst.join("textures/party/party.atlasmap")).expect("group map");
    let mut names = index.names().to_vec();
    names.sort();
    assert_eq!(names, vec!["mage_0", "mage_1", "shield.png"]);
    assert!(!dst.join("textures/party/mage.png").exists());

    // untagged file: one looping animation named after the file
    let anim = read_json(&dst.join("textures/party/mage.spriteanim"));
    assert_eq!(anim["name"], "mage");
    assert_eq!(anim["loop"], true);
    assert_eq!(anim["atlas"], "textures/party/party");
    assert_eq!(anim["frames"][1]["name"], index.index_of("mage_1").expect("m1") as u64);
}

#[test]
fn tag_outside_the_frame_list_is_rejected() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    write_file(&src.join("textures/chars/broken.fakesprite"), "frame 4 4 10\ntag run 0 3 0 forward\n");

    let err = builder(&src, &dst).build().unwrap_err();
    assert!(matches!(err, BuildError::InvalidSprite { .. }));
    assert_eq!(err.exit_code(), 12);
}

#[test]
fn loop_flags_follow_repeat_and_direction() {
    let tag = |repeat, direction| SpriteTag {
        name: "t".into(),
        from: 0,
        to: 0,
        repeat,
        direction,
    };
    assert!(tag(0, LoopDirection::Forward).is_looping());
    assert!(!tag(1, LoopDirection::Forward).is_looping());
    assert!(tag(3, LoopDirection::Forward).is_looping());
    assert!(LoopDirection::PingPongReverse.is_ping_pong());
    assert!(LoopDirection::PingPongReverse.is_reversed());
    assert!(!LoopDirection::PingPong.is_reversed());
}

#[test]
fn newer_source_regenerates_its_animations() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    let knight = src.join("textures/chars/knight.fakesprite");
    write_file(&knight, KNIGHT);
    let mut b = builder(&src, &dst);
    b.build().expect("first build");

    let out = dst.join("textures/chars");
    set_mtime(&knight, 1_000_000);
    set_mtime(&out.join("knight.png"), 2_000_000);
    set_mtime(&out.join("knight.atlasmap"), 2_000_000);
    set_mtime(&out.join("walk.spriteanim"), 3_000_000);
    set_mtime(&out.join("attack.spriteanim"), 3_000_000);
    let quiet = b.build().expect("settled build");
    assert_eq!(quiet.tally("spritesource"), HandlerTally { rebuilt: 0, up_to_date: 1 });

    set_mtime(&knight, 2_500_000);
    let report = b.build().expect("rebuild");
    assert_eq!(report.tally("spritesource").rebuilt, 1);
    assert!(mtime(&out.join("knight.atlasmap")) > at(3_000_000));
    assert!(mtime(&out.join("walk.spriteanim")) > at(3_000_000));
    assert!(mtime(&out.join("attack.spriteanim")) > at(3_000_000));
}

#[test]
fn rebuilt_group_atlas_regenerates_source_animations() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    party_group(&src);
    let mut b = builder(&src, &dst);
    b.build().expect("first build");

    let (party_src, party_dst) = (src.join("textures/party"), dst.join("textures/party"));
    for p in ["party.makeatlas", "shield.png", "mage.fakesprite"] {
        set_mtime(&party_src.join(p), 1_000_000);
    }
    set_mtime(&party_dst.join("party.png"), 2_000_000);
    set_mtime(&party_dst.join("party.atlasmap"), 2_000_000);
    set_mtime(&party_dst.join("mage.spriteanim"), 3_000_000);
    let quiet = b.build().expect("settled build");
    assert_eq!(quiet.total_rebuilt(), 0);

    // only the loose image changed; the sprite file itself is older than its animation
    set_mtime(&party_src.join("shield.png"), 4_000_000);
    let report = b.build().expect("rebuild");
    assert_eq!(report.tally("makeatlas").rebuilt, 1);
    assert_eq!(report.tally("spritesource").rebuilt, 1);
    assert!(mtime(&party_dst.join("mage.spriteanim")) > at(3_000_000));
}

#[test]
fn untagged_source_next_to_a_same_named_descriptor_is_a_conflict() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    party_group(&src);
    write_file(
        &src.join("textures/party/mage.spriteanim"),
        r#"{ "frames": [ { "name": "mage_0", "duration": 90 } ] }"#,
    );

    let err = builder(&src, &dst).build().unwrap_err();
    assert!(matches!(err, BuildError::OutputConflict { ref path, .. } if path.ends_with("textures/party/mage.spriteanim")));
    assert_eq!(err.exit_code(), 13);
}

#[test]
fn two_sources_with_the_same_tag_are_a_conflict() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("out"));
    write_file(&src.join("textures/chars/knight.fakesprite"), KNIGHT);
    write_file(&src.join("textures/chars/squire.fakesprite"), "frame 8 8 100\ntag walk 0 0 0 forward\n");

    let err = builder(&src, &dst).build().unwrap_err();
    assert!(matches!(err, BuildError::OutputConflict { ref path, .. } if path.ends_with("textures/chars/walk.spriteanim")));
}
