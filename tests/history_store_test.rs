// 历史存储的去重与容量性质
use std::io::Cursor;

use clipboard_history_core::{
    fingerprint, AppIdentity, CapturedContent, CapturedImage, ContentKind, Fingerprint, HistoryStore,
};
use proptest::prelude::*;

fn text(s: &str) -> CapturedContent {
    CapturedContent::text(s).expect("non-empty text")
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 3, image::Rgba([12, 34, 56, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("encode png");
    out
}

#[test]
fn foo_foo_then_image() {
    let mut store = HistoryStore::new(30);
    assert!(store.insert(text("foo"), AppIdentity::default()));
    assert!(!store.insert(text("foo"), AppIdentity::default()));
    assert_eq!(store.len(), 1);

    let bytes = png_bytes();
    let image = CapturedImage::encoded(bytes.clone()).expect("png");
    assert!(store.insert(CapturedContent::image(image), AppIdentity::default()));
    assert_eq!(store.len(), 2);

    let head = store.head().expect("head");
    assert_eq!(head.kind(), ContentKind::Image);
    assert_eq!(head.fingerprint(), &Fingerprint::of_bytes(&bytes));
    assert_eq!(fingerprint(head.content()), Fingerprint::of_bytes(&bytes));
}

#[test]
fn trailing_whitespace_dedups() {
    let mut store = HistoryStore::new(30);
    assert!(store.insert(text("abc"), AppIdentity::default()));
    assert!(!store.insert(text("abc "), AppIdentity::default()));
    assert_eq!(fingerprint(&text("abc ")), fingerprint(&text("abc")));
}

#[test]
fn same_text_different_source_is_still_duplicate() {
    let mut store = HistoryStore::new(30);
    store.insert(
        text("shared"),
        AppIdentity {
            name: Some("A".to_string()),
            bundle_id: None,
        },
    );
    let inserted = store.insert(
        text("shared"),
        AppIdentity {
            name: Some("B".to_string()),
            bundle_id: None,
        },
    );
    assert!(!inserted);
    assert_eq!(store.head().and_then(|e| e.source_app_name()), Some("A"));
}

proptest! {
    #[test]
    fn length_never_exceeds_capacity(
        max in 1_usize..20,
        inputs in prop::collection::vec("[a-d]{1,2}", 0..80),
    ) {
        let mut store = HistoryStore::new(max);
        for input in &inputs {
            store.insert(text(input), AppIdentity::default());
            prop_assert!(store.len() <= max);
        }
    }

    #[test]
    fn head_is_never_duplicated(inputs in prop::collection::vec("[a-c]", 1..60)) {
        let mut store = HistoryStore::new(100);
        for input in &inputs {
            store.insert(text(input), AppIdentity::default());
        }
        let snapshot = store.snapshot();
        for pair in snapshot.windows(2) {
            prop_assert_ne!(pair[0].fingerprint(), pair[1].fingerprint());
        }
    }

    #[test]
    fn distinct_inserts_keep_newest(max in 1_usize..15, extra in 0_usize..15) {
        let mut store = HistoryStore::new(max);
        let total = max + extra;
        for i in 0..total {
            let label = format!("item-{i}");
            prop_assert!(store.insert(text(&label), AppIdentity::default()));
        }
        let kept: Vec<String> = store
            .snapshot()
            .iter()
            .filter_map(|e| e.content().as_text().map(str::to_string))
            .collect();
        let expected: Vec<String> = (extra..total).rev().map(|i| format!("item-{i}")).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn insert_reports_whether_head_changed(inputs in prop::collection::vec("[xy]", 1..40)) {
        let mut store = HistoryStore::new(50);
        for input in &inputs {
            let before = store.head().map(|e| e.id());
            let inserted = store.insert(text(input), AppIdentity::default());
            let after = store.head().map(|e| e.id());
            prop_assert_eq!(inserted, before != after);
        }
    }
}
