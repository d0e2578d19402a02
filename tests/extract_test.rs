// 快照提取的优先级场景
use std::io::Cursor;

use clipboard_history_core::extract::{extract, strip_html, strip_rtf};
use clipboard_history_core::{ClipboardFormat, ClipboardSnapshot, ContentKind, ImageFormat};

fn tiff_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(5, 5, image::Rgba([0, 128, 255, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Tiff)
        .expect("encode tiff");
    out
}

#[test]
fn rich_and_plain_text_yield_plain() {
    let snapshot = ClipboardSnapshot::new()
        .with_text(ClipboardFormat::Rtf, r"{\rtf1\ansi{\b Hi}}")
        .with_text(ClipboardFormat::Html, "<b>Hi</b>")
        .with_text(ClipboardFormat::PlainText, "Hi");
    let content = extract(&snapshot).expect("content");
    assert_eq!(content.kind(), ContentKind::Text);
    assert_eq!(content.as_text(), Some("Hi"));
}

#[test]
fn image_wins_over_rendered_text() {
    let snapshot = ClipboardSnapshot::new()
        .with_text(ClipboardFormat::PlainText, "Hi")
        .with_text(ClipboardFormat::Html, "<img src=\"x\">Hi")
        .with_data(ClipboardFormat::Bitmap, tiff_bytes());
    let content = extract(&snapshot).expect("content");
    let image = content.as_image().expect("image");
    assert_eq!(image.format(), ImageFormat::Tiff);
    assert_eq!((image.width(), image.height()), (5, 5));
}

#[test]
fn html_with_office_markup() {
    let html = "Version:0.9\r\nStartHTML:0000000105\r\n<html><head><style>td{}</style></head>\
                <body><table><tr><td>a&nbsp;1</td></tr><tr><td>b</td></tr></table></body></html>";
    let snapshot = ClipboardSnapshot::new().with_text(ClipboardFormat::Html, html);
    assert_eq!(extract(&snapshot).expect("content").as_text(), Some("a 1\nb"));
}

#[test]
fn rtf_paragraphs_become_lines() {
    let text = strip_rtf(r"{\rtf1\ansi\deff0{\fonttbl{\f0 Arial;}}\f0 one\par two\tab three}");
    assert_eq!(text, "one\ntwo\tthree");
}

#[test]
fn html_and_rtf_strip_to_same_text() {
    assert_eq!(strip_html("<p>same</p>").trim(), strip_rtf(r"{\rtf1 same}"));
}
