//! Integration tests for on-demand transforms over HTTP.

mod common;

use common::{png_bytes, TestHarness};
use mama::transform::{imaging, ImageFormat};
use std::net::SocketAddr;

async fn get_t(addr: SocketAddr, path: &str, t: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("http://{addr}/-/{path}"))
        .query(&[("t", t)])
        .send()
        .await
        .unwrap()
}

async fn get_plain(addr: SocketAddr, path: &str) -> reqwest::Response {
    reqwest::get(format!("http://{addr}/-/{path}")).await.unwrap()
}

fn content_type(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn plain_read_serves_file() {
    let (h, addr) = TestHarness::with_server().await;
    let png = png_bytes(40, 20);
    h.write("pics/a.png", &png);

    let resp = get_plain(addr, "pics/a.png").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "image/png");
    assert!(resp.headers().get("last-modified").is_some());
    assert_eq!(resp.bytes().await.unwrap().to_vec(), png);
    assert!(h.cache_entries().is_empty());
}

#[tokio::test]
async fn resize_to_jpeg() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("a.png", &png_bytes(400, 200));

    let resp = get_t(addr, "a.png", "op=resize,w=100,h=100,fmt=jpg,q=80").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "image/jpeg");

    let body = resp.bytes().await.unwrap();
    assert_eq!(image::guess_format(&body).unwrap(), image::ImageFormat::Jpeg);
    assert_eq!(dimensions(&body), (100, 50));
    assert_eq!(h.cache_entries().len(), 1);
}

#[tokio::test]
async fn format_defaults_to_source_type() {
    let (h, addr) = TestHarness::with_server().await;
    let gif = common::encode(&common::solid(60, 60), image::ImageFormat::Gif);
    h.write("anim.gif", &gif);

    let body = get_t(addr, "anim.gif", "op=thumbnail,w=30,h=30")
        .await
        .bytes()
        .await
        .unwrap();
    assert_eq!(image::guess_format(&body).unwrap(), image::ImageFormat::Gif);
    assert_eq!(dimensions(&body), (30, 30));
}

#[tokio::test]
async fn pipeline_feeds_each_stage() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("a.png", &png_bytes(400, 200));

    let t = "op=resize,w=200,fmt=png|op=thumbnail,w=20,h=20,fmt=jpeg";
    let resp = get_t(addr, "a.png", t).await;
    assert_eq!(resp.status(), 200);

    let body = resp.bytes().await.unwrap();
    // The last stage decides the output format.
    assert_eq!(image::guess_format(&body).unwrap(), image::ImageFormat::Jpeg);
    assert_eq!(dimensions(&body), (20, 20));
}

#[tokio::test]
async fn unsupported_format_falls_back_to_source() {
    let (h, addr) = TestHarness::with_server().await;
    let png = png_bytes(50, 50);
    h.write("a.png", &png);

    let plain = get_plain(addr, "a.png").await;
    let plain_type = content_type(&plain);
    let plain_body = plain.bytes().await.unwrap();

    let resp = get_t(addr, "a.png", "op=resize,w=10,fmt=webp").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), plain_type);
    assert_eq!(resp.bytes().await.unwrap(), plain_body);
    assert!(h.cache_entries().is_empty());
}

#[tokio::test]
async fn undecodable_source_falls_back() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("notes.txt", b"just some text");

    let resp = get_t(addr, "notes.txt", "op=resize,w=10,fmt=png").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"just some text");
    assert!(h.cache_entries().is_empty());
}

#[tokio::test]
async fn larger_target_only_reencodes() {
    let (h, addr) = TestHarness::with_server().await;
    let png = png_bytes(40, 30);
    h.write("small.png", &png);

    let resp = get_t(addr, "small.png", "op=resize,w=1000,h=1000,fmt=png,q=95").await;
    let body = resp.bytes().await.unwrap();

    let expected = imaging::encode(&imaging::decode(&png).unwrap(), ImageFormat::Png, 95).unwrap();
    assert_eq!(body.to_vec(), expected);
    assert_eq!(dimensions(&body), (40, 30));
}

#[tokio::test]
async fn second_request_served_from_cache() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("a.png", &png_bytes(100, 100));
    let t = "op=resize,w=10,fmt=png";

    let first = get_t(addr, "a.png", t).await.bytes().await.unwrap();
    let entries = h.cache_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(dimensions(&first), (10, 10));

    // Replace the artifact; a cache hit must return it untouched.
    let artifact = h.ctx.transformer.cache().path_for(&entries[0]);
    std::fs::write(&artifact, b"sentinel artifact").unwrap();

    let second = get_t(addr, "a.png", t).await.bytes().await.unwrap();
    assert_eq!(second.as_ref(), b"sentinel artifact");
}

#[tokio::test]
async fn force_recomputes_and_overwrites() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("a.png", &png_bytes(100, 100));

    get_t(addr, "a.png", "op=resize,w=10,fmt=png").await;
    let entries = h.cache_entries();
    let artifact = h.ctx.transformer.cache().path_for(&entries[0]);
    std::fs::write(&artifact, b"stale").unwrap();

    let forced = get_t(addr, "a.png", "op=resize,w=10,fmt=png,force=1")
        .await
        .bytes()
        .await
        .unwrap();
    assert_eq!(dimensions(&forced), (10, 10));
    assert_eq!(std::fs::read(&artifact).unwrap(), forced.to_vec());
    assert_eq!(h.cache_entries(), entries);
}

#[tokio::test]
async fn equivalent_queries_share_one_artifact() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("a.png", &png_bytes(100, 100));

    get_t(addr, "a.png", "op=resize,w=10,h=10,q=70,fmt=jpeg").await;
    get_t(addr, "a.png", "fmt=jpg,q=70,h=10,w=10,op=resize").await;
    assert_eq!(h.cache_entries().len(), 1);

    get_t(addr, "a.png", "op=resize,w=11,h=10,q=70,fmt=jpeg").await;
    assert_eq!(h.cache_entries().len(), 2);
}

#[tokio::test]
async fn unknown_ops_serve_original() {
    let (h, addr) = TestHarness::with_server().await;
    let png = png_bytes(20, 20);
    h.write("a.png", &png);

    let resp = get_t(addr, "a.png", "op=sharpen,w=10").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().to_vec(), png);
    assert!(h.cache_entries().is_empty());
}

#[tokio::test]
async fn snapshot_extracts_requested_frame() {
    let (h, addr) = TestHarness::with_server().await;
    let video = h.write("clips/clip.mp4", b"not really a video");

    let resp = get_t(addr, "clips/clip.mp4", "op=snapshot,framenum=5,fmt=jpeg").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "image/jpeg");
    assert_eq!(dimensions(&resp.bytes().await.unwrap()), (32, 16));

    let calls = h.frames.calls.lock().clone();
    assert_eq!(calls, vec![(video, 5)]);
}

#[tokio::test]
async fn snapshot_then_resize() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("clip.mp4", b"not really a video");

    let body = get_t(addr, "clip.mp4", "op=snapshot|op=resize,w=16,fmt=png")
        .await
        .bytes()
        .await
        .unwrap();
    assert_eq!(image::guess_format(&body).unwrap(), image::ImageFormat::Png);
    assert_eq!(dimensions(&body), (16, 8));

    // Frame numbers below one are raised to the first frame.
    assert_eq!(h.frames.calls.lock()[0].1, 1);
}

#[tokio::test]
async fn transform_of_missing_file_is_404() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = get_t(addr, "missing.png", "op=resize,w=10").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn range_request_on_plain_read() {
    let (h, addr) = TestHarness::with_server().await;
    h.write("text.txt", b"0123456789");

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/-/text.txt"))
        .header("range", "bytes=2-5")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("content-range").unwrap(),
        "bytes 2-5/10"
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"2345");
}
