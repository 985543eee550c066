//! Integration tests for the streaming routes.

mod common;

use common::{write_script, TestHarness};
use tonearm::config::Config;

fn sample_data(len: usize) -> Vec<u8> {
    (0..=255u8).cycle().take(len).collect()
}

#[tokio::test]
async fn raw_stream_serves_full_file() {
    let (h, addr) = TestHarness::with_server(Config::default()).await;
    let data = sample_data(2048);
    let track = h.add_track("song.mp3", &data, 320);

    let resp = reqwest::get(format!("http://{addr}/rest/stream?id={}", track.id))
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let headers = resp.headers().clone();
    assert_eq!(headers.get("content-type").unwrap(), "audio/mpeg");
    assert_eq!(headers.get("accept-ranges").unwrap(), "bytes");
    assert_eq!(headers.get("x-content-duration").unwrap(), "180");
    assert!(headers.get("last-modified").is_some());
    assert_eq!(resp.bytes().await.unwrap(), data);
}

#[tokio::test]
async fn raw_stream_serves_byte_ranges() {
    let (h, addr) = TestHarness::with_server(Config::default()).await;
    let data = sample_data(2048);
    let track = h.add_track("song.mp3", &data, 320);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/rest/stream?id={}", track.id))
        .header("Range", "bytes=100-199")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("content-range").unwrap(),
        "bytes 100-199/2048"
    );
    assert_eq!(resp.headers().get("content-length").unwrap(), "100");
    assert_eq!(resp.bytes().await.unwrap(), &data[100..200]);
}

#[tokio::test]
async fn ceiling_at_or_above_source_bitrate_stays_raw() {
    let (h, addr) = TestHarness::with_server(Config::default()).await;
    let data = sample_data(512);
    let track = h.add_track("song.mp3", &data, 320);

    let resp = reqwest::get(format!(
        "http://{addr}/rest/stream?id={}&maxBitRate=1024&format=mp3",
        track.id
    ))
    .await
    .unwrap();

    assert_eq!(resp.status(), 200);
    // Raw delivery keeps range support.
    assert_eq!(resp.headers().get("accept-ranges").unwrap(), "bytes");
    assert_eq!(resp.bytes().await.unwrap(), data);
}

#[tokio::test]
async fn transcoded_stream_pipes_encoder_output() {
    let tools = tempfile::tempdir().unwrap();
    let encoder = write_script(
        tools.path(),
        "encoder",
        "#!/bin/sh\nprintf 'TRANSCODEDAUDIO'\n",
    );

    let mut config = Config::default();
    config.transcoding.downsampling_enabled = true;
    config.transcoding.transcode_command =
        format!("{} -i %s -b:a %bk -f mp3 -", encoder.display());

    let (h, addr) = TestHarness::with_server(config).await;
    let track = h.add_track("song.flac", &sample_data(4096), 900);

    let resp = reqwest::get(format!(
        "http://{addr}/rest/stream?id={}&maxBitRate=128&format=flac",
        track.id
    ))
    .await
    .unwrap();

    assert_eq!(resp.status(), 200);
    // Content type is the configured output format, not the source's, and
    // a sequential pipe cannot honor ranges.
    assert_eq!(resp.headers().get("content-type").unwrap(), "audio/mpeg");
    assert!(resp.headers().get("accept-ranges").is_none());
    assert_eq!(resp.bytes().await.unwrap(), &b"TRANSCODEDAUDIO"[..]);
}

#[tokio::test]
async fn transcode_request_with_downsampling_disabled_is_rejected() {
    let (h, addr) = TestHarness::with_server(Config::default()).await;
    let track = h.add_track("song.mp3", &sample_data(512), 320);

    let resp = reqwest::get(format!(
        "http://{addr}/rest/stream?id={}&maxBitRate=64&format=mp3",
        track.id
    ))
    .await
    .unwrap();

    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn unknown_track_is_404() {
    let (_h, addr) = TestHarness::with_server(Config::default()).await;

    let resp = reqwest::get(format!("http://{addr}/rest/stream?id=doesnotexist"))
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn download_serves_the_original_as_attachment() {
    let (h, addr) = TestHarness::with_server(Config::default()).await;
    let data = sample_data(1024);
    let track = h.add_track("keeper.flac", &data, 900);

    let resp = reqwest::get(format!("http://{addr}/rest/download?id={}", track.id))
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "audio/flac");
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("keeper.flac"));
    assert_eq!(resp.bytes().await.unwrap(), data);
}

#[tokio::test]
async fn list_tracks_returns_the_catalog() {
    let (h, addr) = TestHarness::with_server(Config::default()).await;
    let track = h.add_track("song.mp3", &sample_data(256), 192);

    let body: serde_json::Value =
        reqwest::get(format!("http://{addr}/rest/tracks"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

    let tracks = body["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0]["id"], track.id.as_str());
    assert_eq!(tracks[0]["title"], "song.mp3");
    assert_eq!(tracks[0]["bitRate"], 192);
}
