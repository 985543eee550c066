//! End-to-end probe tests against a fake probing executable.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tonearm_av::{extract_all_metadata, Error};

/// Emits one report block per existing file argument, in the probing
/// executable's human-readable shape. `.txt` inputs get a block with no
/// recognizable tags.
const FAKE_PROBE: &str = r#"#!/bin/sh
i=0
for a in "$@"; do
  [ -f "$a" ] || continue
  case "$a" in
    *.txt)
      echo "Input #$i, unknown, from '$a':"
      echo "  no recognizable streams"
      ;;
    *)
      echo "Input #$i, mp3, from '$a':"
      echo "  Metadata:"
      echo "    title           : Title $i"
      echo "    artist          : Fake Artist"
      echo "    album           : Fake Album"
      echo "    track           : 2/9"
      echo "    date            : 1969"
      echo "  Duration: 00:03:21.00, start: 0.000000, bitrate: 192 kb/s"
      ;;
  esac
  i=$((i+1))
done
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn extracts_metadata_for_a_batch() {
    let dir = tempfile::tempdir().unwrap();
    let one = dir.path().join("one.mp3");
    fs::write(&one, b"x").unwrap();
    let two = dir.path().join("two.flac");
    fs::write(&two, vec![0u8; 10]).unwrap();
    let probe = write_script(dir.path(), "fakeprobe", FAKE_PROBE);

    let template = format!("{} -i %s -f ffmetadata", probe.display());
    let mds = extract_all_metadata(&template, &[one.clone(), two.clone()])
        .await
        .unwrap();

    assert_eq!(mds.len(), 2);
    let md = &mds[&one];
    assert_eq!(md.title(), "Title 0");
    assert_eq!(md.artist(), "Fake Artist");
    assert_eq!(md.album(), "Fake Album");
    assert_eq!(md.track_number(), (2, 9));
    assert_eq!(md.year(), 1969);
    assert_eq!(md.duration(), 201);
    assert_eq!(md.bit_rate(), 192);
    assert_eq!(md.size(), 1);
    assert_eq!(md.suffix(), "mp3");
    assert_eq!(mds[&two].suffix(), "flac");
    assert_eq!(mds[&two].size(), 10);
}

#[tokio::test]
async fn probing_is_idempotent_for_unchanged_files() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("song.mp3");
    fs::write(&track, b"audio").unwrap();
    let probe = write_script(dir.path(), "fakeprobe", FAKE_PROBE);

    let template = format!("{} -i %s -f ffmetadata", probe.display());
    let batch = vec![track];
    let first = extract_all_metadata(&template, &batch).await.unwrap();
    let second = extract_all_metadata(&template, &batch).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn non_media_files_are_dropped_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("song.mp3");
    fs::write(&track, b"audio").unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, b"not audio").unwrap();
    let probe = write_script(dir.path(), "fakeprobe", FAKE_PROBE);

    let template = format!("{} -i %s -f ffmetadata", probe.display());
    let mds = extract_all_metadata(&template, &[track.clone(), notes.clone()])
        .await
        .unwrap();

    assert!(mds.contains_key(&track));
    assert!(!mds.contains_key(&notes));
}

#[tokio::test]
async fn unstattable_files_are_dropped_without_error() {
    // This probe reports on every argument, even ones that no longer exist
    // on disk.
    const BLIND_PROBE: &str = r#"#!/bin/sh
i=0
for a in "$@"; do
  case "$a" in
    -*) continue ;;
  esac
  echo "Input #$i, mp3, from '$a':"
  echo "    title           : Ghost"
  i=$((i+1))
done
"#;

    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("song.mp3");
    fs::write(&track, b"audio").unwrap();
    let gone = dir.path().join("deleted.mp3");
    let probe = write_script(dir.path(), "blindprobe", BLIND_PROBE);

    let template = format!("{} -i %s", probe.display());
    let mds = extract_all_metadata(&template, &[track.clone(), gone.clone()])
        .await
        .unwrap();

    assert!(mds.contains_key(&track));
    assert!(!mds.contains_key(&gone));
}

#[tokio::test]
async fn empty_output_is_a_probe_failure() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("song.mp3");
    fs::write(&track, b"audio").unwrap();
    let probe = write_script(dir.path(), "mute", "#!/bin/sh\nexit 1\n");

    let template = format!("{} -i %s", probe.display());
    let err = extract_all_metadata(&template, &[track]).await.unwrap_err();
    assert!(matches!(err, Error::ProbeFailed));
}

#[tokio::test]
async fn missing_executable_is_reported() {
    let err = extract_all_metadata(
        "/nonexistent/prober -i %s",
        &[PathBuf::from("/tmp/whatever.mp3")],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::ToolNotFound { .. }));
}

#[tokio::test]
async fn cancelled_probe_kills_the_subprocess() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("probe.pid");
    let probe = write_script(
        dir.path(),
        "slowprobe",
        "#!/bin/sh\necho $$ > \"$1\"\nsleep 30\n",
    );
    let track = dir.path().join("song.mp3");
    fs::write(&track, b"audio").unwrap();

    let template = format!("{} {} %s", probe.display(), pid_file.display());
    let result = tokio::time::timeout(
        Duration::from_millis(300),
        extract_all_metadata(&template, &[track]),
    )
    .await;
    assert!(result.is_err(), "probe should have been cancelled");

    let pid: u32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    for _ in 0..50 {
        if process_gone(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("probing subprocess {pid} still running after cancellation");
}

/// Dead or zombie both count as gone; a zombie is just waiting on its reap.
fn process_gone(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat.split_whitespace().nth(2) == Some("Z"),
        Err(_) => true,
    }
}
