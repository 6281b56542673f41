//! Runs a full job against a real ffmpeg binary.
//!
//! `cargo test -- --ignored` with ffmpeg (built with drawtext) on the PATH.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use video_composer::infrastructure::encoder::ffmpeg::FfmpegEncoder;
use video_composer::infrastructure::storage::artifacts::ArtifactStore;
use video_composer::modules::jobs::model::{JobIdAllocator, JobRequest};
use video_composer::modules::jobs::pipeline::Pipeline;
use video_composer::modules::templates::model::TemplateRole;

fn synth_clip(path: &Path, colour: &str) {
    let video = format!("color=c={colour}:s=320x240:r=25:d=1");
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(["-f", "lavfi", "-i", video.as_str()])
        .args(["-f", "lavfi", "-i", "sine=frequency=440:duration=1"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-shortest"])
        .arg(path)
        .status()
        .expect("ffmpeg must be installed for this test");
    assert!(status.success(), "could not synthesise {}", path.display());
}

fn staged(store: &ArtifactStore, colour: &str) -> PathBuf {
    let path = store.allocate_upload_path(&format!("{colour}.mp4"));
    synth_clip(&path, colour);
    path
}

#[tokio::test]
#[ignore = "needs ffmpeg on PATH"]
async fn composes_intro_main_and_outro_with_ffmpeg() {
    let root = TempDir::new().unwrap();
    let store = ArtifactStore::new(
        &root.path().join("uploads"),
        &root.path().join("output"),
        &root.path().join("templates"),
    );
    store.ensure_directories().await.unwrap();

    for (role, colour) in [(TemplateRole::Intro, "blue"), (TemplateRole::Outro, "red")] {
        let clip = staged(&store, colour);
        store.store_template(role, &clip).await.unwrap();
    }

    let encoder = FfmpegEncoder::new("ffmpeg", Duration::from_secs(120));
    let pipeline = Pipeline::new(&store, &encoder);
    let request = JobRequest {
        customer_name: "Jane O'Doe: 100% [VIP]".to_string(),
        main_video: Some(staged(&store, "green")),
    };

    let success = pipeline
        .run(JobIdAllocator::new().allocate(), request)
        .await
        .unwrap();

    let output = store.output_dir().join(&success.output_reference);
    assert!(std::fs::metadata(&output).unwrap().len() > 0);
    assert_eq!(
        store.list_final_artifacts().await.unwrap(),
        [success.output_reference.clone()]
    );
    assert!(std::fs::read_dir(store.uploads_dir()).unwrap().next().is_none());
}
