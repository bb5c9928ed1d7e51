//! End-to-end integration tests for promo-report.
//!
//! The live tests read photographs from `./test_cases/` (any `.jpg`, `.jpeg`,
//! `.png` or `.webp`) and make real LLM API calls. They are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_analyze_text -- --nocapture

use promo_report::{
    analyze_text, generate_report, generate_report_to_archive, NoopProgressCallback,
    ReportConfig, ReportError, ReportProgressCallback,
};
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Photographs in `test_cases/`, sorted by name.
fn test_photos() -> Vec<PathBuf> {
    let mut photos: Vec<PathBuf> = std::fs::read_dir(test_cases_dir())
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .map(|e| {
                            matches!(
                                e.to_ascii_lowercase().as_str(),
                                "jpg" | "jpeg" | "png" | "webp"
                            )
                        })
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();
    photos.sort();
    photos
}

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// Skip this test unless E2E_ENABLED is set *and* `test_cases/` holds photos.
macro_rules! e2e_skip_unless_photos {
    () => {{
        e2e_skip_unless_enabled!();
        let photos = test_photos();
        if photos.is_empty() {
            println!("SKIP: no photographs in {}", test_cases_dir().display());
            return;
        }
        photos
    }};
}

/// Assert the analysis markdown passes basic quality checks.
fn assert_analysis_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] Analysis is empty");
    assert!(
        md.ends_with('\n'),
        "[{context}] Analysis must end with a newline"
    );

    let first_line = md.lines().next().unwrap_or("");
    assert!(
        !first_line.starts_with("```"),
        "[{context}] Output must not start with a code fence, got: {first_line:?}"
    );
    assert!(
        !md.contains("\n\n\n\n"),
        "[{context}] Output has more than 3 consecutive blank lines"
    );
    for ch in ['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'] {
        assert!(
            !md.contains(ch),
            "[{context}] Output contains invisible char U+{:04X}",
            ch as u32
        );
    }
    assert!(
        md.lines().any(|l| l.starts_with('#')),
        "[{context}] Expected at least one heading (#)"
    );

    println!("[{context}] ✓  {} bytes, quality checks passed", md.len());
}

const SAMPLE_OCR_TEXT: &str = "\
## Photo 1: dior.jpg

DIOR SAUVAGE
-20% on all 100ml
Valid until 31/10

## Photo 2: chanel.jpg

CHANEL N°5
Buy 2, get a free travel spray
Members only

## Photo 3: guerlain.jpg

GUERLAIN
Free gift wrapping + sample set for any purchase over 80€
";

// ── Input errors (no LLM, always run) ────────────────────────────────────────

#[tokio::test]
async fn test_report_rejects_non_image() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.jpg");
    std::fs::write(&notes, "not a photo").unwrap();

    let config = ReportConfig::default();
    let err = generate_report(&[&notes], &config).await.unwrap_err();
    assert!(matches!(err, ReportError::NotAnImage { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_report_missing_file() {
    let config = ReportConfig::default();
    let err = generate_report(&["/definitely/not/a/real/photo.jpg"], &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::FileNotFound { .. }));
}

#[tokio::test]
async fn test_analyze_blank_text() {
    let err = analyze_text("  \n\t", &ReportConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::NoText));
}

// ── Callback API unit tests (no LLM calls, always run) ───────────────────────

#[tokio::test]
async fn test_callback_send_in_tokio_spawn() {
    struct ErrorCounter(AtomicUsize);

    impl ReportProgressCallback for ErrorCounter {
        fn on_image_error(&self, _image_num: usize, _total: usize, _error: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counter = Arc::new(ErrorCounter(AtomicUsize::new(0)));
    let cb: Arc<dyn ReportProgressCallback> =
        Arc::clone(&counter) as Arc<dyn ReportProgressCallback>;

    tokio::spawn(async move {
        cb.on_report_start(2);
        cb.on_image_error(1, 2, "timeout");
    })
    .await
    .unwrap();

    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();

    let cb: Arc<dyn ReportProgressCallback> = Arc::new(NoopProgressCallback);
    let config = ReportConfig::builder()
        .progress_callback(cb)
        .build()
        .expect("valid config");
    assert!(config.progress_callback.is_some());
}

// ── Live tests (need an LLM API key) ─────────────────────────────────────────

/// Analysis only: canned transcripts in, markdown + docx out.
#[tokio::test]
async fn test_analyze_text() {
    e2e_skip_unless_enabled!();

    let config = ReportConfig::builder()
        .max_retries(2)
        .title("E2E analysis")
        .build()
        .expect("valid config");

    let output = analyze_text(SAMPLE_OCR_TEXT, &config)
        .await
        .expect("analysis should succeed");

    assert_analysis_quality(&output.analysis_markdown, "analyze_text");
    assert!(output.images.is_empty());
    assert!(output.stats.total_input_tokens > 0, "Should have consumed tokens");
    assert!(
        output.stats.tables >= 1,
        "Three brands should produce a comparison table"
    );
    assert_eq!(&output.docx[..2], b"PK");

    let md = output.analysis_markdown.to_lowercase();
    for brand in ["dior", "chanel", "guerlain"] {
        assert!(md.contains(brand), "Analysis should mention {brand}");
    }

    let out_path = output_dir().join("analyze_text.docx");
    std::fs::write(&out_path, &output.docx).ok();
    println!("[analyze_text] Saved to {}", out_path.display());
    println!(
        "--- BEGIN ANALYSIS ---\n{}\n--- END ANALYSIS ---",
        output.analysis_markdown
    );
}

/// Full pipeline over every photograph in `test_cases/`.
#[tokio::test]
async fn test_generate_report() {
    let photos = e2e_skip_unless_photos!();

    let config = ReportConfig::builder()
        .max_retries(2)
        .concurrency(2)
        .build()
        .expect("valid config");

    let output = generate_report(&photos, &config)
        .await
        .expect("report should succeed");

    assert_eq!(output.stats.total_images, photos.len());
    assert!(output.stats.processed_images >= 1);
    assert_eq!(
        output.stats.processed_images + output.stats.failed_images,
        photos.len()
    );
    assert_eq!(output.images.len(), photos.len());
    assert!(
        output.images.windows(2).all(|w| w[0].image_num < w[1].image_num),
        "Per-image results must be in input order"
    );
    assert_analysis_quality(&output.analysis_markdown, "generate_report");
    assert_eq!(output.stats.docx_bytes, output.docx.len());

    println!(
        "[generate_report] {} images, {} blocks, tokens {} in / {} out",
        output.stats.total_images,
        output.stats.blocks,
        output.stats.total_input_tokens,
        output.stats.total_output_tokens
    );
}

/// Archive layout on disk.
#[tokio::test]
async fn test_generate_report_to_archive() {
    let photos = e2e_skip_unless_photos!();
    let archive_path = output_dir().join("report.zip");

    let config = ReportConfig::builder()
        .max_retries(2)
        .title("E2E archive")
        .build()
        .expect("valid config");

    let stats = generate_report_to_archive(&photos, &archive_path, &config)
        .await
        .expect("archive should be written");
    assert!(stats.processed_images >= 1);

    let bytes = std::fs::read(&archive_path).expect("archive exists");
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    assert!(names.contains(&"report.docx".to_string()));
    assert!(names.contains(&"analysis.md".to_string()));
    assert_eq!(
        names.iter().filter(|n| n.starts_with("images/")).count(),
        photos.len()
    );
    assert_eq!(
        names.iter().filter(|n| n.starts_with("ocr/")).count(),
        stats.processed_images
    );

    let mut docx = Vec::new();
    archive
        .by_name("report.docx")
        .unwrap()
        .read_to_end(&mut docx)
        .unwrap();
    assert_eq!(docx.len(), stats.docx_bytes);

    println!("[archive] Saved to {}", archive_path.display());
}

/// Callbacks fire once per image and once per report.
#[tokio::test]
async fn test_report_progress_callbacks() {
    let photos = e2e_skip_unless_photos!();

    #[derive(Default)]
    struct Counts {
        report_started: AtomicUsize,
        image_started: AtomicUsize,
        image_finished: AtomicUsize,
        analysis_started: AtomicUsize,
        report_completed: AtomicUsize,
    }

    impl ReportProgressCallback for Counts {
        fn on_report_start(&self, _total: usize) {
            self.report_started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_image_start(&self, _image_num: usize, _total: usize) {
            self.image_started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_image_complete(&self, _image_num: usize, _total: usize, _len: usize) {
            self.image_finished.fetch_add(1, Ordering::SeqCst);
        }
        fn on_image_error(&self, _image_num: usize, _total: usize, _error: &str) {
            self.image_finished.fetch_add(1, Ordering::SeqCst);
        }
        fn on_analysis_start(&self) {
            self.analysis_started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_report_complete(&self, _total: usize, _success: usize) {
            self.report_completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counts = Arc::new(Counts::default());
    let config = ReportConfig::builder()
        .max_retries(1)
        .include_appendix(false)
        .progress_callback(Arc::clone(&counts) as Arc<dyn ReportProgressCallback>)
        .build()
        .expect("valid config");

    generate_report(&photos, &config)
        .await
        .expect("report should succeed");

    assert_eq!(counts.report_started.load(Ordering::SeqCst), 1);
    assert_eq!(counts.image_started.load(Ordering::SeqCst), photos.len());
    assert_eq!(counts.image_finished.load(Ordering::SeqCst), photos.len());
    assert_eq!(counts.analysis_started.load(Ordering::SeqCst), 1);
    assert_eq!(counts.report_completed.load(Ordering::SeqCst), 1);
}
