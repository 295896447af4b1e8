//! Handwritten text extraction from images and PDFs.
//!
//! PDF pages are rendered to PNG by poppler's `pdftoppm` and each page goes
//! through the vision model. Failures are typed; their display text is what
//! the response area shows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;

use crate::intelligence::AiAssist;

const EXTRACT_PROMPT: &str = "Extract the handwritten text from this image.";
const EXTRACT_MAX_TOKENS: u32 = 500;
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];
const PDF_RENDER_DPI: u32 = 150;

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Error: File does not exist")]
    Missing,
    #[error("Error: Unsupported file format. Use PNG, JPG, JPEG, or PDF")]
    Unsupported,
    #[error("Error: Could not process PDF")]
    Pdf,
    #[error("Error processing file: {0}")]
    Processing(String),
}

/// Renders each PDF page to PNG bytes.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, pdf_path: &Path) -> Result<Vec<Vec<u8>>, String>;
}

/// Runs poppler's `pdftoppm` into a scratch directory.
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Page images in page order. `pdftoppm` zero-pads page numbers, so a
/// name sort is a page sort.
fn collect_pages(dir: &Path) -> std::io::Result<Vec<Vec<u8>>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    paths.sort();
    paths.iter().map(std::fs::read).collect()
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf_path: &Path) -> Result<Vec<Vec<u8>>, String> {
        let scratch = tempfile::tempdir().map_err(|e| e.to_string())?;
        let output = tokio::process::Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(PDF_RENDER_DPI.to_string())
            .arg(pdf_path)
            .arg(scratch.path().join("page"))
            .output()
            .await
            .map_err(|e| format!("{} could not be started: {}", self.program.display(), e))?;
        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        let pages = collect_pages(scratch.path()).map_err(|e| e.to_string())?;
        log::info!("Rendered {} PDF page(s) from {}", pages.len(), pdf_path.display());
        Ok(pages)
    }
}

fn data_url(mime_subtype: &str, bytes: &[u8]) -> String {
    format!(
        "data:image/{};base64,{}",
        mime_subtype,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

pub async fn extract_handwritten_text(
    ai: &dyn AiAssist,
    rasterizer: &dyn PageRasterizer,
    path: &Path,
) -> Result<String, OcrError> {
    if !path.exists() {
        return Err(OcrError::Missing);
    }
    let ext = match extension_of(path) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => ext,
        _ => return Err(OcrError::Unsupported),
    };

    if ext == "pdf" {
        extract_from_pdf(ai, rasterizer, path).await
    } else {
        extract_from_image(ai, path, &ext).await
    }
}

async fn extract_from_image(ai: &dyn AiAssist, path: &Path, ext: &str) -> Result<String, OcrError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| OcrError::Processing(e.to_string()))?;
    let text = ai
        .describe_image(EXTRACT_PROMPT, &data_url(ext, &bytes), EXTRACT_MAX_TOKENS)
        .await
        .map_err(|e| OcrError::Processing(e.to_string()))?;
    Ok(text.trim().to_string())
}

async fn extract_from_pdf(
    ai: &dyn AiAssist,
    rasterizer: &dyn PageRasterizer,
    path: &Path,
) -> Result<String, OcrError> {
    let pages = match rasterizer.rasterize(path).await {
        Ok(pages) => pages,
        Err(e) => {
            log::warn!("Error converting PDF {}: {}", path.display(), e);
            Vec::new()
        }
    };
    if pages.is_empty() {
        return Err(OcrError::Pdf);
    }

    let mut extracted = String::new();
    for (i, png) in pages.iter().enumerate() {
        let text = ai
            .describe_image(EXTRACT_PROMPT, &data_url("png", png), EXTRACT_MAX_TOKENS)
            .await
            .map_err(|e| OcrError::Processing(e.to_string()))?;
        extracted.push_str(&format!("\n[Page {}]\n{}", i + 1, text.trim()));
    }
    Ok(extracted.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::AiError;
    use std::sync::Mutex;

    struct EchoVision {
        urls: Mutex<Vec<String>>,
    }

    impl EchoVision {
        fn new() -> Self {
            Self {
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AiAssist for EchoVision {
        async fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, AiError> {
            unreachable!("OCR only uses vision")
        }

        async fn describe_image(
            &self,
            prompt: &str,
            image_data_url: &str,
            max_output_tokens: u32,
        ) -> Result<String, AiError> {
            assert_eq!(prompt, EXTRACT_PROMPT);
            assert_eq!(max_output_tokens, 500);
            let mut urls = self.urls.lock().unwrap();
            urls.push(image_data_url.to_string());
            Ok(format!("  text {}  ", urls.len()))
        }
    }

    struct TwoPages;

    #[async_trait]
    impl PageRasterizer for TwoPages {
        async fn rasterize(&self, _: &Path) -> Result<Vec<Vec<u8>>, String> {
            Ok(vec![b"page-one".to_vec(), b"page-two".to_vec()])
        }
    }

    struct NoPages;

    #[async_trait]
    impl PageRasterizer for NoPages {
        async fn rasterize(&self, _: &Path) -> Result<Vec<Vec<u8>>, String> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn missing_and_unsupported_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ai = EchoVision::new();

        let missing = dir.path().join("nope.png");
        let err = extract_handwritten_text(&ai, &TwoPages, &missing)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: File does not exist");

        let gif = dir.path().join("scan.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();
        let err = extract_handwritten_text(&ai, &TwoPages, &gif)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Unsupported));
        assert_eq!(
            err.to_string(),
            "Error: Unsupported file format. Use PNG, JPG, JPEG, or PDF"
        );
        assert!(ai.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_is_sent_as_data_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Scan.JPG");
        std::fs::write(&path, b"abc").unwrap();

        let ai = EchoVision::new();
        let text = extract_handwritten_text(&ai, &TwoPages, &path).await.unwrap();
        assert_eq!(text, "text 1");
        assert_eq!(ai.urls.lock().unwrap()[0], "data:image/jpg;base64,YWJj");
    }

    #[tokio::test]
    async fn pdf_pages_are_prefixed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let ai = EchoVision::new();
        let text = extract_handwritten_text(&ai, &TwoPages, &path).await.unwrap();
        assert_eq!(text, "[Page 1]\ntext 1\n[Page 2]\ntext 2");
        assert!(ai.urls.lock().unwrap()[1].starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn pdf_without_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let ai = EchoVision::new();
        let err = extract_handwritten_text(&ai, &NoPages, &path)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: Could not process PDF");
    }

    #[tokio::test]
    async fn missing_renderer_fails_the_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let renderer = PdftoppmRasterizer::new(dir.path().join("no-such-renderer"));
        assert!(renderer.rasterize(&path).await.is_err());

        let ai = EchoVision::new();
        let err = extract_handwritten_text(&ai, &renderer, &path)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Pdf));
    }

    #[test]
    fn rendered_pages_are_read_in_page_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("page-10.png"), b"ten").unwrap();
        std::fs::write(dir.path().join("page-02.png"), b"two").unwrap();
        std::fs::write(dir.path().join("page-01.png"), b"one").unwrap();
        std::fs::write(dir.path().join("page.txt"), b"skip").unwrap();

        let pages = collect_pages(dir.path()).unwrap();
        assert_eq!(pages, vec![b"one".to_vec(), b"two".to_vec(), b"ten".to_vec()]);
    }
}
