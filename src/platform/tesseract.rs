//! Text recognition through the `tesseract` command-line engine.

use super::text::TextBox;
use crate::util::Rect;

#[cfg(feature = "desktop")]
use super::lazy::LazyBackend;
#[cfg(feature = "desktop")]
use super::text::{TextPattern, TextRecognizer};
#[cfg(feature = "desktop")]
use crate::image::io::save_image;
#[cfg(feature = "desktop")]
use crate::image::{ImageView, OwnedImage};
#[cfg(feature = "desktop")]
use crate::util::{LocateError, LocateResult};
#[cfg(feature = "desktop")]
use std::path::PathBuf;
#[cfg(feature = "desktop")]
use std::process::Command;

type LineKey = (u32, u32, u32, u32);

struct Word {
    line: LineKey,
    text: String,
    bbox: Rect,
    confidence: f32,
}

fn parse_word(row: &str) -> Option<Word> {
    let cols: Vec<&str> = row.split('\t').collect();
    if cols.len() < 12 || cols[0].trim() != "5" {
        return None;
    }
    let num = |i: usize| cols[i].trim().parse::<u32>().ok();
    let confidence: f32 = cols[10].trim().parse().ok()?;
    let text = cols[11..].join("\t").trim().to_string();
    if confidence < 0.0 || text.is_empty() {
        return None;
    }
    let left: i32 = cols[6].trim().parse().ok()?;
    let top: i32 = cols[7].trim().parse().ok()?;
    Some(Word {
        line: (num(1)?, num(2)?, num(3)?, num(4)?),
        text,
        bbox: Rect::new(left, top, num(8)?, num(9)?),
        confidence: (confidence / 100.0).clamp(0.0, 1.0),
    })
}

fn union(a: Rect, b: Rect) -> Rect {
    Rect::from_corners(
        a.left().min(b.left()),
        a.top().min(b.top()),
        a.right().max(b.right()),
        a.bottom().max(b.bottom()),
    )
    .unwrap_or(a)
}

/// Parses tesseract's TSV output into text boxes.
///
/// Every recognized word becomes a box. A line with more than one word is
/// also reported as one box spanning its words, placed before them, with the
/// mean word confidence, so phrases can match as a whole. Confidences are
/// rescaled from percent to `[0, 1]`.
pub fn parse_tesseract_tsv(tsv: &str) -> Vec<TextBox> {
    let words: Vec<Word> = tsv.lines().filter_map(parse_word).collect();
    let mut boxes = Vec::with_capacity(words.len());
    let mut start = 0;
    while start < words.len() {
        let key = words[start].line;
        let end = words[start..]
            .iter()
            .position(|w| w.line != key)
            .map_or(words.len(), |n| start + n);
        let line = &words[start..end];
        if line.len() > 1 {
            let text = line.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
            let bbox = line.iter().skip(1).fold(line[0].bbox, |acc, w| union(acc, w.bbox));
            let confidence = line.iter().map(|w| w.confidence).sum::<f32>() / line.len() as f32;
            boxes.push(TextBox {
                text,
                bbox,
                confidence,
            });
        }
        boxes.extend(line.iter().map(|w| TextBox {
            text: w.text.clone(),
            bbox: w.bbox,
            confidence: w.confidence,
        }));
        start = end;
    }
    boxes
}

/// Recognizes text by running the `tesseract` executable on a scratch PNG.
///
/// Construct it through [`TesseractRecognizer::lazy`] so the engine is only
/// checked when text is first needed.
#[cfg(feature = "desktop")]
#[derive(Clone, Debug)]
pub struct TesseractRecognizer {
    program: PathBuf,
    languages: String,
}

#[cfg(feature = "desktop")]
impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            languages: "eng".to_string(),
        }
    }
}

#[cfg(feature = "desktop")]
impl TesseractRecognizer {
    /// Language codes joined with `+`, e.g. `eng+chi_sim`.
    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Confirms the engine runs.
    pub fn check(self) -> LocateResult<Self> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| {
                LocateError::BackendUnavailable(format!("{}: {e}", self.program.display()))
            })?;
        if !output.status.success() {
            return Err(LocateError::BackendUnavailable(format!(
                "{} --version exited with {}",
                self.program.display(),
                output.status
            )));
        }
        Ok(self)
    }

    /// The default engine behind a lazily checked handle.
    pub fn lazy() -> LazyBackend<Self> {
        LazyBackend::new("tesseract", || Self::default().check())
    }
}

#[cfg(feature = "desktop")]
fn scratch_path() -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    std::env::temp_dir().join(format!(
        "uilocator-ocr-{}-{}.png",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ))
}

#[cfg(feature = "desktop")]
impl TextRecognizer for TesseractRecognizer {
    fn recognize(
        &self,
        image: ImageView<'_, u8>,
        _pattern: &TextPattern,
    ) -> LocateResult<Vec<TextBox>> {
        let path = scratch_path();
        save_image(&OwnedImage::from_view(image)?, &path)?;
        let output = Command::new(&self.program)
            .arg(&path)
            .arg("stdout")
            .args(["-l", self.languages.as_str(), "--psm", "3", "tsv"])
            .output();
        let _ = std::fs::remove_file(&path);

        let output = output.map_err(|e| LocateError::TextRecognition(e.to_string()))?;
        if !output.status.success() {
            return Err(LocateError::TextRecognition(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(parse_tesseract_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}
