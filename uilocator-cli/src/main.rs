use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uilocator::image::io::load_rgb_image;
use uilocator::platform::{ScreenCapture, StaticScreen, TextPattern};
use uilocator::registry::ScanReport;
use uilocator::{
    Context, ContextBuilder, Defaults, Found, LocateRequest, MatchCandidate, MatchConfig, Rect,
    SearchRegion, Target, TemplateRegistry, WaitReport, WaitSpec,
};

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "uilocator CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DefaultsJson {
    confidence: f32,
    grayscale: bool,
    max_candidates: usize,
    dpi_scale: f32,
}

impl Default for DefaultsJson {
    fn default() -> Self {
        let defaults = Defaults::default();
        Self {
            confidence: defaults.confidence,
            grayscale: defaults.grayscale,
            max_candidates: defaults.max_candidates,
            dpi_scale: defaults.dpi_scale,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    max_overlap: f32,
    min_var_i: f32,
    parallel: bool,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            max_overlap: cfg.max_overlap,
            min_var_i: cfg.min_var_i,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegionJson {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RequestJson {
    template: Option<String>,
    group: Option<String>,
    window_title: Option<String>,
    window_class: Option<String>,
    text: Option<String>,
    /// Compare window titles and text exactly instead of as
    /// case-insensitive substrings.
    exact_match: bool,
    min_confidence: Option<f32>,
    region: Option<RegionJson>,
}

impl RequestJson {
    fn pattern(&self, text: &str) -> TextPattern {
        if self.exact_match {
            TextPattern::exact(text)
        } else {
            TextPattern::substring(text)
        }
    }

    fn targets(&self) -> Vec<Target> {
        let mut targets = Vec::new();
        if let Some(name) = &self.template {
            targets.push(match &self.group {
                Some(group) => Target::template_in(name, group),
                None => Target::template(name),
            });
        }
        if let Some(title) = &self.window_title {
            targets.push(Target::window(self.pattern(title)));
        } else if let Some(class_name) = &self.window_class {
            targets.push(Target::window_class(class_name));
        }
        if let Some(text) = &self.text {
            targets.push(Target::text(self.pattern(text)));
        }
        targets
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WaitJson {
    timeout_secs: f64,
    interval_secs: f64,
    backoff_factor: f64,
    max_interval_secs: f64,
}

impl Default for WaitJson {
    fn default() -> Self {
        let spec = WaitSpec::default();
        Self {
            timeout_secs: spec.timeout.as_secs_f64(),
            interval_secs: spec.interval.as_secs_f64(),
            backoff_factor: spec.backoff_factor,
            max_interval_secs: spec.max_interval.as_secs_f64(),
        }
    }
}

impl WaitJson {
    fn to_spec(&self) -> Result<WaitSpec, Box<dyn std::error::Error>> {
        let max_interval = Duration::try_from_secs_f64(self.max_interval_secs)
            .map_err(|_| format!("invalid max_interval_secs {}", self.max_interval_secs))?;
        let spec = WaitSpec::from_secs(self.timeout_secs, self.interval_secs)?
            .with_backoff(self.backoff_factor, max_interval);
        spec.validate()?;
        Ok(spec)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    templates_dir: String,
    /// Screenshot to search; the live primary monitor when absent and the
    /// `desktop` feature is enabled.
    screenshot_path: Option<String>,
    output_path: Option<String>,
    defaults: DefaultsJson,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
    request: RequestJson,
    wait: Option<WaitJson>,
}

#[derive(Debug, Serialize)]
struct WarningRecord {
    path: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct ScanRecord {
    registered: usize,
    warnings: Vec<WarningRecord>,
}

impl From<ScanReport> for ScanRecord {
    fn from(value: ScanReport) -> Self {
        Self {
            registered: value.registered,
            warnings: value
                .warnings
                .into_iter()
                .map(|w| WarningRecord {
                    path: w.path.display().to_string(),
                    reason: w.reason,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FoundRecord {
    x: i32,
    y: i32,
    confidence: f32,
    strategy: &'static str,
}

impl From<Found> for FoundRecord {
    fn from(value: Found) -> Self {
        Self {
            x: value.center.x,
            y: value.center.y,
            confidence: value.confidence,
            strategy: value.strategy.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CandidateRecord {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    confidence: f32,
}

impl From<MatchCandidate> for CandidateRecord {
    fn from(value: MatchCandidate) -> Self {
        let center = value.center();
        Self {
            x: value.top_left.x,
            y: value.top_left.y,
            width: value.size.width,
            height: value.size.height,
            center_x: center.x,
            center_y: center.y,
            confidence: value.confidence,
        }
    }
}

#[derive(Debug, Serialize)]
struct WaitRecord {
    state: &'static str,
    attempts: usize,
    elapsed_ms: u64,
}

impl<T> From<&WaitReport<T>> for WaitRecord {
    fn from(value: &WaitReport<T>) -> Self {
        Self {
            state: value.state.as_str(),
            attempts: value.attempt_count(),
            elapsed_ms: value.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    scan: ScanRecord,
    best: Option<FoundRecord>,
    candidates: Vec<CandidateRecord>,
    wait: Option<WaitRecord>,
}

fn context_builder(config: &Config) -> Result<ContextBuilder, Box<dyn std::error::Error>> {
    match &config.screenshot_path {
        Some(path) => {
            let screen: Arc<dyn ScreenCapture> = Arc::new(StaticScreen::new(load_rgb_image(path)?));
            Ok(Context::builder(screen))
        }
        #[cfg(feature = "desktop")]
        None => {
            use uilocator::platform::{DesktopScreen, DesktopWindows, TesseractRecognizer};
            Ok(Context::builder(Arc::new(DesktopScreen))
                .windows(Arc::new(DesktopWindows))
                .recognizer(Arc::new(TesseractRecognizer::lazy())))
        }
        #[cfg(not(feature = "desktop"))]
        None => Err("screenshot_path must be set without the desktop feature".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("uilocator=debug".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;

    let registry = Arc::new(TemplateRegistry::with_default_confidence(
        config.defaults.confidence,
    ));
    let scan = if config.templates_dir.is_empty() {
        ScanReport::default()
    } else {
        registry.scan(&config.templates_dir)
    };
    tracing::info!(
        registered = scan.registered,
        warnings = scan.warnings.len(),
        "templates scanned"
    );

    let defaults = Defaults {
        confidence: config.defaults.confidence,
        grayscale: config.defaults.grayscale,
        max_candidates: config.defaults.max_candidates,
        dpi_scale: config.defaults.dpi_scale,
        ..Defaults::default()
    };
    let context = context_builder(&config)?
        .registry(registry)
        .defaults(defaults)
        .match_config(MatchConfig {
            max_overlap: config.match_cfg.max_overlap,
            min_var_i: config.match_cfg.min_var_i,
            parallel: config.match_cfg.parallel,
            ..MatchConfig::default()
        })
        .build()?;

    let mut targets = config.request.targets().into_iter();
    let mut request = match targets.next() {
        Some(first) => targets.fold(LocateRequest::new(first), LocateRequest::or),
        None => {
            return Err("request needs a template, window_title, window_class or text".into())
        }
    };
    if let Some(region) = &config.request.region {
        request = request.in_region(SearchRegion::Rect(Rect::new(
            region.x,
            region.y,
            region.width,
            region.height,
        )));
    }
    if let Some(min_confidence) = config.request.min_confidence {
        request = request.with_confidence(min_confidence);
    }

    let (best, wait) = match &config.wait {
        Some(wait) => {
            let report = context.wait_for(&request, Some(&wait.to_spec()?))?;
            let record = WaitRecord::from(&report);
            (report.value, Some(record))
        }
        None => (context.locate(&request)?.found().copied(), None),
    };
    let candidates = if config.request.template.is_some() {
        context
            .find_all(&request)
            .or_else(|err| if err.is_recoverable() { Ok(Vec::new()) } else { Err(err) })?
            .into_iter()
            .map(CandidateRecord::from)
            .collect()
    } else {
        Vec::new()
    };

    let output = Output {
        scan: scan.into(),
        best: best.map(FoundRecord::from),
        candidates,
        wait,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
