//! Detect command handler

use std::fs;

use formprobe::{Detection, DetectionStrategy, FormControlLocator, SignalDetector, StaticPage};
use serde::Serialize;

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::OutputFormat;
use crate::DetectArgs;

/// Detector verdict for one recorded field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDetection {
    /// Field name
    pub field: String,
    /// Whether the page recorded the control
    pub found: bool,
    /// Detector result
    pub detection: Detection,
}

pub(crate) const fn strategy_name(strategy: DetectionStrategy) -> &'static str {
    match strategy {
        DetectionStrategy::ExplicitMarker => "explicit_marker",
        DetectionStrategy::ClassMarkers => "class_markers",
        DetectionStrategy::StyleColors => "style_colors",
    }
}

/// Run the detector over `fields`, or over every recorded field when empty
pub fn detect_fields(
    page: &StaticPage,
    detector: &SignalDetector,
    fields: &[String],
) -> CliResult<Vec<FieldDetection>> {
    let names: Vec<String> = if fields.is_empty() {
        page.names().map(str::to_string).collect()
    } else {
        fields.to_vec()
    };

    names
        .into_iter()
        .map(|field| -> CliResult<FieldDetection> {
            let control = page.locate(&field)?;
            Ok(FieldDetection {
                found: control.is_some(),
                detection: detector.detect_located(control.as_ref()),
                field,
            })
        })
        .collect()
}

/// Render detections
pub fn render_detections(results: &[FieldDetection], format: OutputFormat) -> CliResult<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(results)?);
    }
    let mut out = String::new();
    for result in results {
        let verdict = match (&result.detection.strategy, &result.detection.token) {
            _ if !result.found => "not found (no signal)".to_string(),
            (Some(strategy), Some(token)) => {
                format!("INVALID ({}: {token})", strategy_name(*strategy))
            }
            _ => "no signal".to_string(),
        };
        out.push_str(&format!("{}: {verdict}\n", result.field));
    }
    Ok(out)
}

/// Execute the detect command
pub fn execute_detect(config: &CliConfig, args: &DetectArgs) -> CliResult<()> {
    let detector = config.load_probe_config()?.detector();
    let page = StaticPage::from_json(&fs::read_to_string(&args.snapshot)?)?;
    let results = detect_fields(&page, &detector, &args.field)?;
    let rendered = render_detections(&results, args.format)?;
    if args.format == OutputFormat::Json {
        println!("{rendered}");
    } else {
        print!("{rendered}");
    }
    Ok(())
}
