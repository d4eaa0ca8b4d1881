//! Batch command
//!
//! Reads one JSON job per line, renders them in parallel over a shared
//! overlay and writes one JSON result per job to stdout, in input order.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use boxfit::prelude::{Overlay, OverlayReport, OverlayRequest, TextBox};

use crate::cli::BatchArgs;
use crate::options::{load_canvas, parse_align, parse_color, parse_markup, parse_valign};

/// One line of the job file; unset fields take the command-line values
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchJob {
    text: String,
    output: PathBuf,
    /// Image to draw on; a blank canvas when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canvas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    markup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    padding: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valign: Option<String>,
    /// RRGGBB or RRGGBBAA for all non-hashtag text
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashtag_color: Option<String>,
}

impl BatchJob {
    fn request(&self, base: &OverlayRequest) -> Result<OverlayRequest> {
        let mut req = base.clone();
        req.text = self.text.clone();
        let b = base.text_box;
        req.text_box = TextBox::new(
            self.x.unwrap_or(b.x),
            self.y.unwrap_or(b.y),
            self.width.unwrap_or(b.width),
            self.height.unwrap_or(b.height),
        )
        .with_padding(self.padding.unwrap_or(b.padding));
        if let Some(m) = &self.markup {
            req.markup = parse_markup(m).map_err(anyhow::Error::msg)?;
        }
        if let Some(size) = self.max_font_size {
            req.max_font_size = size;
        }
        if let Some(ratio) = self.line_height {
            req.line_height_ratio = ratio;
        }
        if let Some(a) = &self.align {
            req.align = parse_align(a).map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = &self.valign {
            req.valign = parse_valign(v).map_err(anyhow::Error::msg)?;
        }
        if let Some(c) = &self.color {
            let color = parse_color(c)?;
            req.palette.regular = color;
            req.palette.bold = color;
            req.palette.italic = color;
        }
        if let Some(c) = &self.hashtag_color {
            req.palette.hashtag = parse_color(c)?;
        }
        Ok(req)
    }
}

/// What gets printed for each job
#[derive(Debug, Serialize)]
struct JobResult {
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<OverlayReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl JobResult {
    fn new(line: usize, output: Option<PathBuf>, outcome: Result<OverlayReport>) -> Self {
        match outcome {
            Ok(report) => Self {
                line,
                output,
                status: "ok",
                report: Some(report),
                error: None,
            },
            Err(e) => Self {
                line,
                output,
                status: "error",
                report: None,
                error: Some(format!("{:#}", e)),
            },
        }
    }
}

fn run_job(
    overlay: &Overlay,
    job: &BatchJob,
    base: &OverlayRequest,
    canvas: &str,
    background: &str,
) -> Result<OverlayReport> {
    let request = job.request(base)?;
    let size = job.canvas.as_deref().unwrap_or(canvas);
    let mut image = load_canvas(job.input.as_deref(), size, background)?;
    let report = overlay.render(&mut image, &request)?;
    image
        .save(&job.output)
        .with_context(|| format!("Failed to write {}", job.output.display()))?;
    Ok(report)
}

/// Non-blank, non-comment lines with their 1-based line numbers
fn read_jobs(reader: impl BufRead) -> Result<Vec<(usize, Result<BatchJob>)>> {
    let mut jobs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read job line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        let job = serde_json::from_str::<BatchJob>(trimmed)
            .with_context(|| format!("Invalid job on line {}", index + 1));
        jobs.push((index + 1, job));
    }
    Ok(jobs)
}

pub fn run(args: &BatchArgs, quiet: bool) -> Result<()> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => {
            if !quiet {
                eprintln!("Reading jobs from stdin...");
            }
            Box::new(BufReader::new(io::stdin()))
        },
    };
    let jobs = read_jobs(reader)?;

    let overlay = args.fonts.overlay()?;
    let base = args.layout.request(String::new(), &args.colors)?;

    let results: Vec<JobResult> = jobs
        .par_iter()
        .map(|(line, job)| match job {
            Ok(job) => {
                let outcome = run_job(&overlay, job, &base, &args.canvas, &args.background);
                if let Err(e) = &outcome {
                    log::warn!("job on line {} failed: {:#}", line, e);
                }
                JobResult::new(*line, Some(job.output.clone()), outcome)
            },
            Err(e) => JobResult::new(*line, None, Err(anyhow::anyhow!("{:#}", e))),
        })
        .collect();

    let failed = results.iter().filter(|r| r.status != "ok").count();
    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }

    if !quiet {
        eprintln!();
        eprintln!("Batch processing complete:");
        eprintln!("  Total jobs: {}", results.len());
        eprintln!("  Successful: {}", results.len() - failed);
        eprintln!("  Failed: {}", failed);
    }

    if failed > 0 {
        bail!("{} of {} jobs failed", failed, results.len());
    }
    Ok(())
}
