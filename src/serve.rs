//! HTTP server for interactive analysis mode
//!
//! `sigsift serve ./evidence` → starts server, opens browser, shows results

use crate::analyzer::{Analyzer, Report};
use crate::batch;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::Summary;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::PathBuf;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("ui.html");

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeParams {
    pub path: String,
    pub entropy_threshold: Option<f64>,
    pub max_embedded: Option<usize>,
}

/// One file that could not be analyzed
#[derive(Debug, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub generated: String,
    pub summary: Summary,
    pub files: Vec<Report>,
    pub errors: Vec<FileError>,
    pub params: AnalyzeParams,
}

/// Start server, open browser, serve UI
///
/// `config` is the baseline; request parameters override it per request.
pub fn start(port: u16, path: PathBuf, config: Config) -> Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;

    let url = format!("http://localhost:{}", port);
    let path_str = path
        .canonicalize()
        .unwrap_or_else(|_| path.clone())
        .display()
        .to_string();

    eprintln!("\n\x1b[1;32msigsift\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Analyzing: {}\n", path_str);
    info!(%url, path = %path_str, "server listening");

    // Open browser
    if let Err(e) = open::that(&url) {
        warn!(%url, "failed to open browser: {}", e);
    }

    // Handle requests
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &path_str, &config) {
            warn!("request failed: {}", e);
        }
    }

    Ok(())
}

fn handle_request(mut request: Request, default_path: &str, config: &Config) -> io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();
    debug!(%method, %url, "request");

    match (&method, path) {
        // Serve embedded UI
        (&Method::Get, "/") => {
            let html = UI_HTML.replace("{{DEFAULT_PATH}}", &html_attr(default_path));
            respond(request, html, "text/html; charset=utf-8", 200)
        }

        // API: Analyze
        (&Method::Get, "/api/analyze") | (&Method::Post, "/api/analyze") => {
            let params = parse_params(&mut request, default_path)?;
            eprintln!("→ {}", params.path);

            let (json, status) = match run_analysis(params, config) {
                Ok(report) => (serde_json::to_string(&ApiResponse::success(report))?, 200),
                Err(e) => {
                    debug!("rejected request: {}", e);
                    let failure = ApiResponse::<AnalysisReport>::failure(e.to_string());
                    (serde_json::to_string(&failure)?, 400)
                }
            };
            respond(request, json, "application/json", status)
        }

        // 404
        _ => respond(request, "Not found".to_string(), "text/plain", 404),
    }
}

fn respond(request: Request, body: String, content_type: &str, status: u16) -> io::Result<()> {
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        response = response.with_header(header);
    }
    request.respond(response)
}

fn parse_params(request: &mut Request, default_path: &str) -> io::Result<AnalyzeParams> {
    let url = request.url().to_string();

    // Try query string
    if let Some(query) = url.split('?').nth(1) {
        if let Ok(params) = serde_urlencoded::from_str::<AnalyzeParams>(query) {
            return Ok(params);
        }
    }

    // Try JSON body
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body)?;
    if !body.is_empty() {
        if let Ok(params) = serde_json::from_str::<AnalyzeParams>(&body) {
            return Ok(params);
        }
    }

    // Fall back to default path
    Ok(AnalyzeParams {
        path: default_path.to_string(),
        entropy_threshold: None,
        max_embedded: None,
    })
}

fn run_analysis(params: AnalyzeParams, config: &Config) -> Result<AnalysisReport> {
    let mut config = config.clone();
    if let Some(threshold) = params.entropy_threshold {
        config.entropy_threshold = threshold;
    }
    if params.max_embedded.is_some() {
        config.max_embedded = params.max_embedded;
    }
    config.validate()?;

    let analyzer = Analyzer::with_config(config);
    let files = batch::collect_files(&PathBuf::from(&params.path));
    let results = batch::analyze_all(&analyzer, &files, |_| {});

    let mut reports = Vec::new();
    let mut errors = Vec::new();
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => errors.push(FileError {
                file: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }

    Ok(AnalysisReport {
        generated: chrono::Local::now().to_rfc3339(),
        summary: Summary::from_reports(&reports),
        files: reports,
        errors,
        params,
    })
}

fn html_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
