//! Apache `.htaccess` redirect directives.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::entities::ExternalRedirectRecord;
use crate::domain::sources::{RedirectSource, SourceError};

const SOURCE_NAME: &str = "htaccess";

/// Reads `Redirect*` and `RewriteRule ... [R]` directives from a file.
pub struct HtaccessSource {
    path: Option<PathBuf>,
}

impl HtaccessSource {
    /// `path` is `None` when no file is configured; the source is then
    /// reported as unavailable.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl RedirectSource for HtaccessSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn is_available(&self) -> bool {
        match &self.path {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    async fn scan(&self) -> Result<Vec<ExternalRedirectRecord>, SourceError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable("no .htaccess path configured".to_string()))?;

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::Read(format!("{}: {}", path.display(), e)))?;

        let records = parse_htaccess(&contents);
        debug!(path = %path.display(), found = records.len(), "Parsed .htaccess");
        Ok(records)
    }
}

/// Extracts redirects from `.htaccess` text.
///
/// - `Redirect [status] from [to]`, status defaulting to 302
/// - `RedirectPermanent from to` (301) and `RedirectTemp from to` (302)
/// - `RedirectMatch [status] regex to`
/// - `RewriteRule pattern target [flags]` when the flags contain `R`
///   (`R` alone is 302, `R=code` or `R=alias` picks the status)
///
/// Directive names are case-insensitive. Unknown lines are ignored.
pub fn parse_htaccess(contents: &str) -> Vec<ExternalRedirectRecord> {
    contents
        .lines()
        .filter_map(|line| parse_line(line.trim()))
        .collect()
}

fn parse_line(line: &str) -> Option<ExternalRedirectRecord> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let tokens: Vec<&str> = line
        .split_whitespace()
        .map(|t| t.trim_matches('"'))
        .collect();
    let (directive, args) = tokens.split_first()?;

    match directive.to_ascii_lowercase().as_str() {
        "redirect" | "redirectmatch" => {
            let (status, rest) = match args.first().and_then(|a| status_token(a)) {
                Some(status) => (status, &args[1..]),
                None => (302, args),
            };
            let from = rest.first()?;
            let to = rest.get(1).copied().unwrap_or_default();
            if to.is_empty() && status != 410 {
                return None;
            }
            Some(ExternalRedirectRecord::new(*from, to, status, SOURCE_NAME))
        }
        "redirectpermanent" => record(args, 301),
        "redirecttemp" => record(args, 302),
        "rewriterule" => {
            let flags = args.get(2)?;
            let status = rewrite_status(flags)?;
            let target = args.get(1)?;
            if *target == "-" {
                return None;
            }
            Some(ExternalRedirectRecord::new(args[0], *target, status, SOURCE_NAME))
        }
        _ => None,
    }
}

fn record(args: &[&str], status: u16) -> Option<ExternalRedirectRecord> {
    match args {
        [from, to, ..] => Some(ExternalRedirectRecord::new(*from, *to, status, SOURCE_NAME)),
        _ => None,
    }
}

/// Parses a numeric status or one of Apache's aliases.
fn status_token(token: &str) -> Option<u16> {
    match token.to_ascii_lowercase().as_str() {
        "permanent" => Some(301),
        "temp" => Some(302),
        "seeother" => Some(303),
        "gone" => Some(410),
        other => other
            .parse::<u16>()
            .ok()
            .filter(|code| (300..600).contains(code)),
    }
}

/// Status carried by a `RewriteRule` flag list, if it redirects at all.
fn rewrite_status(flags: &str) -> Option<u16> {
    let inner = flags.strip_prefix('[')?.strip_suffix(']')?;

    inner.split(',').map(str::trim).find_map(|flag| {
        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };
        if !name.eq_ignore_ascii_case("r") && !name.eq_ignore_ascii_case("redirect") {
            return None;
        }
        Some(value.and_then(status_token).unwrap_or(302))
    })
}
