use super::progress_ui::ConvertUi;
use crate::output::{Output, OutputFormat};
use clap::{Args, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use comfy_table::{presets, Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use watchmove_config::Config;
use watchmove_core::{
    write_payload, ConversionOptions, ConversionReport, Converter, IdLookupService, ResolutionCache,
};
use watchmove_models::{AmbiguityPolicy, PayloadLayout, SkipReason, SkippedRecord};
use watchmove_sources::{
    create_http_client, parse_tracking_csv, IdLookupProvider, ImdbSearchClient, RetryPolicy, TraktClient,
    TvTimeClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Grouped,
    Flat,
    TraktSync,
}

impl From<LayoutArg> for PayloadLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Grouped => PayloadLayout::Grouped,
            LayoutArg::Flat => PayloadLayout::Flat,
            LayoutArg::TraktSync => PayloadLayout::TraktSync,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AmbiguityArg {
    Skip,
    First,
}

impl From<AmbiguityArg> for AmbiguityPolicy {
    fn from(arg: AmbiguityArg) -> Self {
        match arg {
            AmbiguityArg::Skip => AmbiguityPolicy::Skip,
            AmbiguityArg::First => AmbiguityPolicy::First,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConvertArgs {
    /// TV Time export to read [default: tracking-prod-records.csv]
    #[arg(short, long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Import file to write [default: import_data_for_trakt.json]
    #[arg(long, value_name = "JSON")]
    pub output_file: Option<PathBuf>,

    /// Shape of the import file
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Remember resolved ids in this file between runs
    #[arg(long, value_name = "FILE", conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,

    /// Ignore any cache file set in the configuration
    #[arg(long)]
    pub no_cache: bool,

    /// What to do when a title search matches several movies
    #[arg(long, value_enum)]
    pub ambiguity: Option<AmbiguityArg>,
}

impl ConvertArgs {
    /// CLI flags take precedence over file and environment settings
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.files.input = input.clone();
        }
        if let Some(output) = &self.output_file {
            config.files.output = output.clone();
        }
        if let Some(layout) = self.layout {
            config.output.layout = layout.into();
        }
        if let Some(cache) = &self.cache {
            config.files.cache = Some(cache.clone());
        }
        if self.no_cache {
            config.files.cache = None;
        }
        if let Some(ambiguity) = self.ambiguity {
            config.lookup.ambiguity = ambiguity.into();
        }
    }
}

fn build_providers(config: &Config) -> Vec<Box<dyn IdLookupProvider>> {
    let client = create_http_client(config.lookup.timeout());
    let retry = RetryPolicy {
        max_retries: config.lookup.max_retries,
        base_delay: config.lookup.base_delay(),
        max_delay: config.lookup.max_delay(),
    };

    let mut providers: Vec<Box<dyn IdLookupProvider>> = Vec::new();
    if config.lookup.tvtime {
        providers.push(Box::new(TvTimeClient::new(client.clone(), retry.clone())));
    }
    if config.is_trakt_configured() {
        providers.push(Box::new(TraktClient::new(
            client.clone(),
            retry.clone(),
            config.trakt.client_id.clone(),
        )));
    }
    if config.lookup.imdb_search {
        providers.push(Box::new(ImdbSearchClient::new(client, retry)));
    }
    providers
}

pub async fn run_convert(config: Config, output: &Output) -> Result<()> {
    tracing::debug!("Convert command started");

    let export = parse_tracking_csv(&config.files.input).map_err(|e| {
        color_eyre::eyre::eyre!("Could not read TV Time export {}: {:#}", config.files.input.display(), e)
    })?;

    let providers = build_providers(&config);
    let lookup = IdLookupService::new(providers, config.lookup.ambiguity)
        .with_request_delay(config.lookup.request_delay());
    let options = ConversionOptions {
        cache: config.files.cache.as_ref().map(ResolutionCache::load),
        ..Default::default()
    };

    let ui = ConvertUi::new(output.is_human() && !output.is_quiet());
    let mut converter = Converter::new(lookup, options);
    if let Some(callback) = ui.callback() {
        converter = converter.with_progress(callback);
    }

    let result = converter.run(&export.records).await;
    ui.finish();

    let layout = config.output.layout;
    write_payload(&result.payload, layout, &config.files.output)
        .wrap_err_with(|| format!("Could not write import file {}", config.files.output.display()))?;

    if let Err(e) = converter.save_cache() {
        tracing::warn!("Failed to save ID cache: {:#}", e);
        output.warn(format!("ID cache not saved: {:#}", e));
    }

    match output.format() {
        OutputFormat::Human => {
            print_skipped_summary(&export.skipped, output);
            print_report(&result.report, output);
            output.success(format!(
                "Wrote {} movies ({} watch events, {} layout) to {}",
                result.payload.movies.len(),
                result.payload.event_count(),
                layout,
                config.files.output.display()
            ));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let skipped = skipped_counts(&export.skipped);
            output.json(&json!({
                "success": true,
                "input": config.files.input.display().to_string(),
                "output": config.files.output.display().to_string(),
                "layout": layout.to_string(),
                "rows_read": export.rows_read,
                "rows_skipped": skipped,
                "movies_written": result.payload.movies.len(),
                "watch_events_written": result.payload.event_count(),
                "report": result.report,
            }));
        }
    }

    Ok(())
}

fn skipped_counts(skipped: &[SkippedRecord]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for record in skipped {
        *counts.entry(record.reason.category()).or_insert(0) += 1;
    }
    counts
}

fn print_skipped_summary(skipped: &[SkippedRecord], output: &Output) {
    let counts = skipped_counts(skipped);
    if counts.is_empty() {
        return;
    }
    let parts: Vec<String> = counts.iter().map(|(category, n)| format!("{}: {}", category, n)).collect();
    output.info(format!("Skipped {} export rows ({})", skipped.len(), parts.join(", ")));

    let malformed: Vec<&SkippedRecord> = skipped
        .iter()
        .filter(|s| matches!(s.reason, SkipReason::Malformed { .. }))
        .collect();
    for record in malformed.iter().take(10) {
        output.warn(format!("Row {}: {}", record.row, record.reason));
    }
    if malformed.len() > 10 {
        output.warn(format!("... and {} more malformed rows", malformed.len() - 10));
    }
}

fn print_report(report: &ConversionReport, output: &Output) {
    output.info(format!(
        "{} watch events, {} movies: {} resolved ({} from cache), {} unresolved, {} repeated events collapsed",
        report.events_read,
        report.groups,
        report.resolved,
        report.cache_hits,
        report.unresolved.len(),
        report.duplicate_events
    ));

    if !report.fallback.is_empty() {
        output.println("");
        output.warn(format!(
            "{} IMDb ids were found by title search, please double-check them:",
            report.fallback.len()
        ));
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(vec!["Title", "IMDb", "Via", "TV Time"]);
        for entry in &report.fallback {
            table.add_row(vec![
                Cell::new(&entry.title),
                Cell::new(&entry.imdb_url),
                Cell::new(&entry.provider),
                Cell::new(entry.source_url.as_deref().unwrap_or("-")),
            ]);
        }
        output.println(table.to_string());
    }

    if !report.unresolved.is_empty() {
        output.println("");
        output.warn(format!(
            "{} movies ({} watch events) were left out, add them on Trakt by hand:",
            report.unresolved.len(),
            report.unresolved_events()
        ));
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(vec!["Title", "Watches", "Reason", "TV Time"]);
        for entry in &report.unresolved {
            table.add_row(vec![
                Cell::new(&entry.title),
                Cell::new(entry.watch_events),
                Cell::new(entry.reason.to_string()),
                Cell::new(entry.source_url.as_deref().unwrap_or("-")),
            ]);
        }
        output.println(table.to_string());
    } else if report.groups > 0 {
        output.println(format!("{}", "Every movie got an IMDb id.".green()));
    }
}
