//! Subcommand implementations. Each loads its inputs, calls into the
//! library crates, writes outputs atomically and prints a summary to stderr.

use std::path::{Path, PathBuf};

use serde::Serialize;
use venuemap_config::{
    load_pipeline_config, tag_counties, tag_regions, ConfigSource, CountyTable, RegionTable,
};
use venuemap_io::csv::read_file_as_utf8;
use venuemap_io::{
    parse_venue_data, parse_venues, render_venue_data, save_venues, venues_to_csv,
    write_atomic_all, write_venue_data, VenueSheet,
};
use venuemap_recon::bounds::clean_out_of_bounds;
use venuemap_recon::merge::missing_keys;
use venuemap_recon::phone::{normalize_phone, PhonePatterns};
use venuemap_recon::{key_of, merge, CoverageStats, PipelineConfig, VenueRecord};

use crate::exit_codes::EXIT_MISSING_FOUND;
use crate::geocode::{build_chain, CredentialFlags};
use crate::pipeline::{run_pipeline, Tables};
use crate::CliError;

// ── Shared helpers ──────────────────────────────────────────────────

fn load_sheet(path: &Path) -> Result<VenueSheet, CliError> {
    let text = read_file_as_utf8(path).map_err(CliError::io)?;
    parse_venues(&text).map_err(|e| CliError::parse(format!("{}: {}", path.display(), e)))
}

/// CSV, or a venue-data.js artifact when the extension is `.js`.
fn load_records(path: &Path) -> Result<Vec<VenueRecord>, CliError> {
    let is_js = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("js"))
        .unwrap_or(false);
    if !is_js {
        return Ok(load_sheet(path)?.records);
    }

    let text = read_file_as_utf8(path).map_err(CliError::io)?;
    parse_venue_data(&text).map_err(|e| CliError::parse(format!("{}: {}", path.display(), e)))
}

fn save_sheet(sheet: &VenueSheet, path: &Path) -> Result<(), CliError> {
    save_venues(sheet, path).map_err(CliError::io)
}

fn write_artifact(records: &[VenueRecord], path: &Path) -> Result<CoverageStats, CliError> {
    write_venue_data(records, path).map_err(CliError::io)
}

/// Fail before any work when an output's directory is missing.
fn ensure_parent_dir(path: &Path) -> Result<(), CliError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => Err(CliError::io(format!(
            "cannot write {}: directory {} does not exist",
            path.display(),
            dir.display()
        ))),
        _ => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<(PipelineConfig, ConfigSource), CliError> {
    let (config, source) = load_pipeline_config(path).map_err(CliError::config)?;
    log::debug!("pipeline config: {}", source);
    Ok((config, source))
}

fn county_table() -> Result<CountyTable, CliError> {
    CountyTable::uk().map_err(|e| CliError::general(format!("county table: {}", e)))
}

fn print_coverage(stats: &CoverageStats, path: &Path) {
    eprintln!("Wrote {} venues to {}", stats.total, path.display());
    eprintln!(
        "  {} with coordinates ({:.1}%), {} need geocoding",
        stats.with_coordinates,
        stats.percent(),
        stats.without_coordinates
    );
}

// ── run ─────────────────────────────────────────────────────────────

pub struct RunArgs {
    pub input: PathBuf,
    pub supplement: Option<PathBuf>,
    pub csv_out: Option<PathBuf>,
    pub js_out: PathBuf,
    pub config: Option<PathBuf>,
    pub geocode: bool,
    pub json: bool,
    pub quiet: bool,
    pub credentials: CredentialFlags,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    if args.supplement.as_deref() == Some(args.input.as_path()) {
        return Err(CliError::usage("--supplement must differ from the input file"));
    }

    // Everything fatal happens before the first write.
    let (config, source) = load_config(args.config.as_deref())?;
    let base = load_sheet(&args.input)?;
    let supplement = args.supplement.as_deref().map(load_sheet).transpose()?;
    let counties = county_table()?;
    let regions = RegionTable::uk();
    let csv_out = args.csv_out.as_deref().unwrap_or(&args.input);
    if csv_out == args.js_out.as_path() {
        return Err(CliError::usage("--js-out must differ from the CSV output"));
    }
    ensure_parent_dir(csv_out)?;
    ensure_parent_dir(&args.js_out)?;

    let mut chain = if args.geocode {
        let chain = build_chain(&config, &args.credentials);
        if chain.enabled_backends().is_empty() {
            return Err(CliError::usage("no geocoding backend is enabled")
                .with_hint("pass --no-geocode, or enable a backend in pipeline.toml"));
        }
        log::info!("geocoding via {}", chain.enabled_backends().join(" -> "));
        Some(chain)
    } else {
        None
    };

    let tables = Tables {
        counties: &counties,
        regions: &regions,
    };
    let (sheet, mut report) = run_pipeline(base, supplement, &tables, &config.bounds, chain.as_mut());
    report.config_source = source.to_string();

    // Both files are replaced together or not at all.
    let csv_text = venues_to_csv(&sheet).map_err(CliError::general)?;
    let (js_text, _) = render_venue_data(&sheet.records).map_err(CliError::general)?;
    write_atomic_all(&[
        (csv_out, csv_text.as_bytes()),
        (args.js_out.as_path(), js_text.as_bytes()),
    ])
    .map_err(CliError::io)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("report serialization failed: {}", e)))?;
        println!("{}", json);
    }
    if !args.quiet {
        eprintln!("Run complete ({} venues in, {} out)", report.input_records, report.coverage.total);
        if report.restored > 0 || report.backfilled > 0 {
            eprintln!(
                "  restored:   {} (coordinates backfilled on {})",
                report.restored, report.backfilled
            );
        }
        if !report.cleared_out_of_bounds.is_empty() {
            eprintln!("  cleared:    {} out-of-bounds", report.cleared_out_of_bounds.len());
        }
        eprintln!("  phones:     {} normalized", report.phones_normalized);
        if args.geocode {
            eprintln!(
                "  geocoded:   {} of {} attempted",
                report.geocoded, report.geocode_attempted
            );
            for (backend, n) in &report.geocoded_by_backend {
                eprintln!("    {:<10} {}", backend, n);
            }
            if !report.ungeocoded.is_empty() {
                eprintln!("  ungeocoded: {}", report.ungeocoded.len());
                for name in report.ungeocoded.iter().take(10) {
                    eprintln!("    {}", name);
                }
                if report.ungeocoded.len() > 10 {
                    eprintln!("    ... and {} more", report.ungeocoded.len() - 10);
                }
            }
        }
        eprintln!("  csv:        {}", csv_out.display());
        print_coverage(&report.coverage, &args.js_out);
    }
    Ok(())
}

// ── lookup ──────────────────────────────────────────────────────────

pub fn cmd_lookup(
    address: String,
    config: Option<PathBuf>,
    json: bool,
    credentials: CredentialFlags,
) -> Result<(), CliError> {
    if address.trim().is_empty() {
        return Err(CliError::usage("address is empty"));
    }
    let (config, _) = load_config(config.as_deref())?;
    let mut chain = build_chain(&config, &credentials);

    match chain.resolve(&address) {
        Some(hit) => {
            if json {
                let out = serde_json::to_string_pretty(&hit)
                    .map_err(|e| CliError::general(e.to_string()))?;
                println!("{}", out);
            } else {
                println!("{:.6}, {:.6} ({})", hit.latitude, hit.longitude, hit.source);
            }
            Ok(())
        }
        None => Err(CliError::general(format!("no backend could geocode '{}'", address.trim()))
            .with_hint(format!(
                "enabled backends: {}",
                chain.enabled_backends().join(", ")
            ))),
    }
}

// ── regenerate ──────────────────────────────────────────────────────

pub fn cmd_regenerate(input: PathBuf, out: PathBuf, quiet: bool) -> Result<(), CliError> {
    let sheet = load_sheet(&input)?;
    let stats = write_artifact(&sheet.records, &out)?;
    if !quiet {
        print_coverage(&stats, &out);
    }
    Ok(())
}

// ── restore ─────────────────────────────────────────────────────────

pub fn cmd_restore(
    base: PathBuf,
    supplement: PathBuf,
    out: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let mut sheet = load_sheet(&base)?;
    let extra = load_sheet(&supplement)?;

    sheet.absorb_headers(&extra);
    let outcome = merge(std::mem::take(&mut sheet.records), &extra.records);
    sheet.records = outcome.records;

    let out = out.unwrap_or(base);
    save_sheet(&sheet, &out)?;
    if !quiet {
        eprintln!(
            "Restored {} venue(s), backfilled coordinates on {}; {} total in {}",
            outcome.added,
            outcome.backfilled,
            sheet.records.len(),
            out.display()
        );
    }
    Ok(())
}

// ── missing ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MissingVenue<'a> {
    key: String,
    name: &'a str,
    town: &'a str,
    postcode: &'a str,
}

pub fn cmd_missing(
    original: PathBuf,
    current: PathBuf,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let original_records = load_records(&original)?;
    let current_records = load_records(&current)?;
    let missing = missing_keys(&original_records, &current_records);

    let rows: Vec<MissingVenue> = missing
        .iter()
        .map(|r| MissingVenue {
            key: key_of(r).to_string(),
            name: &r.name,
            town: &r.town,
            postcode: &r.postcode,
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", out);
    } else {
        for row in &rows {
            println!("{}\t{}\t{}\t{}", row.key, row.name, row.town, row.postcode);
        }
    }
    if !quiet {
        eprintln!(
            "{} of {} venue(s) in {} are missing from {}",
            rows.len(),
            original_records.len(),
            original.display(),
            current.display()
        );
    }

    if rows.is_empty() {
        Ok(())
    } else {
        Err(CliError::silent(EXIT_MISSING_FOUND))
    }
}

// ── clean ───────────────────────────────────────────────────────────

pub fn cmd_clean(
    input: PathBuf,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let (config, _) = load_config(config.as_deref())?;
    let mut sheet = load_sheet(&input)?;

    let cleared = clean_out_of_bounds(&mut sheet.records, &config.bounds);

    let out = out.unwrap_or(input);
    save_sheet(&sheet, &out)?;
    if !quiet {
        eprintln!("Cleared {} out-of-bounds coordinate pair(s)", cleared.len());
        for name in &cleared {
            eprintln!("  {}", name);
        }
    }
    Ok(())
}

// ── phones ──────────────────────────────────────────────────────────

fn print_patterns(label: &str, p: &PhonePatterns) {
    eprintln!("{}:", label);
    eprintln!("  starts with 0:   {}", p.starts_with_0);
    eprintln!("  starts with 44:  {}", p.starts_with_44);
    eprintln!("  starts with +44: {}", p.starts_with_plus_44);
    eprintln!("  starts with 7:   {}", p.starts_with_7);
    eprintln!("  empty:           {}", p.empty);
    eprintln!("  other:           {}", p.other);
}

pub fn cmd_phones(input: PathBuf, out: Option<PathBuf>, quiet: bool) -> Result<(), CliError> {
    let mut sheet = load_sheet(&input)?;

    let before = PhonePatterns::analyze(sheet.records.iter().map(|r| r.phone.as_str()));
    let mut changed = 0;
    for record in sheet.records.iter_mut() {
        let normalized = normalize_phone(&record.phone);
        if normalized != record.phone {
            log::debug!("{}: {} -> {}", record.name, record.phone, normalized);
            record.phone = normalized;
            changed += 1;
        }
    }
    let after = PhonePatterns::analyze(sheet.records.iter().map(|r| r.phone.as_str()));

    let out = out.unwrap_or(input);
    save_sheet(&sheet, &out)?;
    if !quiet {
        print_patterns("Before", &before);
        print_patterns("After", &after);
        eprintln!("Normalized {} phone number(s) in {}", changed, out.display());
    }
    Ok(())
}

// ── counties ────────────────────────────────────────────────────────

pub fn cmd_counties(input: PathBuf, out: Option<PathBuf>, quiet: bool) -> Result<(), CliError> {
    let mut sheet = load_sheet(&input)?;
    let counties = county_table()?;

    let histogram = tag_counties(&mut sheet.records, &counties);
    let other = tag_regions(&mut sheet.records, &RegionTable::uk());

    let out = out.unwrap_or(input);
    save_sheet(&sheet, &out)?;
    if !quiet {
        eprintln!("Tagged {} venue(s) in {}", sheet.records.len(), out.display());
        for (county, n) in histogram.iter().take(20) {
            eprintln!("  {:<28} {}", county, n);
        }
        if histogram.len() > 20 {
            eprintln!("  ... and {} more counties", histogram.len() - 20);
        }
        if other > 0 {
            eprintln!("{} venue(s) fall outside the regional groups", other);
        }
    }
    Ok(())
}
