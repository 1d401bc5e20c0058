use crate::infra::build_services;
use clap::Args;
use quark::config::AppConfig;
use quark::error::AppError;
use quark::terms::{Term, TermImportSummary, TermImporter, TermListing};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct TermsImportArgs {
    /// CSV dump with `term,year,current` columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Include summer terms in the printed calendar
    #[arg(long)]
    pub(crate) include_summer: bool,
}

/// Validates a dump against the term rules without a running server.
pub(crate) fn run_terms_import(args: TermsImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (terms, _) = build_services(&config);

    let summary = TermImporter::from_path(&args.csv, terms.as_ref())?;
    let calendar = terms.list_terms(TermListing {
        include_future: true,
        include_summer: args.include_summer,
        reverse: false,
    })?;

    render_import(&args, &summary, &calendar);
    Ok(())
}

fn render_import(args: &TermsImportArgs, summary: &TermImportSummary, calendar: &[Term]) {
    println!("Term import: {}", args.csv.display());
    println!(
        "Imported {} terms ({} placeholder rows skipped)",
        summary.imported, summary.skipped_placeholders
    );

    match &summary.current {
        Some(term) => println!("Current term: {}", term.verbose_name()),
        None => println!("Current term: none"),
    }

    println!("\nCalendar");
    for term in calendar {
        let key = term.key.unwrap_or_else(|| term.computed_key());
        println!("- {} | {} | {}", key, term.url_name(), term.display_name());
    }
}
