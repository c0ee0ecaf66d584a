//! Command-line driver for `slidenote_core`.
//!
//! # Responsibility
//! - Load a deck, build its note sections and optionally annotate slides.
//! - Export the notes (or the full view) to a PDF without a desktop shell.

use clap::Parser;
use slidenote_core::{
    default_log_level, init_logging, ExportBridge, ExportRequest, LopdfRenderer, NoteSession,
    PresetSaveDialog, SessionConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "slidenote", version, about = "Slide deck note-taking companion")]
struct Args {
    /// PDF deck to take notes on.
    deck: PathBuf,

    /// Write the notes to this PDF file.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Export the whole view (page list and notes) instead of notes only.
    #[arg(long)]
    view: bool,

    /// Note for a slide, as `PAGE=TEXT`. Repeatable.
    #[arg(short, long = "note", value_parser = parse_note)]
    notes: Vec<(u32, String)>,

    /// Page render scale.
    #[arg(long)]
    scale: Option<f32>,

    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn parse_note(raw: &str) -> Result<(u32, String), String> {
    let (page, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PAGE=TEXT, got `{raw}`"))?;
    let page = page
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid page `{page}`: {err}"))?;
    Ok((page, text.to_string()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Some(dir) = &args.log_dir {
        if let Err(err) = init_logging(default_log_level(), &dir.to_string_lossy()) {
            eprintln!("logging disabled: {err}");
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    let config = SessionConfig::load_from_env().unwrap_or_else(|err| {
        eprintln!("using default config: {err}");
        SessionConfig::default()
    });
    let file_name = config.export_file_name.clone();
    let mut session = NoteSession::new(config);
    let renderer = LopdfRenderer::new();

    let bytes = std::fs::read(&args.deck)
        .map_err(|err| format!("cannot read `{}`: {err}", args.deck.display()))?;
    let report = session
        .load_deck(&renderer, &bytes)
        .await
        .map_err(|err| format!("cannot load `{}`: {err}", args.deck.display()))?;
    if let Some(scale) = args.scale {
        session.rescale(&renderer, scale).await;
    }
    println!(
        "deck={} pages={} scale={}",
        args.deck.display(),
        report.page_count,
        session.pdf_scale()
    );

    for (page, text) in &args.notes {
        if !session.click_page(*page).moved() {
            eprintln!("skipping note for page {page}: deck has {} page(s)", report.page_count);
            continue;
        }
        let caret = session.editor().selection().index;
        session.type_text(caret, text);
    }

    for (index, offset) in session.slide_indices().as_slice().iter().enumerate() {
        println!("slide {} offset={}", index + 1, offset);
    }

    let Some(out) = args.out else {
        return Ok(());
    };
    let request = if args.view {
        ExportRequest::View
    } else {
        ExportRequest::Notes {
            markup: session.notes_markup(),
        }
    };
    let view = session.capture_view();
    let bridge = ExportBridge::new(PresetSaveDialog::new(Some(out.clone())), move || {
        Some(view.clone())
    })
    .with_default_file_name(file_name);

    let reply = bridge.handle(request).await;
    if reply.outcome.success {
        println!("saved {}", out.display());
        Ok(())
    } else {
        Err(reply
            .outcome
            .error
            .unwrap_or_else(|| "export failed".to_string()))
    }
}
