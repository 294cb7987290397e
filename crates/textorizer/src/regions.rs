use std::path::PathBuf;

use serde::Serialize;
use textorizer_core::Rect;

use crate::prelude::{println, *};
use crate::session::{MarginArgs, Session};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Path to the PDF file
    pdf: PathBuf,

    /// Region file to load
    regions: Option<PathBuf>,

    /// Only list this page (counting from 0)
    #[arg(short, long)]
    page: Option<usize>,

    #[clap(flatten)]
    margins: MarginArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct PageRegions {
    pub page: usize,
    pub regions: Vec<Rect>,
}

/// Regions of the selected pages, detecting the ones not in the file.
pub fn list(session: &mut Session, page: Option<usize>) -> Result<Vec<PageRegions>> {
    let margins = session.margins();
    let listing = session
        .pages(page)?
        .into_iter()
        .map(|page| PageRegions {
            page,
            regions: session
                .store
                .regions(page, &margins)
                .map(<[Rect]>::to_vec)
                .unwrap_or_default(),
        })
        .collect();
    Ok(listing)
}

pub fn run(app: App, _global: crate::Global) -> Result<()> {
    let mut session = Session::open(&app.pdf, app.regions.as_deref(), &app.margins)?;
    let listing = list(&mut session, app.page)?;

    if app.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row!["Page", "Region", "Left", "Top", "Right", "Bottom"]);
    for entry in &listing {
        if entry.regions.is_empty() {
            table.add_row(prettytable::row![entry.page, "-", "", "", "", ""]);
        }
        for (index, r) in entry.regions.iter().enumerate() {
            table.add_row(prettytable::row![entry.page, index, r.x0, r.y0, r.x1, r.y1]);
        }
    }
    table.printstd();

    Ok(())
}
