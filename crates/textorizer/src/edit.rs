use std::path::PathBuf;

use crate::prelude::{println, *};
use crate::session::{MarginArgs, Session};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Path to the PDF file
    pdf: PathBuf,

    /// Region file to edit; created when it does not exist
    regions: PathBuf,

    #[clap(flatten)]
    margins: MarginArgs,

    #[command(subcommand)]
    op: Op,
}

/// Page and region indices count from 0. Coordinates are in page space,
/// with the origin at the top-left corner of the page.
#[derive(Debug, Clone, PartialEq, Eq, clap::Subcommand)]
pub enum Op {
    /// Append a region to a page
    Add {
        page: usize,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },
    /// Replace a region
    Modify {
        page: usize,
        index: usize,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },
    /// Delete a region
    Remove { page: usize, index: usize },
    /// Move a region earlier (negative) or later (positive) in reading order
    Move {
        page: usize,
        index: usize,
        #[arg(allow_negative_numbers = true)]
        delta: isize,
    },
    /// Forget the regions of a page, or of every page, so they are detected again
    Clear { page: Option<usize> },
    /// Pin a page, or every page, to an empty region list
    Empty { page: Option<usize> },
    /// Print the index of the region containing a point, or -1
    Find { page: usize, x: i32, y: i32 },
}

/// What an edit has to report back.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The regions changed and should be saved.
    Changed,
    /// A region moved to this index.
    Moved(usize),
    /// Result of a lookup; nothing to save.
    Found(Option<usize>),
}

pub fn apply(session: &mut Session, op: Op) -> Outcome {
    let store = &mut session.store;
    match op {
        Op::Add {
            page,
            left,
            top,
            right,
            bottom,
        } => store.add_region(page, left, top, right, bottom),
        Op::Modify {
            page,
            index,
            left,
            top,
            right,
            bottom,
        } => store.modify_region(page, index, left, top, right, bottom),
        Op::Remove { page, index } => store.remove_region(page, index),
        Op::Move { page, index, delta } => {
            return Outcome::Moved(store.reorder_region(page, index, delta));
        }
        Op::Clear { page: Some(page) } => {
            if !store.clear_regions(page) {
                log::debug!("page {page}: no regions to clear");
            }
        }
        Op::Clear { page: None } => store.clear_all_regions(),
        Op::Empty { page: Some(page) } => store.mark_page_empty(page),
        Op::Empty { page: None } => store.mark_all_pages_empty(),
        Op::Find { page, x, y } => return Outcome::Found(store.find_region(page, x, y)),
    }
    Outcome::Changed
}

pub fn run(app: App, _global: crate::Global) -> Result<()> {
    let existing = app.regions.exists().then_some(app.regions.as_path());
    let mut session = Session::open(&app.pdf, existing, &app.margins)?;

    match apply(&mut session, app.op) {
        Outcome::Found(index) => {
            println!("{}", index.map_or(-1, |i| i as i64));
            return Ok(());
        }
        Outcome::Moved(index) => println!("{index}"),
        Outcome::Changed => {}
    }

    session.save(&app.regions)?;
    Ok(())
}
