use std::path::PathBuf;

use crate::prelude::{print, *};
use crate::session::{MarginArgs, Session};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Path to the PDF file
    pdf: PathBuf,

    /// Region file to load
    regions: Option<PathBuf>,

    /// Only convert this page (counting from 0)
    #[arg(short, long)]
    page: Option<usize>,

    /// Only convert this region of the page (counting from 0)
    #[arg(short, long, requires = "page")]
    region: Option<usize>,

    #[clap(flatten)]
    margins: MarginArgs,

    /// Join the wrapped lines of each paragraph
    #[arg(short, long)]
    concat_paragraphs: bool,

    /// Write the text to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Text of one region, one page, or the whole document.
pub fn convert(
    session: &mut Session,
    page: Option<usize>,
    region: Option<usize>,
    concat: bool,
) -> Result<String> {
    let Some(page) = page else {
        return Ok(session.store.convert_document_to_text(concat));
    };
    session.pages(Some(page))?;

    match region {
        Some(index) => {
            let margins = session.margins();
            let count = session.store.regions(page, &margins).map_or(0, <[_]>::len);
            if index >= count {
                bail!("Page {page} has {count} regions, there is no region {index}");
            }
            Ok(session.store.convert_region_to_text(page, index, concat))
        }
        None => Ok(session.store.convert_page_to_text(page, concat)),
    }
}

pub fn run(app: App, _global: crate::Global) -> Result<()> {
    let mut session = Session::open(&app.pdf, app.regions.as_deref(), &app.margins)?;
    let text = convert(&mut session, app.page, app.region, app.concat_paragraphs)?;

    match app.output {
        Some(path) => std::fs::write(&path, text)
            .wrap_err_with(|| f!("Cannot save text to {}", path.display()))?,
        None => print!("{text}"),
    }

    Ok(())
}
