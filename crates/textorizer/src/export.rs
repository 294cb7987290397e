use std::path::PathBuf;

use crate::prelude::{eprintln, *};
use crate::session::{MarginArgs, Session};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Path to the PDF file
    pdf: PathBuf,

    /// Region file to write
    #[arg(short, long)]
    output: PathBuf,

    #[clap(flatten)]
    margins: MarginArgs,

    /// Mark every page as having no regions instead of detecting them
    #[arg(long)]
    empty: bool,
}

/// Fill in every page, either by detection or as empty.
pub fn populate(session: &mut Session, empty: bool) {
    if empty {
        session.store.mark_all_pages_empty();
        return;
    }
    let margins = session.margins();
    for page in 0..session.store.page_count() {
        session.store.regions(page, &margins);
    }
}

pub fn run(app: App, _global: crate::Global) -> Result<()> {
    let mut session = Session::open(&app.pdf, None, &app.margins)?;
    populate(&mut session, app.empty);
    session.save(&app.output)?;

    eprintln!(
        "Saved the regions of {} pages to {}",
        session.store.page_count(),
        app.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use textorizer_core::schema::read_region_file;

    use super::*;
    use crate::session::tests::write_pdf;

    #[test]
    fn test_export_detected_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "Some words on a line");
        let out = dir.path().join("out.json");

        let margins = MarginArgs {
            left: Some(20),
            ..MarginArgs::default()
        };
        let mut session = Session::open(&pdf, None, &margins).unwrap();
        populate(&mut session, false);
        session.save(&out).unwrap();

        let data = read_region_file(&out).unwrap();
        assert_eq!(data["pages"]["0"], json!([[50, 92, 600, 102]]));
        assert_eq!(data["margins"]["left"], json!(20));
        assert_eq!(data["pdf"]["name"], json!("doc.pdf"));

        let mut session = Session::open(&pdf, None, &MarginArgs::default()).unwrap();
        populate(&mut session, true);
        session.save(&out).unwrap();
        assert_eq!(read_region_file(&out).unwrap()["pages"]["0"], json!([]));
    }
}
