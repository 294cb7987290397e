use std::path::PathBuf;

use textorizer_core::RegionFileError;

/// Failures a user can run into, one variant per category.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Cannot open {}", path.display())]
    Open {
        path: PathBuf,
        source: pdf::PdfError,
    },

    #[error("Cannot load regions from {}", path.display())]
    LoadRegions {
        path: PathBuf,
        source: RegionFileError,
    },

    #[error("Cannot save regions to {}", path.display())]
    SaveRegions {
        path: PathBuf,
        source: RegionFileError,
    },
}
