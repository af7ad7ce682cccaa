//! Archive assembly for successfully downloaded documents.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::DownloadResult;
use crate::pipeline::PipelineError;

/// Bundle the `Success` results into one zip at `archive_path`.
///
/// Entry names are the local file names, which were assigned uniquely before
/// download, so archive contents depend only on which downloads succeeded.
/// Zero successes is a packaging failure, never a silently empty archive.
pub fn build_archive(
    results: &[DownloadResult],
    archive_path: &Path,
) -> Result<PathBuf, PipelineError> {
    let successes: Vec<&DownloadResult> = results.iter().filter(|r| r.is_success()).collect();

    if successes.is_empty() {
        return Err(PipelineError::Packaging(
            "no documents were downloaded successfully".to_string(),
        ));
    }

    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for result in &successes {
        let path = result
            .local_path
            .as_ref()
            .expect("success results always carry a path");

        let entry_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PipelineError::Packaging(format!("unrepresentable file name: {}", path.display()))
            })?;

        writer
            .start_file(entry_name, options)
            .map_err(|e| PipelineError::Packaging(format!("zip entry failed: {}", e)))?;

        let mut source = File::open(path)?;
        io::copy(&mut source, &mut writer)?;
    }

    writer
        .finish()
        .map_err(|e| PipelineError::Packaging(format!("zip finish failed: {}", e)))?;

    tracing::info!(
        entries = successes.len(),
        archive = %archive_path.display(),
        "archive assembled"
    );

    Ok(archive_path.to_path_buf())
}
