/// SVG library discovery, batch processing and change watching
use crate::generator::AtlasGenerator;
use indicatif::{ProgressBar, ProgressStyle};
use notify::{RecursiveMode, Watcher};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Drives atlas generation across every SVG document under a directory,
/// once as a batch and optionally continuously via filesystem events.
pub struct LibraryProcessor {
    generator: AtlasGenerator,
}

impl LibraryProcessor {
    pub fn new(generator: AtlasGenerator) -> Self {
        Self { generator }
    }

    /// Processes every discovered document once. A failing document is
    /// logged and skipped; the rest of the batch continues. Returns the
    /// number of rebuilt atlases.
    pub fn process_all(&self, dir: &Path) -> Result<usize, Box<dyn std::error::Error>> {
        let files = discover_svg_files(dir)?;
        log::info!("found {} SVG documents under {}", files.len(), dir.display());

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {pos}/{len} documents ({percent}%) {msg}")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏"),
        );
        pb.set_message("Building atlases");

        // Each build owns its whole state, so documents can be processed in
        // parallel with zero coordination.
        let rebuilt: usize = files
            .par_iter()
            .map(|path| {
                let updated = match self.generator.process_file(path) {
                    Ok(updated) => usize::from(updated),
                    Err(err) => {
                        log::error!("failed to process {}: {}", path.display(), err);
                        0
                    }
                };
                pb.inc(1);
                updated
            })
            .sum();

        pb.finish_with_message("Atlases built");
        Ok(rebuilt)
    }

    /// Watches `dir` recursively and reprocesses documents as they are
    /// created or modified. The staleness check absorbs the duplicate events
    /// editors emit per save. Runs until the process is terminated.
    pub fn watch(&self, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(dir, RecursiveMode::Recursive)?;
        log::info!("watching {} for changes", dir.display());

        for result in rx {
            let event = match result {
                Ok(event) => event,
                Err(err) => {
                    log::warn!("watch error: {}", err);
                    continue;
                }
            };
            if !matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_)
            ) {
                continue;
            }
            for path in event.paths {
                if !is_svg(&path) || !path.is_file() {
                    continue;
                }
                if let Err(err) = self.generator.process_file(&path) {
                    log::error!("failed to process {}: {}", path.display(), err);
                }
            }
        }
        Ok(())
    }
}

/// Recursively collects SVG files, sorted for a deterministic processing
/// order.
pub fn discover_svg_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    collect_svg_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_svg_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_svg_files(&path, files)?;
        } else if is_svg(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase() == "svg")
        .unwrap_or(false)
}
