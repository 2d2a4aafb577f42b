//! Terminal output for cart: download spinner and colored summaries.
//!
//! Uses `indicatif` for the progress spinner and `console` for styling.
//! Everything goes to stderr so stdout stays clean for piping artifact
//! listings.

use std::path::Path;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::circle::{Artifact, find_artifact};

/// Spinner shown while an artifact streams to disk.
pub struct DownloadProgress {
    pb: ProgressBar,
    green: Style,
}

impl DownloadProgress {
    /// Starts the spinner for `name`. Hidden when `visible` is false.
    pub fn start(name: &str, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let pb = ProgressBar::with_draw_target(None, target);
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} Downloading {msg} {bytes} ({bytes_per_sec})")
        {
            pb.set_style(style);
        }
        pb.set_message(name.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
        }
    }

    /// Records the running byte total.
    pub fn update(&self, written: u64) {
        self.pb.set_position(written);
    }

    /// Clears the spinner and prints the final summary.
    pub fn finish(&self, name: &str, written: u64, dest: &Path) {
        self.pb.finish_and_clear();
        eprintln!(
            "  {} Wrote {name} ({written} bytes) to {}",
            self.green.apply_to("✓"),
            dest.display()
        );
    }

    /// Clears the spinner after a failed download.
    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}

/// Prints each artifact url on stdout, marking the one `wanted` selects.
pub fn print_artifacts(artifacts: &[Artifact], wanted: Option<&str>) {
    let cyan = Style::new().cyan().bold();
    for (artifact, selected) in selections(artifacts, wanted) {
        if selected {
            println!("{} {}", cyan.apply_to("*"), artifact.url);
        } else {
            println!("  {}", artifact.url);
        }
    }
}

/// Pairs each artifact with whether it is the one that would be downloaded.
fn selections<'a>(artifacts: &'a [Artifact], wanted: Option<&str>) -> Vec<(&'a Artifact, bool)> {
    let chosen = wanted.and_then(|name| find_artifact(artifacts, name));
    artifacts
        .iter()
        .map(|a| (a, chosen.is_some_and(|c| std::ptr::eq(a, c))))
        .collect()
}

/// Reports a dry run that found its artifact.
pub fn dry_run(name: &str) {
    let yellow = Style::new().yellow();
    eprintln!("  {} dry run: found {name}, skipped download", yellow.apply_to("↷"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_progress_tracks_position() {
        let progress = DownloadProgress::start("out.tar.gz", false);
        progress.update(512);
        assert_eq!(progress.pb.position(), 512);
        progress.abandon();
        assert!(progress.pb.is_finished());
    }

    #[test]
    fn only_the_downloaded_artifact_is_selected() {
        let artifacts = vec![
            Artifact {
                path: "linux/app.tar.gz".into(),
                url: "https://a.example/0/linux/app.tar.gz".into(),
            },
            Artifact {
                path: "notes.txt".into(),
                url: "https://a.example/0/notes.txt".into(),
            },
            Artifact {
                path: "darwin/app.tar.gz".into(),
                url: "https://a.example/0/darwin/app.tar.gz".into(),
            },
        ];
        let marks: Vec<bool> = selections(&artifacts, Some("app.tar.gz"))
            .into_iter()
            .map(|(_, selected)| selected)
            .collect();
        assert_eq!(marks, vec![true, false, false]);

        assert!(selections(&artifacts, None).iter().all(|(_, s)| !s));
        assert!(selections(&artifacts, Some("missing")).iter().all(|(_, s)| !s));
    }
}
