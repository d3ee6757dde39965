use std::fmt::Write as _;
use std::path::PathBuf;

/// An output file written for one input.
pub struct Written {
    pub output: PathBuf,
    pub original_size: u64,
    pub processed_size: u64,
}

impl Written {
    pub fn savings_pct(&self) -> f64 {
        savings(self.original_size, self.processed_size)
    }
}

/// What happened to a single input file.
pub struct FileResult {
    pub input: PathBuf,
    pub outcome: Result<Written, String>,
}

impl FileResult {
    pub fn written(input: PathBuf, written: Written) -> Self {
        Self {
            input,
            outcome: Ok(written),
        }
    }

    pub fn failed(input: PathBuf, error: String) -> Self {
        Self {
            input,
            outcome: Err(error),
        }
    }
}

/// Batch report, in input order.
pub struct Report {
    results: Vec<FileResult>,
}

impl Report {
    pub fn new(mut results: Vec<FileResult>) -> Self {
        results.sort_by(|a, b| a.input.cmp(&b.input));
        Self { results }
    }

    fn written(&self) -> impl Iterator<Item = &Written> {
        self.results.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    pub fn total_original(&self) -> u64 {
        self.written().map(|w| w.original_size).sum()
    }

    pub fn total_processed(&self) -> u64 {
        self.written().map(|w| w.processed_size).sum()
    }

    pub fn success_count(&self) -> usize {
        self.written().count()
    }

    pub fn error_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// Per-file `input -> output` lines followed by the totals.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for r in &self.results {
            let _ = match &r.outcome {
                Ok(w) => writeln!(
                    out,
                    "  {} -> {} ({} -> {}, {:.1}%)",
                    r.input.display(),
                    w.output.display(),
                    format_size(w.original_size),
                    format_size(w.processed_size),
                    w.savings_pct()
                ),
                Err(err) => writeln!(out, "  ERROR {}: {}", r.input.display(), err),
            };
        }

        let _ = writeln!(
            out,
            "\n--- Summary ---\nFiles processed: {} | Errors: {}",
            self.success_count(),
            self.error_count()
        );
        if self.success_count() > 0 {
            let _ = writeln!(
                out,
                "Total: {} -> {} ({:.1}% reduction)",
                format_size(self.total_original()),
                format_size(self.total_processed()),
                savings(self.total_original(), self.total_processed())
            );
        }
        out
    }
}

fn savings(original: u64, processed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - processed as f64 / original as f64) * 100.0
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(input: &str, output: &str, original_size: u64, processed_size: u64) -> FileResult {
        FileResult::written(
            PathBuf::from(input),
            Written {
                output: PathBuf::from(output),
                original_size,
                processed_size,
            },
        )
    }

    #[test]
    fn test_totals_ignore_failures() {
        let report = Report::new(vec![
            ok("a.png", "out/1f3a.webp", 1000, 400),
            ok("b.png", "out/9c0d.webp", 1000, 600),
            FileResult::failed(PathBuf::from("c.png"), "boom".into()),
        ]);

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.total_original(), 2000);
        assert_eq!(report.total_processed(), 1000);
    }

    #[test]
    fn test_summary_maps_inputs_to_outputs() {
        let report = Report::new(vec![
            ok("photos/b.jpg", "out/9c0d.webp", 2048, 1024),
            ok("photos/a.jpg", "out/1f3a.webp", 1000, 250),
            FileResult::failed(PathBuf::from("photos/c.jpg"), "unsupported format".into()),
        ]);
        let summary = report.summary();
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines[0], "  photos/a.jpg -> out/1f3a.webp (1000 B -> 250 B, 75.0%)");
        assert_eq!(lines[1], "  photos/b.jpg -> out/9c0d.webp (2.0 KB -> 1.0 KB, 50.0%)");
        assert_eq!(lines[2], "  ERROR photos/c.jpg: unsupported format");
        assert!(summary.contains("Files processed: 2 | Errors: 1"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
