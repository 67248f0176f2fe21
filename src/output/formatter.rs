//! Result rendering
//!
//! Renders finished results as text, wide lines, JSON or CSV. Columns follow
//! the canonical algorithm order of the configuration.

use crate::config::{HashAlgorithm, OutputFormat};
use crate::error::Result;
use crate::hash::FileDigest;
use std::io::Write;

/// Renders results in one output format
pub struct Formatter {
    format: OutputFormat,
    algorithms: Vec<HashAlgorithm>,
}

impl Formatter {
    /// Create a formatter for the given format and enabled algorithms
    pub fn new(format: OutputFormat, algorithms: &[HashAlgorithm]) -> Self {
        let mut algorithms = algorithms.to_vec();
        algorithms.sort();
        algorithms.dedup();
        Self { format, algorithms }
    }

    /// Write every result
    pub fn write_all<W: Write>(&self, out: &mut W, results: &[FileDigest]) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                for result in results {
                    self.write_text(out, result)?;
                }
            }
            OutputFormat::Wide => {
                for result in results {
                    self.write_wide(out, result)?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, results)?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                self.write_csv_header(out)?;
                for result in results {
                    self.write_csv_row(out, result)?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Render everything into a string
    pub fn render(&self, results: &[FileDigest]) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_all(&mut buffer, results)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn label_width(&self) -> usize {
        self.algorithms.iter().map(|a| a.name().len()).max().unwrap_or(0)
    }

    fn write_text<W: Write>(&self, out: &mut W, result: &FileDigest) -> Result<()> {
        let width = self.label_width();
        writeln!(out, "{}", result.file())?;
        for &algorithm in &self.algorithms {
            if let Some(hex) = result.digest(algorithm) {
                writeln!(out, "  {:>width$} {}", algorithm.name(), hex, width = width)?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_wide<W: Write>(&self, out: &mut W, result: &FileDigest) -> Result<()> {
        write!(out, "{} {}", result.file(), result.bytes())?;
        for &algorithm in &self.algorithms {
            write!(out, " {}", result.digest(algorithm).unwrap_or("-"))?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_csv_header<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(out, "file,bytes")?;
        for algorithm in &self.algorithms {
            write!(out, ",{}", algorithm.key())?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_csv_row<W: Write>(&self, out: &mut W, result: &FileDigest) -> Result<()> {
        write!(out, "{},{}", csv_field(result.file()), result.bytes())?;
        for &algorithm in &self.algorithms {
            write!(out, ",{}", result.digest(algorithm).unwrap_or(""))?;
        }
        writeln!(out)?;
        Ok(())
    }
}

/// Quote a CSV field when it holds a separator, quote or line break
fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}

/// Print the supported algorithms, one per line
pub fn write_algorithm_list<W: Write>(out: &mut W) -> Result<()> {
    for algorithm in HashAlgorithm::ALL {
        writeln!(
            out,
            "{:<12} {:<12} {} bits",
            algorithm.key(),
            algorithm.name(),
            algorithm.output_size() * 8
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash_bytes, Strategy};

    const MD5_ABC: &str = "900150983cd24fb0d6963f7d28e17f72";
    const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    fn algorithms() -> Vec<HashAlgorithm> {
        vec![HashAlgorithm::Sha256, HashAlgorithm::Md5]
    }

    fn abc(name: &str) -> FileDigest {
        let digests = algorithms()
            .into_iter()
            .map(|a| hash_bytes(b"abc", a))
            .collect();
        FileDigest::new(name, 0, Strategy::WholeRead, 3, digests)
    }

    #[test]
    fn test_text() {
        let formatter = Formatter::new(OutputFormat::Text, &algorithms());
        let output = formatter.render(&[abc("abc.txt")]).unwrap();

        let expected = format!("abc.txt\n     MD5 {}\n  SHA256 {}\n\n", MD5_ABC, SHA256_ABC);
        assert_eq!(output, expected);
    }

    #[test]
    fn test_wide() {
        let formatter = Formatter::new(OutputFormat::Wide, &algorithms());
        let output = formatter.render(&[abc("a"), abc("b")]).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("a 3 {} {}", MD5_ABC, SHA256_ABC));
    }

    #[test]
    fn test_json() {
        let formatter = Formatter::new(OutputFormat::Json, &algorithms());
        let output = formatter.render(&[abc("abc.txt")]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["file"], "abc.txt");
        assert_eq!(value[0]["bytes"], 3);
        assert_eq!(value[0]["md5"], MD5_ABC);
        assert_eq!(value[0]["sha256"], SHA256_ABC);
    }

    #[test]
    fn test_json_empty() {
        let formatter = Formatter::new(OutputFormat::Json, &algorithms());
        assert_eq!(formatter.render(&[]).unwrap().trim(), "[]");
    }

    #[test]
    fn test_csv_quoting() {
        let formatter = Formatter::new(OutputFormat::Csv, &algorithms());
        let output = formatter.render(&[abc("plain"), abc("a,\"b\"")]).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "file,bytes,md5,sha256");
        assert_eq!(lines[1], format!("plain,3,{},{}", MD5_ABC, SHA256_ABC));
        assert!(lines[2].starts_with("\"a,\"\"b\"\"\",3,"));
    }

    #[test]
    fn test_algorithm_list() {
        let mut buffer = Vec::new();
        write_algorithm_list(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert_eq!(output.lines().count(), HashAlgorithm::ALL.len());
        assert!(output.contains("sha256"));
        assert!(output.contains("512 bits"));
    }
}
