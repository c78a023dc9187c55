use crate::index::{Hit, HitSource};
use serde_json::Value;
use std::fmt::Write as _;

/// Output format types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Cli,
    Json,
    Markdown,
    Csv,
    Names,
}

/// Flattened view of a hit for tabular output
struct Row<'a> {
    name: &'a str,
    title: &'a str,
    asset_type: &'a str,
    total: Option<&'a Value>,
    npm: Option<&'a Value>,
}

impl<'a> Row<'a> {
    fn from_hit(hit: &'a Hit) -> Self {
        let source = hit.source.as_ref();
        Self {
            name: source.and_then(HitSource::name).unwrap_or("-"),
            title: source.and_then(HitSource::title).unwrap_or("-"),
            asset_type: source.and_then(HitSource::asset_type).unwrap_or("-"),
            total: source.and_then(|s| s.total_downloads.as_ref()),
            npm: source.and_then(|s| s.npm_downloads.as_ref()),
        }
    }
}

fn count(n: Option<&Value>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

impl Format {
    /// Create format from string
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "md" | "markdown" => Self::Markdown,
            "csv" => Self::Csv,
            "names" => Self::Names,
            _ => Self::Cli,
        }
    }

    /// Print hits to stdout
    pub fn format_hits(&self, hits: &[Hit]) -> Result<(), anyhow::Error> {
        print!("{}", self.render_hits(hits)?);
        Ok(())
    }

    pub fn render_hits(&self, hits: &[Hit]) -> Result<String, anyhow::Error> {
        let rows: Vec<Row> = hits.iter().map(Row::from_hit).collect();
        let mut out = String::new();

        match self {
            Self::Json => {
                out.push_str(&serde_json::to_string_pretty(hits)?);
                out.push('\n');
            }
            Self::Cli => {
                writeln!(out, "Found {} results:", rows.len())?;
                writeln!(
                    out,
                    "{:<32} {:<10} {:>10} {:>10}  Title",
                    "Name", "Type", "Total", "npm"
                )?;
                writeln!(out, "{}", "-".repeat(90))?;
                for row in &rows {
                    writeln!(
                        out,
                        "{:<32} {:<10} {:>10} {:>10}  {}",
                        row.name,
                        row.asset_type,
                        count(row.total),
                        count(row.npm),
                        row.title
                    )?;
                }
            }
            Self::Markdown => {
                writeln!(out, "# Plugins")?;
                writeln!(out)?;
                writeln!(out, "Found {} results:", rows.len())?;
                writeln!(out)?;
                for (i, row) in rows.iter().enumerate() {
                    writeln!(out, "## {}. {}", i + 1, row.title)?;
                    writeln!(out, "- **Name**: {}", row.name)?;
                    writeln!(out, "- **Type**: {}", row.asset_type)?;
                    writeln!(out, "- **Downloads**: {}", count(row.total))?;
                    writeln!(out)?;
                }
            }
            Self::Csv => {
                writeln!(out, "name,asset_type,total_downloads,npm_downloads,title")?;
                for row in &rows {
                    writeln!(
                        out,
                        "{},{},{},{},{}",
                        escape_csv(row.name),
                        escape_csv(row.asset_type),
                        escape_csv(&row.total.map(|n| n.to_string()).unwrap_or_default()),
                        escape_csv(&row.npm.map(|n| n.to_string()).unwrap_or_default()),
                        escape_csv(row.title)
                    )?;
                }
            }
            Self::Names => {
                for row in &rows {
                    writeln!(out, "{}", row.name)?;
                }
            }
        }

        Ok(out)
    }
}

/// Quote a CSV cell when needed
fn escape_csv(s: &str) -> String {
    if s.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
