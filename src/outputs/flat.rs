//! Flat CSV exports of accepted articles, and loading them back.
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── independent.csv     # one file per source id
//! ├── cnn.csv
//! ├── ...
//! └── all_articles.csv    # every accepted article, ingestion order
//! ```
//!
//! Every file carries the header
//! `newspaper,category,title,url,content,date_scraped`. Fields containing a
//! comma, quote, or line break are quoted, with embedded quotes doubled.
//!
//! # Import
//!
//! [`read_articles`] accepts files written here and hand-edited ones. A
//! missing `newspaper` column defaults to `Unknown` and a missing
//! `date_scraped` column to the run date. Category values that are not an
//! exact match get one lenient retry (any casing, URL slugs such as
//! `sport`). Anything still invalid fails the import with
//! [`NewsError::Schema`]. Rows with less than 50 characters of content are
//! skipped.

use crate::error::{NewsError, Result};
use crate::models::{Article, ArticleLink, Category, DATE_FORMAT};
use crate::scrapers::pipeline::IngestionReport;
use crate::utils::write_atomic;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Column order of every flat export.
pub const HEADER: [&str; 6] = [
    "newspaper",
    "category",
    "title",
    "url",
    "content",
    "date_scraped",
];

/// File name of the combined export.
pub const COMBINED_FILE: &str = "all_articles.csv";

const DEFAULT_NEWSPAPER: &str = "Unknown";

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render articles as CSV text, header included.
pub fn render_csv<'a>(articles: impl IntoIterator<Item = &'a Article>) -> String {
    let mut output = HEADER.join(",");
    output.push('\n');

    for article in articles {
        let row = [
            quote(&article.newspaper),
            quote(article.category.as_str()),
            quote(&article.title),
            quote(&article.url),
            quote(&article.content),
            article.date_string(),
        ];
        output.push_str(&row.join(","));
        output.push('\n');
    }

    output
}

/// Write one CSV per source plus the combined file into `dir`.
///
/// Sources without accepted articles still get a header-only file.
/// Returns the paths written, combined file last.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn write_flat_exports(report: &IngestionReport, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(report.sources.len() + 1);

    for source in &report.sources {
        let path = dir.join(format!("{}.csv", source.source_id));
        write_atomic(&path, render_csv(&source.articles).as_bytes()).await?;
        info!(
            source = %source.source_id,
            newspaper = %source.newspaper,
            count = source.articles.len(),
            path = %path.display(),
            "Saved source articles"
        );
        written.push(path);
    }

    let combined = dir.join(COMBINED_FILE);
    write_atomic(&combined, render_csv(report.articles()).as_bytes()).await?;
    if report.is_empty() {
        warn!(path = %combined.display(), "No articles accepted; wrote header-only export");
    } else {
        info!(count = report.len(), path = %combined.display(), "Saved combined articles");
    }
    written.push(combined);

    Ok(written)
}

/// Split CSV text into records. Quoted fields may span lines.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(NewsError::Schema("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    // Blank lines carry no data.
    records.retain(|r| !(r.len() == 1 && r[0].trim().is_empty()));
    Ok(records)
}

/// Where each required column lives, after defaults were applied.
struct Columns {
    newspaper: Option<usize>,
    category: usize,
    title: usize,
    url: usize,
    content: usize,
    date_scraped: Option<usize>,
}

impl Columns {
    fn locate(header: &[String]) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| NewsError::Schema(format!("missing required column `{name}`")))
        };

        let newspaper = find("newspaper");
        if newspaper.is_none() {
            warn!(default = DEFAULT_NEWSPAPER, "Column `newspaper` missing; filling default");
        }
        let date_scraped = find("date_scraped");
        if date_scraped.is_none() {
            warn!("Column `date_scraped` missing; using the run date");
        }

        Ok(Self {
            newspaper,
            category: require("category")?,
            title: require("title")?,
            url: require("url")?,
            content: require("content")?,
            date_scraped,
        })
    }
}

fn parse_category(raw: &str, row: usize) -> Result<Category> {
    raw.parse::<Category>().or_else(|_| {
        Category::parse_lenient(raw).ok_or_else(|| {
            NewsError::Schema(format!("row {row}: unknown category `{raw}`"))
        })
    })
}

fn parse_date(raw: &str, row: usize, run_date: NaiveDate) -> Result<NaiveDate> {
    if raw.trim().is_empty() {
        return Ok(run_date);
    }
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| NewsError::Schema(format!("row {row}: bad date_scraped `{raw}`: {e}")))
}

/// Load a combined flat export, validating and remediating as described above.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_articles(path: &Path, run_date: NaiveDate) -> Result<Vec<Article>> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| NewsError::io(path, e))?;
    let articles = parse_articles(&text, run_date)?;
    info!(count = articles.len(), "Loaded articles");
    Ok(articles)
}

fn parse_articles(text: &str, run_date: NaiveDate) -> Result<Vec<Article>> {
    let mut records = parse_records(text)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| NewsError::Schema("file is empty; expected a header row".to_string()))?;
    let columns = Columns::locate(&header)?;

    let mut articles = Vec::new();
    for (i, record) in records.enumerate() {
        // Row numbers count the header as row 1.
        let row = i + 2;
        if record.len() != header.len() {
            return Err(NewsError::Schema(format!(
                "row {row}: expected {} fields, found {}",
                header.len(),
                record.len()
            )));
        }

        let newspaper = columns
            .newspaper
            .map(|c| record[c].trim())
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NEWSPAPER);
        let category = parse_category(&record[columns.category], row)?;
        let date = match columns.date_scraped {
            Some(c) => parse_date(&record[c], row, run_date)?,
            None => run_date,
        };

        let title = record[columns.title].trim();
        let url = record[columns.url].trim();
        if title.is_empty() || url.is_empty() {
            return Err(NewsError::Schema(format!("row {row}: empty title or url")));
        }

        let link = ArticleLink {
            url: url.to_string(),
            title: title.to_string(),
        };
        let content = record[columns.content].clone();
        match Article::accept(newspaper, category, link, content, date, Article::MIN_CONTENT_CHARS) {
            Ok(article) => articles.push(article),
            Err(rejection) => warn!(
                row,
                url = %rejection.link.url,
                chars = rejection.content_chars,
                "Skipping row with too little content"
            ),
        }
    }

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, RunContext};
    use crate::registry::SourceRegistry;
    use crate::scrapers::pipeline::{SourceArticles, ingest_all};
    use crate::scrapers::testing::StubFetcher;
    use std::time::Duration;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 8).unwrap()
    }

    fn article(newspaper: &str, url: &str, content: &str) -> Article {
        Article {
            newspaper: newspaper.to_string(),
            category: Category::ArtsCultureCelebrities,
            title: "Gallery opens, crowds \"delighted\"".to_string(),
            url: url.to_string(),
            content: content.to_string(),
            date_scraped: date(),
        }
    }

    fn long(text: &str) -> String {
        format!("{text} {}", "lorem ipsum ".repeat(6))
    }

    #[test]
    fn test_render_quotes_awkward_fields() {
        let csv = render_csv(&[article("BBC", "https://bbc.com/a", "line one,\nline two")]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("newspaper,category,title,url,content,date_scraped")
        );
        assert_eq!(
            lines.next(),
            Some(r#"BBC,Arts/Culture/Celebrities,"Gallery opens, crowds ""delighted""",https://bbc.com/a,"line one,"#)
        );
        assert_eq!(lines.next(), Some("line two\",2025-05-08"));
    }

    #[test]
    fn test_written_rows_read_back_unchanged() {
        let articles = vec![
            article("BBC", "https://bbc.com/a", &long("quotes \"inside\", commas\nand lines")),
            article("CNN", "https://cnn.com/b", &long("plain")),
        ];
        let parsed = parse_articles(&render_csv(&articles), date()).unwrap();
        assert_eq!(parsed, articles);
    }

    #[test]
    fn test_missing_columns_get_defaults() {
        let run = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let text = format!("category,title,url,content\nsport,Derby,https://x/1,{}\n", long("goal"));
        let parsed = parse_articles(&text, run).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].newspaper, "Unknown");
        assert_eq!(parsed[0].category, Category::Sports);
        assert_eq!(parsed[0].date_scraped, run);
    }

    #[test]
    fn test_missing_required_column_fails() {
        let err = parse_articles("newspaper,category,title,content\n", date()).unwrap_err();
        assert!(matches!(err, NewsError::Schema(ref m) if m.contains("`url`")));
    }

    #[test]
    fn test_unknown_category_fails_after_remediation() {
        let text = format!(
            "newspaper,category,title,url,content,date_scraped\nBBC,Weather,T,https://x/1,{},2025-05-08\n",
            long("rain")
        );
        let err = parse_articles(&text, date()).unwrap_err();
        assert!(matches!(err, NewsError::Schema(ref m) if m.contains("row 2") && m.contains("Weather")));
    }

    #[test]
    fn test_short_rows_are_skipped_and_blank_lines_ignored() {
        let text = format!(
            "newspaper,category,title,url,content,date_scraped\r\n\r\nBBC,Business,A,https://x/a,too short,2025-05-08\r\nBBC,Business,B,https://x/b,{},2025-05-08\r\n",
            long("markets")
        );
        let parsed = parse_articles(&text, date()).unwrap();
        let urls: Vec<_> = parsed.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x/b"]);
    }

    #[test]
    fn test_ragged_row_and_empty_file_fail() {
        assert!(matches!(parse_articles("", date()), Err(NewsError::Schema(_))));
        let ragged = "newspaper,category,title,url,content,date_scraped\nBBC,Business\n";
        assert!(matches!(parse_articles(ragged, date()), Err(NewsError::Schema(_))));
        assert!(matches!(parse_records("a,\"open"), Err(NewsError::Schema(_))));
    }

    #[tokio::test]
    async fn test_empty_report_writes_header_only_files() {
        let tmp = tempfile::tempdir().unwrap();
        let report = IngestionReport {
            sources: vec![SourceArticles {
                source_id: "herald".to_string(),
                newspaper: "The Herald".to_string(),
                articles: vec![],
            }],
        };
        let written = write_flat_exports(&report, tmp.path()).await.unwrap();
        assert_eq!(
            written,
            vec![tmp.path().join("herald.csv"), tmp.path().join(COMBINED_FILE)]
        );
        for path in written {
            let text = std::fs::read_to_string(path).unwrap();
            assert_eq!(text, format!("{}\n", HEADER.join(",")));
        }
    }

    #[tokio::test]
    async fn test_rejected_article_is_absent_from_combined_export() {
        let registry = SourceRegistry::from_yaml_str(
            r#"
sources:
  - id: bbc
    name: BBC
    base_url: https://www.bbc.com
    categories:
      Business:
        - https://www.bbc.com/news/business
    article_selectors: [div.card]
    title_selectors: [h3 a]
    content_selectors: [article p]
"#,
        )
        .unwrap();
        let listing = r#"
            <div class="card"><h3><a href="/news/articles/short">Short one</a></h3></div>
            <div class="card"><h3><a href="/news/articles/long">Long one</a></h3></div>"#;
        let fetcher = StubFetcher::default()
            .with_page("https://www.bbc.com/news/business", listing)
            .with_page(
                "https://www.bbc.com/news/articles/short",
                format!("<article><p>{}</p></article>", "s".repeat(40)),
            )
            .with_page(
                "https://www.bbc.com/news/articles/long",
                format!("<article><p>{}</p></article>", "l".repeat(120)),
            );
        let config = RunConfig {
            pacing_min: Duration::ZERO,
            pacing_max: Duration::ZERO,
            ..RunConfig::default()
        };
        let ctx = RunContext::with_date(config, date());

        let report = ingest_all(&fetcher, &registry, &ctx).await;
        let tmp = tempfile::tempdir().unwrap();
        write_flat_exports(&report, tmp.path()).await.unwrap();

        let combined = tmp.path().join(COMBINED_FILE);
        let loaded = read_articles(&combined, date()).await.unwrap();
        let urls: Vec<_> = loaded.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://www.bbc.com/news/articles/long"]);
        assert!(tmp.path().join("bbc.csv").exists());
    }
}
