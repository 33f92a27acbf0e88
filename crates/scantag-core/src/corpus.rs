//! Corpus of document titles
//!
//! One title per line. A first line reading `page_title` is the column
//! header of a database query export and is skipped, as are blank lines.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

const HEADER: &str = "page_title";

/// Streams titles from a corpus in batches
pub struct CorpusReader<R> {
    lines: Lines<R>,
    path: PathBuf,
    first_line: bool,
}

impl CorpusReader<BufReader<File>> {
    /// Open a corpus file
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).await.map_err(|source| Error::Corpus {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::with_path(BufReader::new(file), path.to_path_buf()))
    }
}

impl<R: AsyncBufRead + Unpin> CorpusReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_path(reader, PathBuf::from("<corpus>"))
    }

    fn with_path(reader: R, path: PathBuf) -> Self {
        Self {
            lines: reader.lines(),
            path,
            first_line: true,
        }
    }

    /// Next title, or `None` at the end of the corpus
    pub async fn next_title(&mut self) -> Result<Option<String>> {
        loop {
            let line = self.lines.next_line().await.map_err(|source| Error::Corpus {
                path: self.path.clone(),
                source,
            })?;
            let Some(line) = line else {
                return Ok(None);
            };

            let first = std::mem::replace(&mut self.first_line, false);
            let title = line.trim();
            if title.is_empty() || (first && title == HEADER) {
                continue;
            }
            return Ok(Some(title.to_string()));
        }
    }

    /// Up to `size` titles; empty at the end of the corpus
    pub async fn next_batch(&mut self, size: usize) -> Result<Vec<String>> {
        let mut batch = Vec::with_capacity(size);
        while batch.len() < size {
            match self.next_title().await? {
                Some(title) => batch.push(title),
                None => break,
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_skips_header_and_blank_lines() {
        let source = "page_title\nFoo\n\nBar_baz\r\n  \nQux\n";
        let mut corpus = CorpusReader::new(source.as_bytes());

        assert_eq!(corpus.next_batch(2).await.unwrap(), vec!["Foo", "Bar_baz"]);
        assert_eq!(corpus.next_batch(2).await.unwrap(), vec!["Qux"]);
        assert!(corpus.next_batch(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_header_only_skipped_on_first_line() {
        let source = "Foo\npage_title\n";
        let mut corpus = CorpusReader::new(source.as_bytes());
        assert_eq!(
            corpus.next_batch(10).await.unwrap(),
            vec!["Foo", "page_title"]
        );
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = CorpusReader::open(&dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(Error::Corpus { .. })));
    }

    #[tokio::test]
    async fn test_open_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("articles.txt");
        std::fs::write(&path, "page_title\nAlpha\nBeta\n").unwrap();

        let mut corpus = CorpusReader::open(&path).await.unwrap();
        assert_eq!(corpus.next_batch(500).await.unwrap(), vec!["Alpha", "Beta"]);
    }
}
