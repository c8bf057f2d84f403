//! Streaming reader over a MediaWiki XML export.
//!
//! Yields one [`RawRecord`] per `<page>`, in document order. Elements are
//! matched by local name so every export schema version reads the same.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;

use bzip2::read::BzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

const READ_BUFFER: usize = 1024 * 1024;

/// One article as read from the dump. `body` is raw markup, absent when the
/// page has no revision text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub title: String,
    pub body: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("failed to read dump: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed dump XML near byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Text,
}

#[derive(Debug, Default)]
struct PartialPage {
    title: Option<String>,
    body: Option<String>,
    revisions: usize,
}

impl PartialPage {
    fn into_record(self) -> RawRecord {
        let title = self.title.unwrap_or_else(|| {
            warn!("Page without <title>, using empty title");
            String::new()
        });
        RawRecord {
            title,
            body: self.body,
        }
    }
}

pub struct DumpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl DumpReader<Box<dyn BufRead>> {
    /// Open a dump file; `.bz2` files are decompressed on the fly.
    pub fn open(path: &Path) -> Result<Self, DumpError> {
        let file = File::open(path)?;
        let is_bz2 = path.extension().is_some_and(|ext| ext == "bz2");
        let inner: Box<dyn BufRead> = if is_bz2 {
            Box::new(BufReader::with_capacity(READ_BUFFER, BzDecoder::new(file)))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER, file))
        };
        debug!("Opened dump {} (bz2: {})", path.display(), is_bz2);
        Ok(Self::new(inner))
    }
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(8192),
            done: false,
        }
    }

    /// Read events until the next `</page>` closes. `Ok(None)` at end of input.
    fn next_record(&mut self) -> Result<Option<RawRecord>, DumpError> {
        let mut page: Option<PartialPage> = None;
        let mut field: Option<Field> = None;
        let mut text = String::new();

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(DumpError::Xml {
                        position: self.reader.buffer_position() as u64,
                        source,
                    })
                }
            };

            match event {
                Event::Start(e) => {
                    let name = e.local_name();
                    match name.as_ref() {
                        b"page" => page = Some(PartialPage::default()),
                        b"title" => {
                            if page.as_ref().is_some_and(|p| p.title.is_none()) {
                                field = Some(Field::Title);
                                text.clear();
                            }
                        }
                        b"revision" => {
                            if let Some(p) = page.as_mut() {
                                p.revisions += 1;
                            }
                        }
                        b"text" => {
                            // Only the first revision's text counts.
                            if page.as_ref().is_some_and(|p| p.revisions <= 1 && p.body.is_none()) {
                                field = Some(Field::Text);
                                text.clear();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(e) if field.is_some() => {
                    let unescaped = e.unescape().map_err(quick_xml::Error::from);
                    match unescaped {
                        Ok(s) => text.push_str(&s),
                        Err(source) => {
                            return Err(DumpError::Xml {
                                position: self.reader.buffer_position() as u64,
                                source,
                            })
                        }
                    }
                }
                Event::CData(e) if field.is_some() => {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
                Event::End(e) => {
                    let name = e.local_name();
                    match (name.as_ref(), field) {
                        (b"title", Some(Field::Title)) => {
                            if let Some(p) = page.as_mut() {
                                p.title = Some(mem::take(&mut text));
                            }
                            field = None;
                        }
                        (b"text", Some(Field::Text)) => {
                            if let Some(p) = page.as_mut() {
                                p.body = Some(mem::take(&mut text));
                            }
                            field = None;
                        }
                        (b"page", _) => {
                            if let Some(p) = page.take() {
                                return Ok(Some(p.into_record()));
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => {
                    if page.is_some() {
                        warn!("Dump ended inside an unterminated <page>");
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<RawRecord, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// ── Tests ──
