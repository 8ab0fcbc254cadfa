//! Rendered-document artifact: the plain-text rendering compiled to PDF with
//! the embedded typst engine.
//!
//! The document text never passes through the typst parser. The main source
//! only `read`s it from an in-memory file, so arbitrary repository content
//! needs no escaping.

use std::sync::OnceLock;

use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::layout::PagedDocument;
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook, FontInfo};
use typst::utils::LazyHash;
use typst::{Library, World};

use crate::error::{Result, ServiceError};

const MAIN_SOURCE: &str = r#"#set page(paper: "a4", margin: 1.5cm)
#set text(size: 8pt)
#heading(read("/title.txt"))
#raw(read("/document.txt"), block: true)
"#;

/// Compiles `text` into a PDF titled `title`
///
/// Compilation is CPU-bound and runs on the blocking pool.
pub async fn render_pdf(title: &str, text: &str) -> Result<Vec<u8>> {
    let title = title.to_string();
    let text = text.to_string();
    tokio::task::spawn_blocking(move || compile_pdf(title, text))
        .await
        .map_err(|e| ServiceError::Render(format!("render task failed: {}", e)))?
}

fn compile_pdf(title: String, text: String) -> Result<Vec<u8>> {
    let world = DocumentWorld::new(title, text);
    let result = typst::compile::<PagedDocument>(&world);

    let document = result.output.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|d| d.message.to_string()).collect();
        ServiceError::Render(messages.join("; "))
    })?;

    typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default()).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|d| d.message.to_string()).collect();
        ServiceError::Render(messages.join("; "))
    })
}

struct FontSet {
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
}

/// Fonts bundled with typst, loaded once per process
fn font_set() -> &'static FontSet {
    static FONTS: OnceLock<FontSet> = OnceLock::new();
    FONTS.get_or_init(|| {
        let mut book = FontBook::new();
        let mut fonts = Vec::new();
        for data in typst_assets::fonts() {
            let bytes = Bytes::new(data);
            for (i, info) in FontInfo::iter(&bytes).enumerate() {
                // Book and font indices must stay aligned
                if let Some(font) = Font::new(bytes.clone(), i as u32) {
                    book.push(info);
                    fonts.push(font);
                }
            }
        }
        FontSet {
            book: LazyHash::new(book),
            fonts,
        }
    })
}

fn library() -> &'static LazyHash<Library> {
    static LIBRARY: OnceLock<LazyHash<Library>> = OnceLock::new();
    LIBRARY.get_or_init(|| LazyHash::new(Library::default()))
}

/// In-memory world: one main source and two readable text files
struct DocumentWorld {
    main: Source,
    title_id: FileId,
    title: Bytes,
    document_id: FileId,
    document: Bytes,
}

impl DocumentWorld {
    fn new(title: String, text: String) -> Self {
        let main_id = FileId::new(None, VirtualPath::new("/main.typ"));
        Self {
            main: Source::new(main_id, MAIN_SOURCE.to_string()),
            title_id: FileId::new(None, VirtualPath::new("/title.txt")),
            title: Bytes::new(title.into_bytes()),
            document_id: FileId::new(None, VirtualPath::new("/document.txt")),
            document: Bytes::new(text.into_bytes()),
        }
    }

    fn not_found(id: FileId) -> FileError {
        FileError::NotFound(id.vpath().as_rootless_path().to_path_buf())
    }
}

impl World for DocumentWorld {
    fn library(&self) -> &LazyHash<Library> {
        library()
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &font_set().book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(Self::not_found(id))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        if id == self.document_id {
            Ok(self.document.clone())
        } else if id == self.title_id {
            Ok(self.title.clone())
        } else {
            Err(Self::not_found(id))
        }
    }

    fn font(&self, index: usize) -> Option<Font> {
        font_set().fonts.get(index).cloned()
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        use chrono::{Datelike, Duration, Utc};
        let now = Utc::now() + Duration::hours(offset.unwrap_or(0));
        Datetime::from_ymd(now.year(), now.month() as u8, now.day() as u8)
    }
}
