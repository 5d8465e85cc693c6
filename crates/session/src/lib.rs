//! Viewer session state.
//!
//! The navigable state of the viewer lives here as a plain value: which
//! document is open, which page is current, and the zoom step. UI events
//! come in through [`Session::apply`], which returns the next state plus
//! the commands the boundary must execute (release a handle, render a page,
//! refresh the indicators). Nothing in this crate performs I/O.

use paperdesk_engine::DocumentHandle;

pub const ZOOM_MIN_PERCENT: u16 = 40;
pub const ZOOM_MAX_PERCENT: u16 = 300;
pub const ZOOM_STEP_PERCENT: u16 = 20;
pub const ZOOM_DEFAULT_PERCENT: u16 = 100;

/// A document the session currently holds. `page_count` is always at least 1;
/// the engine refuses to open page-less documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenDocument {
    pub handle: DocumentHandle,
    pub page_count: u32,
}

/// Discrete user actions, as delivered by the UI host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// The boundary opened a file successfully. A failed open never reaches
    /// the session; the prior state stays untouched.
    DocumentOpened { handle: DocumentHandle, page_count: u32 },
    NextPage,
    PreviousPage,
    /// 1-based page number, as entered by the user.
    GotoPage { page_number: i64 },
    ZoomIn,
    ZoomOut,
}

/// Side effects for the boundary to carry out, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ReleaseDocument(DocumentHandle),
    RenderPage { handle: DocumentHandle, page_index: u32, zoom_percent: u16 },
    UpdateIndicators { page_number: u32, page_count: u32, zoom_percent: u16 },
}

/// Result of applying an event: the next state and the commands it entails.
/// Events that clamp at a boundary produce the same state and no commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: Session,
    pub commands: Vec<Command>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PageInputError {
    #[error("\"{0}\" is not a page number")]
    NotANumber(String),
    #[error("page {page} is out of range (1-{page_count})")]
    OutOfRange { page: i64, page_count: u32 },
}

/// Parse the page-entry text. Range checking happens in [`Session::apply`],
/// which knows the page count.
pub fn parse_page_entry(text: &str) -> Result<i64, PageInputError> {
    text.trim().parse::<i64>().map_err(|_| PageInputError::NotANumber(text.trim().to_owned()))
}

/// The navigator state machine: `NoDocument` until the first successful
/// open, then `DocumentOpen` for the rest of the process lifetime. Every
/// navigation and zoom event is a self-loop; only a new `DocumentOpened`
/// replaces the document, releasing the prior handle exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    document: Option<OpenDocument>,
    page_index: u32,
    zoom_percent: u16,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self { document: None, page_index: 0, zoom_percent: ZOOM_DEFAULT_PERCENT }
    }

    pub fn document(&self) -> Option<OpenDocument> {
        self.document
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    /// 0-based index of the current page. 0 while no document is open.
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    /// Page count of the open document. 0 while no document is open.
    pub fn page_count(&self) -> u32 {
        self.document.map_or(0, |doc| doc.page_count)
    }

    pub fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    pub fn zoom_factor(&self) -> f32 {
        f32::from(self.zoom_percent) / 100.0
    }

    /// Apply one event. `Err` is only produced by out-of-range `GotoPage`;
    /// the caller reports it and keeps the old state.
    pub fn apply(&self, event: SessionEvent) -> Result<Transition, PageInputError> {
        match event {
            SessionEvent::DocumentOpened { handle, page_count } => {
                Ok(self.open_document(handle, page_count))
            }
            SessionEvent::NextPage => {
                let Some(doc) = self.document else { return Ok(self.unchanged()) };
                if self.page_index + 1 < doc.page_count {
                    Ok(self.at_page(self.page_index + 1))
                } else {
                    Ok(self.unchanged())
                }
            }
            SessionEvent::PreviousPage => {
                if self.document.is_none() || self.page_index == 0 {
                    return Ok(self.unchanged());
                }
                Ok(self.at_page(self.page_index - 1))
            }
            SessionEvent::GotoPage { page_number } => {
                let Some(doc) = self.document else { return Ok(self.unchanged()) };
                if page_number < 1 || page_number > i64::from(doc.page_count) {
                    return Err(PageInputError::OutOfRange {
                        page: page_number,
                        page_count: doc.page_count,
                    });
                }
                let target = (page_number - 1) as u32;
                if target == self.page_index {
                    Ok(self.unchanged())
                } else {
                    Ok(self.at_page(target))
                }
            }
            SessionEvent::ZoomIn => {
                let stepped = self.zoom_percent.saturating_add(ZOOM_STEP_PERCENT);
                Ok(self.at_zoom(stepped.min(ZOOM_MAX_PERCENT)))
            }
            SessionEvent::ZoomOut => {
                let stepped = self.zoom_percent.saturating_sub(ZOOM_STEP_PERCENT);
                Ok(self.at_zoom(stepped.max(ZOOM_MIN_PERCENT)))
            }
        }
    }

    /// Commands to (re)render the current page and refresh the indicators.
    /// Empty while no document is open.
    pub fn render_current(&self) -> Vec<Command> {
        let Some(doc) = self.document else { return Vec::new() };

        vec![
            Command::RenderPage {
                handle: doc.handle,
                page_index: self.page_index,
                zoom_percent: self.zoom_percent,
            },
            Command::UpdateIndicators {
                page_number: self.page_index + 1,
                page_count: doc.page_count,
                zoom_percent: self.zoom_percent,
            },
        ]
    }

    /// Teardown: the release command for the held handle, if any.
    pub fn into_release_command(self) -> Option<Command> {
        self.document.map(|doc| Command::ReleaseDocument(doc.handle))
    }

    fn open_document(&self, handle: DocumentHandle, page_count: u32) -> Transition {
        let next = Session {
            document: Some(OpenDocument { handle, page_count }),
            page_index: 0,
            zoom_percent: ZOOM_DEFAULT_PERCENT,
        };

        let mut commands = Vec::new();
        if let Some(previous) = self.document {
            commands.push(Command::ReleaseDocument(previous.handle));
        }
        commands.extend(next.render_current());

        Transition { session: next, commands }
    }

    fn at_page(&self, page_index: u32) -> Transition {
        let next = Session { page_index, ..self.clone() };
        let commands = next.render_current();
        Transition { session: next, commands }
    }

    fn at_zoom(&self, zoom_percent: u16) -> Transition {
        if self.document.is_none() || zoom_percent == self.zoom_percent {
            return self.unchanged();
        }
        let next = Session { zoom_percent, ..self.clone() };
        let commands = next.render_current();
        Transition { session: next, commands }
    }

    fn unchanged(&self) -> Transition {
        Transition { session: self.clone(), commands: Vec::new() }
    }
}
