//! Full-screen image viewer state.
//!
//! Opening the viewer remembers the background scroll offset; every way of
//! closing it hands that offset back so the caller can restore the view.

use crossterm::event::KeyCode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageViewer {
    image: Option<String>,
    saved_scroll: u16,
}

impl ImageViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    /// Image currently shown.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Opens `url`, remembering the background scroll offset.
    ///
    /// Opening while already open swaps the image and keeps the first offset.
    pub fn open(&mut self, url: impl Into<String>, scroll_offset: u16) {
        if !self.is_open() {
            self.saved_scroll = scroll_offset;
        }
        self.image = Some(url.into());
    }

    /// Closes the viewer and returns the scroll offset to restore.
    pub fn close(&mut self) -> Option<u16> {
        self.image.take().map(|_| self.saved_scroll)
    }

    /// Escape (or `q`) closes the viewer; other keys are ignored.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<u16> {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.close(),
            _ => None,
        }
    }

    /// A click outside the image closes the viewer.
    pub fn click_background(&mut self) -> Option<u16> {
        self.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_closes_and_restores_scroll() {
        let mut viewer = ImageViewer::new();
        viewer.open("http://h/a.png", 42);
        assert!(viewer.is_open());

        assert_eq!(viewer.handle_key(KeyCode::Enter), None);
        assert!(viewer.is_open());

        assert_eq!(viewer.handle_key(KeyCode::Esc), Some(42));
        assert!(!viewer.is_open());
    }

    #[test]
    fn test_background_click_closes() {
        let mut viewer = ImageViewer::new();
        viewer.open("http://h/a.png", 3);
        viewer.open("http://h/b.png", 99);

        assert_eq!(viewer.image(), Some("http://h/b.png"));
        assert_eq!(viewer.click_background(), Some(3));
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let mut viewer = ImageViewer::new();
        assert_eq!(viewer.close(), None);
        assert_eq!(viewer.handle_key(KeyCode::Esc), None);
    }
}
