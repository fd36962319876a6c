//! Terminal rendering of assistant replies.
//!
//! Each reveal frame erases the rows of the previous frame and prints the
//! re-formatted prefix in their place. Rows include soft wraps at the
//! terminal width.

use colored::{ColoredString, Colorize};
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;
use mira_interaction::{Affordance, Block, NoteKind, RenderSink, RichText, format_rich};
use std::collections::HashSet;
use std::io::{self, Stdout, Write};
use std::sync::Mutex;
use unicode_width::UnicodeWidthStr;

const SPEAKER: &str = "MIRA";
const FALLBACK_COLUMNS: u16 = 80;

#[derive(Default)]
pub struct TerminalSink {
    /// Rows above the cursor taken by the frame currently on screen.
    frame_rows: Mutex<u16>,
    hidden_images: Mutex<HashSet<String>>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self, url: &str) -> bool {
        self.hidden_images
            .lock()
            .map(|hidden| hidden.contains(url))
            .unwrap_or(false)
    }

    fn print_image(&self, image: Option<&str>) {
        if let Some(url) = image.filter(|url| !self.is_hidden(url)) {
            println!("     {}", format!("[image] {}", url).bright_black());
        }
    }

    fn write(&self, draw: impl FnOnce(&mut Stdout) -> io::Result<()>) {
        let mut stdout = io::stdout();
        if let Err(e) = draw(&mut stdout).and_then(|_| stdout.flush()) {
            tracing::debug!("[TerminalSink] Write failed: {}", e);
        }
    }
}

fn styled(rich: &RichText) -> String {
    rich.spans()
        .iter()
        .map(|span| {
            let mut text: ColoredString = span.text.as_str().into();
            if span.style.code {
                text = text.bright_yellow();
            }
            if span.style.bold {
                text = text.bold();
            }
            if span.style.italic {
                text = text.italic();
            }
            text.to_string()
        })
        .collect()
}

/// Screen rows `text` occupies when printed from column 0 on a terminal `columns` wide.
fn rendered_rows(text: &str, columns: u16) -> u16 {
    let columns = usize::from(columns.max(1));
    let rows: usize = text
        .split('\n')
        .map(|line| line.width().div_ceil(columns).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn note_label(kind: NoteKind) -> Option<&'static str> {
    match kind {
        NoteKind::Summary | NoteKind::Completion | NoteKind::CallToAction => None,
        NoteKind::Help => Some("Note"),
        NoteKind::ProTip => Some("Pro tip"),
    }
}

impl RenderSink for TerminalSink {
    fn prose_frame(&self, frame: &RichText, complete: bool) {
        let Ok(mut frame_rows) = self.frame_rows.lock() else {
            return;
        };
        let text = format!("{} {}", format!("{}:", SPEAKER).bright_blue().bold(), styled(frame));
        let columns = terminal::size().map(|(columns, _)| columns).unwrap_or(FALLBACK_COLUMNS);
        let rows = rendered_rows(&format!("{}: {}", SPEAKER, frame.plain_text()), columns);
        let previous = *frame_rows;

        self.write(|out| {
            if previous > 0 {
                queue!(out, MoveUp(previous))?;
            }
            queue!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
            write!(out, "{}", text.replace('\n', "\r\n"))?;
            if complete {
                writeln!(out)?;
            }
            Ok(())
        });

        *frame_rows = if complete { 0 } else { rows - 1 };
    }

    fn append_structured(&self, blocks: &[Block]) {
        for block in blocks {
            match block {
                Block::Heading(title) => println!("{}", title.bright_magenta().bold()),
                Block::Step {
                    number,
                    text,
                    image,
                } => {
                    println!("  {} {}", format!("{}.", number).bold(), styled(&format_rich(text)));
                    self.print_image(image.as_deref());
                }
                Block::ClarifiedStep {
                    number,
                    original,
                    image,
                } => {
                    if !original.is_empty() {
                        println!(
                            "  {}",
                            format!("Original step {}: {}", number, original).bright_black()
                        );
                    }
                    self.print_image(image.as_deref());
                }
                Block::Feature {
                    title,
                    description,
                    icon,
                } => {
                    let icon = icon.as_deref().unwrap_or("*");
                    println!("  {} {}", icon, title.bold());
                    if !description.is_empty() {
                        println!("    {}", description);
                    }
                }
                Block::Note { kind, text } => match note_label(*kind) {
                    Some(label) => println!("{} {}", format!("{}:", label).yellow(), text),
                    None if *kind == NoteKind::Completion => println!("{}", text.green()),
                    None => println!("{}", text.italic()),
                },
                // Printed with the numbered affordances.
                Block::Suggestions(_) => {}
            }
        }
    }

    fn bind_affordances(&self, affordances: &[Affordance]) {
        if affordances.is_empty() {
            return;
        }
        let mut image_index = 0;
        for (index, affordance) in affordances.iter().enumerate() {
            let hint = match affordance {
                Affordance::ViewImage(url) => {
                    image_index += 1;
                    if self.is_hidden(url) {
                        continue;
                    }
                    format!("/view {}", image_index)
                }
                Affordance::Suggest(_) | Affordance::ClarifyStep(_) => format!("/do {}", index + 1),
            };
            println!(
                "  {} {}",
                format!("[{}]", hint).cyan(),
                affordance.label().bright_white()
            );
        }
    }

    fn hide_image(&self, url: &str) {
        if let Ok(mut hidden) = self.hidden_images.lock() {
            hidden.insert(url.to_string());
        }
    }

    fn user_message(&self, text: &str) {
        println!("{}", format!("> {}", text).green());
    }
}
