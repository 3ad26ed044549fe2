//! Line protocol input source.
//!
//! Each line is `KIND>>ARGUMENT`:
//! - `activity>>touchstart`
//! - `select>>birth`
//! - `close>>`

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, trace};

use super::{InputError, InputSource, KioskInput};
use crate::domain::{ActivityKind, FormId};

/// Input source reading protocol lines from an async reader.
///
/// Reads through `Lines::next_line`, which is cancellation safe, so a
/// partially received line survives the runtime loop picking another branch.
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl LineSource<BufReader<Stdin>> {
    /// Read input lines from stdin.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InputSource for LineSource<R> {
    async fn next_input(&mut self) -> Result<Option<KioskInput>, InputError> {
        while let Some(line) = self.lines.next_line().await? {
            trace!("Received line: {}", line.trim());
            if let Some(input) = parse_input_line(&line) {
                return Ok(Some(input));
            }
            // Not an input we understand, read next line
        }

        debug!("Input stream ended (EOF)");
        Ok(None)
    }
}

/// Parse a single protocol line.
///
/// Returns `None` for blank, malformed, or unknown lines.
pub fn parse_input_line(line: &str) -> Option<KioskInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some((kind, data)) = line.split_once(">>") else {
        debug!("Ignoring malformed line (no >>): {}", line);
        return None;
    };

    match kind {
        "activity" => {
            let activity = ActivityKind::parse(data);
            if activity.is_none() {
                debug!("Ignoring unknown activity: {}", data);
            }
            activity.map(KioskInput::Activity)
        }
        "select" if !data.trim().is_empty() => Some(KioskInput::Select(FormId::new(data.trim()))),
        "close" => Some(KioskInput::Close),
        _ => {
            debug!("Ignoring input: {}", line);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activity() {
        assert_eq!(
            parse_input_line("activity>>touchstart"),
            Some(KioskInput::Activity(ActivityKind::TouchStart))
        );
        assert_eq!(
            parse_input_line("activity>>keypress\n"),
            Some(KioskInput::Activity(ActivityKind::KeyPress))
        );
        assert_eq!(parse_input_line("activity>>wheel"), None);
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(
            parse_input_line("select>>birth"),
            Some(KioskInput::Select(FormId::from("birth")))
        );
        assert_eq!(
            parse_input_line("select>> namechange \n"),
            Some(KioskInput::Select(FormId::from("namechange")))
        );
        assert_eq!(parse_input_line("select>>"), None);
    }

    #[test]
    fn test_parse_close() {
        assert_eq!(parse_input_line("close>>"), Some(KioskInput::Close));
        assert_eq!(parse_input_line("close>>button"), Some(KioskInput::Close));
    }

    #[test]
    fn test_parse_malformed_line() {
        assert_eq!(parse_input_line("no separator"), None);
        assert_eq!(parse_input_line(""), None);
        assert_eq!(parse_input_line("   \n"), None);
        assert_eq!(parse_input_line("scroll>>down"), None);
    }

    #[tokio::test]
    async fn test_line_source_skips_unknown_lines() {
        let input = b"activity>>click\nbogus\n\nselect>>death\nclose>>\n" as &[u8];
        let mut source = LineSource::new(input);

        assert_eq!(
            source.next_input().await.unwrap(),
            Some(KioskInput::Activity(ActivityKind::Click))
        );
        assert_eq!(
            source.next_input().await.unwrap(),
            Some(KioskInput::Select(FormId::from("death")))
        );
        assert_eq!(source.next_input().await.unwrap(), Some(KioskInput::Close));
        assert_eq!(source.next_input().await.unwrap(), None);
    }
}
