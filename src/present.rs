//! Presentation surface.
//!
//! Renders controller state as text screens or JSON lines on a writer
//! (stdout in production).

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveTime, Timelike};
use serde::Serialize;

use crate::clock::Clock;
use crate::domain::FormCatalog;
use crate::view::{ViewController, ViewPhase};

const SCREEN_TITLE: &str = "가족관계 민원서식 작성 안내";
const SCREEN_HINT: &str = "원하시는 민원서식을 선택하시면 작성 안내서가 표시됩니다.";
const MODAL_HINT: &str = "아래 작성 예시를 참고하여 신고서를 작성해 주세요.";
const COUNTER_HINT: &str = "작성 후 7번 창구에 신고하세요";
const IDLE_NOTICE: &str = "잠시 후 메인화면으로 돌아갑니다";

/// Everything the display needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub phase: ViewPhase,
    pub form_id: Option<String>,
    pub modal_title: Option<String>,
    pub image: Option<PathBuf>,
    pub countdown_secs: Option<u64>,
    pub idle_notification_visible: bool,
    /// Wall-clock time shown in the main screen header.
    pub clock: String,
}

impl ViewSnapshot {
    /// Capture the current state of a controller.
    pub fn capture<C: Clock>(view: &ViewController<C>) -> Self {
        let state = view.state();
        let form = state.selected_form.as_ref();

        Self {
            phase: state.phase(),
            form_id: form.map(|f| f.id.as_str().to_string()),
            modal_title: form.map(crate::domain::FormDescriptor::modal_title),
            image: form.map(|f| f.image.clone()),
            countdown_secs: view.countdown_secs(),
            idle_notification_visible: state.idle_notification_visible,
            clock: header_clock(Local::now().time()),
        }
    }
}

/// Format a time the way the header shows it: `오후 3:07:09`.
pub fn header_clock(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    let meridiem = if pm { "오후" } else { "오전" };
    format!("{meridiem} {hour}:{:02}:{:02}", time.minute(), time.second())
}

/// Consumer of view snapshots.
pub trait Presenter: Send {
    fn present(&mut self, snapshot: &ViewSnapshot, catalog: &FormCatalog) -> Result<()>;
}

/// Human-readable screen dump.
pub struct TextPresenter<W> {
    out: W,
}

impl<W: Write + Send> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Presenter for TextPresenter<W> {
    fn present(&mut self, snapshot: &ViewSnapshot, catalog: &FormCatalog) -> Result<()> {
        let out = &mut self.out;

        match (&snapshot.modal_title, snapshot.phase) {
            (Some(title), ViewPhase::Viewing | ViewPhase::ViewingWithIdleWarning) => {
                match snapshot.countdown_secs {
                    Some(secs) => writeln!(out, "[modal] {title} | 자동 닫기: {secs}초")?,
                    None => writeln!(out, "[modal] {title}")?,
                }
                writeln!(out, "  {MODAL_HINT}")?;
                if let Some(image) = &snapshot.image {
                    writeln!(out, "  image: {}", image.display())?;
                }
                writeln!(out, "  {COUNTER_HINT}")?;
            }
            _ => {
                writeln!(out, "[main] {SCREEN_TITLE} | {}", snapshot.clock)?;
                writeln!(out, "  {SCREEN_HINT}")?;
                write_catalog(&mut *out, catalog)?;
            }
        }

        if snapshot.idle_notification_visible {
            writeln!(out, "[notice] {IDLE_NOTICE}")?;
        }

        out.flush().context("Failed to flush presentation output")
    }
}

/// One JSON snapshot per line.
pub struct JsonPresenter<W> {
    out: W,
}

impl<W: Write + Send> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Presenter for JsonPresenter<W> {
    fn present(&mut self, snapshot: &ViewSnapshot, _catalog: &FormCatalog) -> Result<()> {
        serde_json::to_writer(&mut self.out, snapshot).context("Failed to encode snapshot")?;
        writeln!(self.out)?;
        self.out.flush().context("Failed to flush presentation output")
    }
}

/// Write the card list, one numbered form per line.
pub fn write_catalog(out: &mut impl Write, catalog: &FormCatalog) -> std::io::Result<()> {
    for (n, form) in catalog.iter().enumerate() {
        writeln!(out, "  {}. {} ({})", n + 1, form.title, form.id.as_str())?;
    }
    Ok(())
}
