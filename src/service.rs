use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::broadcast::SyncBroadcaster;
use crate::config::Settings;
use crate::schedule::reader::file_extension;
use crate::schedule::segmenter::{check_partition, iso_week_sheet};
use crate::schedule::{
    current_week_index, open_spreadsheet, render_block, segment, ActiveFileState, BoundedRegion,
    ErrorKind, RefreshEvent, ScheduleError, SpreadsheetHandle, StatusSnapshot,
};

const AWAITING_UPLOAD_MESSAGE: &str = "Aucun planning chargé. Déposez un fichier pour commencer.";
const DEFAULT_IMPORT_NAME: &str = "planning.xlsx";

/// Structured error handed to collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ScheduleError> for ErrorResponse {
    fn from(e: &ScheduleError) -> Self {
        ErrorResponse {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<ScheduleError> for ErrorResponse {
    fn from(e: ScheduleError) -> Self {
        ErrorResponse::from(&e)
    }
}

/// One rendered week-block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedWeek {
    pub sheet: String,
    pub index: usize,
    pub label: String,
    pub week_count: usize,
    pub markup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PageView {
    AwaitingUpload { message: String },
    Week(RenderedWeek),
}

/// Everything a viewer-facing layer needs: the active file, uploads, week
/// rendering and refresh fan-out
pub struct DisplayService {
    settings: Settings,
    active: ActiveFileState,
    broadcaster: SyncBroadcaster,
    http: reqwest::Client,
}

impl DisplayService {
    pub fn new(settings: Settings) -> Result<Self, ScheduleError> {
        settings.ensure_storage_dir()?;
        let broadcaster = SyncBroadcaster::new(settings.send_timeout());
        Ok(Self {
            settings,
            active: ActiveFileState::new(),
            broadcaster,
            http: reqwest::Client::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn broadcaster(&self) -> &SyncBroadcaster {
        &self.broadcaster
    }

    /// Snapshot of the active file
    pub fn active_file(&self) -> Option<Arc<SpreadsheetHandle>> {
        self.active.snapshot()
    }

    fn require_active(&self) -> Result<Arc<SpreadsheetHandle>, ScheduleError> {
        self.active.snapshot().ok_or(ScheduleError::NoActiveFile)
    }

    fn check_extension(&self, path: &Path) -> Result<(), ScheduleError> {
        if self.settings.accepts(path) {
            Ok(())
        } else {
            let ext = file_extension(path).unwrap_or_else(|| path.display().to_string());
            Err(ScheduleError::UnsupportedExtension(ext))
        }
    }

    /// Open `path` off the runtime and swap it in. Returns `None` when it is
    /// the active file with unchanged content.
    async fn load(&self, path: &Path) -> Result<Option<Arc<SpreadsheetHandle>>, ScheduleError> {
        self.check_extension(path)?;

        let owned = path.to_path_buf();
        let handle = tokio::task::spawn_blocking(move || open_spreadsheet(&owned))
            .await
            .map_err(|e| ScheduleError::unreadable(path, e))??;

        if let Some(current) = self.active.snapshot() {
            if current.path() == handle.path() && current.checksum() == handle.checksum() {
                tracing::debug!(file = handle.file_name(), "content unchanged, skipping reload");
                return Ok(None);
            }
        }

        let handle = Arc::new(handle);
        self.active.replace(handle.clone());
        tracing::info!(
            file = handle.file_name(),
            sheets = handle.sheet_count(),
            "active schedule replaced"
        );
        Ok(Some(handle))
    }

    fn refresh_event(handle: &SpreadsheetHandle) -> RefreshEvent {
        RefreshEvent::now(Some(handle.file_name().to_string()))
    }

    /// Make `path` the active file and notify every viewer
    pub async fn activate_file(&self, path: &Path) -> Result<Arc<SpreadsheetHandle>, ScheduleError> {
        match self.load(path).await? {
            Some(handle) => {
                self.broadcaster.broadcast(Self::refresh_event(&handle)).await;
                Ok(handle)
            }
            None => self.require_active(),
        }
    }

    /// Reload after a debounced change. Failures keep the previous file.
    pub async fn apply_change(self: &Arc<Self>, path: PathBuf) {
        match self.load(&path).await {
            Ok(Some(handle)) => {
                let service = Arc::clone(self);
                tokio::spawn(async move {
                    service.broadcaster.broadcast(Self::refresh_event(&handle)).await;
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "reload failed, keeping previous schedule");
            }
        }
    }

    /// Store an uploaded file in the storage directory and activate it
    pub async fn accept_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Arc<SpreadsheetHandle>, ScheduleError> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| ScheduleError::UnsupportedExtension(file_name.to_string()))?;
        self.check_extension(Path::new(name))?;

        let target = self.settings.storage_dir.join(name);
        tokio::fs::write(&target, bytes).await?;
        tracing::info!(file = name, bytes = bytes.len(), "upload stored");

        self.activate_file(&target).await
    }

    /// Download a schedule and handle it like an upload
    pub async fn import_from_url(&self, url: &str) -> Result<Arc<SpreadsheetHandle>, ScheduleError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let name = response
            .url()
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(DEFAULT_IMPORT_NAME)
            .to_string();
        let bytes = response.bytes().await?;
        tracing::info!(url, file = %name, "schedule downloaded");

        self.accept_upload(&name, &bytes).await
    }

    /// Sheet names in workbook order, without `Name (2)` style copies of
    /// another sheet
    pub fn list_sheets(&self) -> Result<Vec<String>, ScheduleError> {
        let handle = self.require_active()?;
        Ok(visible_sheets(&handle.sheet_names()))
    }

    /// Sheet named after the ISO week of `today`, else the first visible one
    pub fn default_sheet(&self, today: NaiveDate) -> Result<String, ScheduleError> {
        let sheets = self.list_sheets()?;
        let names: Vec<&str> = sheets.iter().map(String::as_str).collect();
        iso_week_sheet(&names, today)
            .or_else(|| names.first().copied())
            .map(str::to_string)
            .ok_or_else(|| ScheduleError::SheetNotFound("(no sheets)".to_string()))
    }

    pub fn current_week_index(&self, sheet: &str, today: NaiveDate) -> Result<usize, ScheduleError> {
        let handle = self.require_active()?;
        let grid = handle.sheet(sheet)?;
        let blocks = segment(grid, &BoundedRegion::SCHEDULE);
        Ok(current_week_index(&blocks, today))
    }

    pub fn render_week(&self, sheet: &str, week_index: usize) -> Result<RenderedWeek, ScheduleError> {
        let handle = self.require_active()?;
        let grid = handle.sheet(sheet)?;
        let region = BoundedRegion::SCHEDULE;

        let blocks = segment(grid, &region);
        check_partition(&blocks, &region)?;
        let block = blocks.get(week_index).ok_or(ScheduleError::WeekOutOfRange {
            index: week_index,
            count: blocks.len(),
        })?;

        let cells = grid.cells_in(&region.with_rows(block.start_row, block.end_row));
        Ok(RenderedWeek {
            sheet: grid.name().to_string(),
            index: block.index,
            label: block.label.clone(),
            week_count: blocks.len(),
            markup: render_block(block, &cells),
        })
    }

    /// What a viewer shows: the requested (or default) sheet and week, or an
    /// invitation to upload when nothing is loaded
    pub fn page(
        &self,
        sheet: Option<&str>,
        week: Option<usize>,
        today: NaiveDate,
    ) -> Result<PageView, ScheduleError> {
        if !self.active.is_loaded() {
            return Ok(PageView::AwaitingUpload {
                message: AWAITING_UPLOAD_MESSAGE.to_string(),
            });
        }

        let sheet = match sheet {
            Some(name) => name.to_string(),
            None => self.default_sheet(today)?,
        };
        let week = match week {
            Some(index) => index,
            None => self.current_week_index(&sheet, today)?,
        };
        Ok(PageView::Week(self.render_week(&sheet, week)?))
    }

    pub async fn status(&self) -> StatusSnapshot {
        let active = self.active.snapshot();
        StatusSnapshot {
            active_file_name: active.as_ref().map(|h| h.file_name().to_string()),
            last_modified: active.as_ref().map(|h| h.modified()),
            sheet_count: active.as_ref().map(|h| h.sheet_count()).unwrap_or(0),
            connected_viewer_count: self.broadcaster.session_count().await,
        }
    }

    /// Recognized files of the storage directory, sorted by name
    pub fn list_files(&self) -> Result<Vec<String>, ScheduleError> {
        let mut files: Vec<String> = self
            .stored_files()?
            .into_iter()
            .filter_map(|(path, _)| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        files.sort();
        Ok(files)
    }

    fn stored_files(&self) -> Result<Vec<(PathBuf, std::time::SystemTime)>, ScheduleError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.settings.storage_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_lock = entry.file_name().to_string_lossy().starts_with("~$");
            if is_lock || !path.is_file() || !self.settings.accepts(&path) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            files.push((path, modified));
        }
        Ok(files)
    }

    /// Activate the most recently modified stored file that opens. Files
    /// that fail are skipped; the last failure is returned when none opens.
    pub async fn load_most_recent(&self) -> Result<Option<Arc<SpreadsheetHandle>>, ScheduleError> {
        let mut candidates = self.stored_files()?;
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let mut last_error = None;
        for (path, _) in candidates {
            tracing::info!(file = %path.display(), "loading most recent upload");
            match self.activate_file(&path).await {
                Ok(handle) => return Ok(Some(handle)),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable upload");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Final path component of a client-supplied name
fn sanitize_file_name(file_name: &str) -> Option<&str> {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

fn duplicate_sheet_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(.+?) \(\d+\)$").ok())
        .as_ref()
}

fn visible_sheets(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .filter(|name| {
            let copy_of = duplicate_sheet_pattern()
                .and_then(|re| re.captures(name))
                .and_then(|caps| caps.get(1))
                .map(|base| base.as_str());
            match copy_of {
                Some(base) => !names.contains(&base),
                None => true,
            }
        })
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ViewerSession;
    use crate::schedule::fixtures::{write_xlsx, FixtureCell, FixtureSheet};
    use crate::schedule::run_debounce_loop;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(dir: &Path) -> Arc<DisplayService> {
        let settings = Settings {
            storage_dir: dir.join("uploads"),
            send_timeout_ms: 200,
            ..Settings::default()
        };
        Arc::new(DisplayService::new(settings).unwrap())
    }

    fn planning(path: &Path) {
        let sheet = FixtureSheet::new("47")
            .cell(FixtureCell::date(1, 1, ymd(2025, 11, 10)))
            .cell(FixtureCell::text(5, 1, "2025-11-17"))
            .cell(FixtureCell::text(5, 2, "Réunion d'équipe").filled("FFFFC000"))
            .cell(FixtureCell::date(8, 1, ymd(2025, 11, 18)))
            .cell(FixtureCell::text(12, 3, "fin"))
            .merge("B5:D5");
        write_xlsx(path, &[FixtureSheet::new("Modèle"), sheet, FixtureSheet::new("47 (2)")]).unwrap();
    }

    async fn viewer(service: &DisplayService) -> mpsc::Receiver<RefreshEvent> {
        let (session, rx) = ViewerSession::channel(8);
        service.broadcaster().register(session).await;
        rx
    }

    #[tokio::test]
    async fn test_page_without_file_invites_upload() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let page = service.page(None, None, ymd(2025, 11, 20)).unwrap();
        assert!(matches!(page, PageView::AwaitingUpload { .. }));
        assert!(matches!(service.list_sheets(), Err(ScheduleError::NoActiveFile)));
        assert!(matches!(service.render_week("47", 0), Err(ScheduleError::NoActiveFile)));

        let status = service.status().await;
        assert_eq!(status.active_file_name, None);
        assert_eq!(status.sheet_count, 0);
    }

    #[tokio::test]
    async fn test_docx_upload_rejected_without_state_change() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        service
            .accept_upload("semaine.csv", "17/11/2025;Accueil\n".as_bytes())
            .await
            .unwrap();
        let mut rx = viewer(&service).await;

        let err = service.accept_upload("notes.docx", b"PK\x03\x04").await.unwrap_err();

        assert!(matches!(err, ScheduleError::UnsupportedExtension(ref ext) if ext == "docx"));
        assert_eq!(ErrorResponse::from(&err).kind, ErrorKind::UnsupportedExtension);
        assert_eq!(service.active_file().unwrap().file_name(), "semaine.csv");
        assert_eq!(service.list_files().unwrap(), vec!["semaine.csv"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_upload_activates_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let mut rx = viewer(&service).await;
        let source = dir.path().join("source.xlsx");
        planning(&source);
        let bytes = std::fs::read(&source).unwrap();

        let handle = service.accept_upload("../../tmp/planning.xlsx", &bytes).await.unwrap();

        assert_eq!(
            handle.path(),
            dir.path().join("uploads").join("planning.xlsx").canonicalize().unwrap()
        );
        let event = rx.try_recv().unwrap();
        assert_eq!(event.file_name.as_deref(), Some("planning.xlsx"));

        let status = service.status().await;
        assert_eq!(status.active_file_name.as_deref(), Some("planning.xlsx"));
        assert_eq!(status.sheet_count, 3);
        assert_eq!(status.connected_viewer_count, 1);
    }

    #[tokio::test]
    async fn test_render_current_week() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let path = dir.path().join("uploads").join("planning.xlsx");
        planning(&path);
        service.activate_file(&path).await.unwrap();

        assert_eq!(service.list_sheets().unwrap(), vec!["Modèle", "47"]);
        let today = ymd(2025, 11, 20);
        assert_eq!(service.default_sheet(today).unwrap(), "47");
        assert_eq!(service.default_sheet(ymd(2025, 6, 2)).unwrap(), "Modèle");
        assert_eq!(service.current_week_index("47", today).unwrap(), 1);

        let PageView::Week(week) = service.page(None, None, today).unwrap() else {
            panic!("expected a rendered week");
        };
        assert_eq!(week.sheet, "47");
        assert_eq!(week.index, 1);
        assert_eq!(week.week_count, 2);
        assert_eq!(week.label, "lundi 17 novembre 2025");
        assert_eq!(week.markup.matches("<tr").count(), 8);
        assert!(week.markup.contains(r#"rowspan="1" colspan="3""#));
        assert!(week.markup.contains("#FFC000"));
        assert!(week.markup.contains(">lundi, 17 novembre 2025</td>"));

        let first = service.render_week("47", 0).unwrap();
        assert_eq!(first.label, "lundi 10 novembre 2025");
        assert_eq!(first.markup.matches("<tr").count(), 4);

        assert!(matches!(
            service.render_week("47", 2),
            Err(ScheduleError::WeekOutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(
            service.render_week("Absente", 0),
            Err(ScheduleError::SheetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unchanged_file_is_not_announced_twice() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let path = dir.path().join("uploads").join("semaine.csv");
        std::fs::write(&path, "17/11/2025;A\n").unwrap();
        service.activate_file(&path).await.unwrap();
        let mut rx = viewer(&service).await;

        service.apply_change(path.clone()).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "17/11/2025;B\n").unwrap();
        service.apply_change(path.clone()).await;
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert!(event.is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_upload_through_symlinked_storage_announced_once() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("reel");
        std::fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("lien")).unwrap();
        let settings = Settings {
            storage_dir: dir.path().join("lien").join("uploads"),
            ..Settings::default()
        };
        let service = Arc::new(DisplayService::new(settings).unwrap());
        let mut rx = viewer(&service).await;

        service
            .accept_upload("semaine.csv", "17/11/2025;Accueil\n".as_bytes())
            .await
            .unwrap();
        assert!(rx.try_recv().is_ok());

        // The watcher reports the resolved path of the same file
        let reported = real.join("uploads").join("semaine.csv").canonicalize().unwrap();
        service.apply_change(reported).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let good = dir.path().join("uploads").join("semaine.csv");
        std::fs::write(&good, "17/11/2025;A\n").unwrap();
        service.activate_file(&good).await.unwrap();

        let broken = dir.path().join("uploads").join("planning.xlsx");
        std::fs::write(&broken, b"not a workbook").unwrap();
        service.apply_change(broken.clone()).await;
        assert_eq!(service.active_file().unwrap().file_name(), "semaine.csv");

        assert!(matches!(
            service.activate_file(&broken).await,
            Err(ScheduleError::UnreadableFile { .. })
        ));
        assert_eq!(service.active_file().unwrap().file_name(), "semaine.csv");
    }

    #[tokio::test]
    async fn test_five_events_one_apply_one_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let mut rx = viewer(&service).await;
        let path = dir.path().join("uploads").join("semaine.csv");
        std::fs::write(&path, "17/11/2025;A\n").unwrap();

        let (tx, events) = mpsc::unbounded_channel();
        let applies = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = applies.clone();
        let target = service.clone();
        let task = tokio::spawn(run_debounce_loop(events, Duration::from_millis(100), move |path| {
            let service = target.clone();
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                service.apply_change(path).await;
            }
        }));

        for _ in 0..5 {
            tx.send(path.clone()).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(first.unwrap().file_name.as_deref(), Some("semaine.csv"));
        assert!(tokio::time::timeout(Duration::from_millis(500), rx.recv()).await.is_err());
        assert_eq!(applies.load(std::sync::atomic::Ordering::SeqCst), 1);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_load_most_recent_upload() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        assert!(service.load_most_recent().await.unwrap().is_none());

        let uploads = dir.path().join("uploads");
        let older = uploads.join("ancien.csv");
        let newer = uploads.join("recent.csv");
        std::fs::write(&older, "10/11/2025;A\n").unwrap();
        std::fs::write(&newer, "17/11/2025;B\n").unwrap();
        std::fs::write(uploads.join("notes.txt"), "x").unwrap();
        std::fs::write(uploads.join("~$recent.xlsx"), "x").unwrap();
        let past = std::time::SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&older)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let loaded = service.load_most_recent().await.unwrap().unwrap();
        assert_eq!(loaded.file_name(), "recent.csv");
        assert_eq!(service.list_files().unwrap(), vec!["ancien.csv", "recent.csv"]);
    }

    #[tokio::test]
    async fn test_load_most_recent_skips_corrupt_upload() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let uploads = dir.path().join("uploads");
        let valid = uploads.join("semaine.csv");
        std::fs::write(&valid, "17/11/2025;A\n").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&valid)
            .unwrap()
            .set_modified(std::time::SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
        std::fs::write(uploads.join("planning.xlsx"), b"not a workbook").unwrap();

        let loaded = service.load_most_recent().await.unwrap().unwrap();
        assert_eq!(loaded.file_name(), "semaine.csv");
    }

    #[tokio::test]
    async fn test_load_most_recent_reports_when_nothing_opens() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        std::fs::write(dir.path().join("uploads").join("planning.xlsx"), b"not a workbook").unwrap();

        assert!(matches!(
            service.load_most_recent().await,
            Err(ScheduleError::UnreadableFile { .. })
        ));
        assert!(service.active_file().is_none());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("planning.xlsx"), Some("planning.xlsx"));
        assert_eq!(sanitize_file_name("../../etc/planning.xlsx"), Some("planning.xlsx"));
        assert_eq!(sanitize_file_name(r"C:\Users\accueil\semaine.csv"), Some("semaine.csv"));
        assert_eq!(sanitize_file_name("dossier/"), None);
        assert_eq!(sanitize_file_name(".."), None);
    }

    #[test]
    fn test_visible_sheets_hide_numbered_copies() {
        assert_eq!(
            visible_sheets(&["47", "47 (2)", "Planning (3)", "48"]),
            vec!["47", "Planning (3)", "48"]
        );
    }

    #[test]
    fn test_error_response_serializes_kind() {
        let json = serde_json::to_value(ErrorResponse::from(ScheduleError::NoActiveFile)).unwrap();
        assert_eq!(json["kind"], "no_active_file");
    }
}
