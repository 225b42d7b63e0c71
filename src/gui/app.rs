use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use egui::Color32;

use crate::config::Config;
use crate::core::session::Session;
use crate::core::store::PlaylistStore;
use crate::desktop::{self, SystemBrowser};
use crate::models::{is_web_url, Mood};
use crate::sources::page_title::PageTitleResolver;
use crate::sources::TitleSource;

enum BgResult {
    TitleDone {
        url: String,
        target: Mood,
        title: Option<String>,
    },
}

/// User gestures collected while drawing a frame, handled afterwards.
enum UiAction {
    Show(Mood),
    Select(usize),
    OpenAt(usize),
    OpenSelected,
    AddFromField,
    AddFromClipboard,
    DeleteSelected,
}

/// A link waiting for the user to type a title.
struct PendingTitle {
    url: String,
    target: Mood,
    title: String,
}

pub struct MoodPlayerApp {
    session: Session,
    data_file: PathBuf,
    fetch_titles: bool,
    fetch_timeout: Duration,

    selected: Option<usize>,
    url_input: String,
    // Target used while the mixed view is shown
    add_target: Mood,
    pending_title: Option<PendingTitle>,

    // Background tasks
    tx: mpsc::Sender<BgResult>,
    rx: mpsc::Receiver<BgResult>,
    is_loading: bool,
    status_msg: String,
}

impl MoodPlayerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        let (tx, rx) = mpsc::channel();

        let mut session = Session::new(PlaylistStore::new(), config.default_mood);
        let status_msg = match session.load(&config.data_file) {
            Ok(report) => format!("{} links loaded", report.loaded),
            Err(e) => format!("Could not load: {:#}", e),
        };

        Self {
            session,
            fetch_titles: config.fetch_titles,
            fetch_timeout: config.fetch_timeout(),
            data_file: config.data_file,
            selected: None,
            url_input: String::new(),
            add_target: Mood::Happy,
            pending_title: None,
            tx,
            rx,
            is_loading: false,
            status_msg,
        }
    }

    fn dispatch(&mut self, action: UiAction) {
        match action {
            UiAction::Show(mood) => {
                self.session.show(mood);
                self.selected = None;
            }
            UiAction::Select(index) => self.selected = Some(index),
            UiAction::OpenAt(index) => {
                self.selected = Some(index);
                self.open_selected();
            }
            UiAction::OpenSelected => self.open_selected(),
            UiAction::AddFromField => {
                let url = self.url_input.trim().to_string();
                if url.is_empty() {
                    notify("Paste a URL into the box first.");
                    return;
                }
                self.url_input.clear();
                self.start_add(url);
            }
            UiAction::AddFromClipboard => match desktop::clipboard_url() {
                Some(url) => self.start_add(url),
                None => {
                    self.status_msg = "No link on the clipboard. Paste it into the URL box.".to_string();
                }
            },
            UiAction::DeleteSelected => self.delete_selected(),
        }
    }

    fn open_selected(&mut self) {
        let Some(index) = self.selected else {
            notify("Pick a song/playlist first.");
            return;
        };
        if let Err(e) = self.session.open(index, &SystemBrowser) {
            notify(&e.to_string());
        }
    }

    fn delete_selected(&mut self) {
        let Some(index) = self.selected else {
            notify("Select a song to delete.");
            return;
        };
        let Ok(item) = self.session.selected(index) else {
            self.selected = None;
            return;
        };

        let question = format!(
            "Delete \"{}\" from \"{}\"?",
            item.title,
            self.session.current()
        );
        if !confirm(&question) {
            return;
        }

        match self.session.delete(index) {
            Ok(_) => {
                self.selected = None;
                if !self.session.current().is_derived() {
                    self.save();
                }
            }
            Err(e) => notify(&e.to_string()),
        }
    }

    fn start_add(&mut self, url: String) {
        if !is_web_url(&url) {
            notify("That doesn't look like a valid URL.");
            return;
        }
        let target = self
            .session
            .add_target(None)
            .unwrap_or(self.add_target);

        if !self.fetch_titles {
            self.ask_title(url, target);
            return;
        }

        let tx = self.tx.clone();
        let timeout = self.fetch_timeout;
        self.is_loading = true;
        self.status_msg = "Looking up title...".to_string();

        std::thread::spawn(move || {
            let title = PageTitleResolver::new(timeout)
                .ok()
                .and_then(|resolver| resolver.fetch_title(&url));
            let _ = tx.send(BgResult::TitleDone { url, target, title });
        });
    }

    fn ask_title(&mut self, url: String, target: Mood) {
        self.pending_title = Some(PendingTitle {
            url,
            target,
            title: String::new(),
        });
    }

    fn finish_add(&mut self, target: Mood, url: &str, title: &str) {
        match self.session.add(target, url, title) {
            Ok(()) => {
                self.status_msg = format!("Added to {}", target.label());
                self.save();
            }
            Err(e) => notify(&format!("Could not add link:\n{e}")),
        }
    }

    fn save(&mut self) {
        if let Some(message) = save_links(&self.session, &self.data_file) {
            notify(&message);
        }
    }

    fn process_bg_results(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                BgResult::TitleDone { url, target, title } => {
                    self.is_loading = false;
                    self.status_msg.clear();
                    match title {
                        Some(title) => self.finish_add(target, &url, &title),
                        None => self.ask_title(url, target),
                    }
                }
            }
        }
    }

    fn title_window(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.pending_title.as_mut() else {
            return;
        };

        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Enter a title for this link")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&pending.url);
                let response = ui.text_edit_singleline(&mut pending.title);
                response.request_focus();
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.horizontal(|ui| {
                    submit |= ui.button("OK").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if cancel {
            self.pending_title = None;
        } else if submit && !pending.title.trim().is_empty() {
            if let Some(pending) = self.pending_title.take() {
                self.finish_add(pending.target, &pending.url, &pending.title);
            }
        }
    }
}

/// Writes the session's links to `path`; on failure returns the notice to show.
fn save_links(session: &Session, path: &Path) -> Option<String> {
    session
        .save(path)
        .err()
        .map(|e| format!("Could not save: {e:#}"))
}

fn mood_color(mood: Mood) -> Color32 {
    match mood {
        Mood::Happy => Color32::from_rgb(255, 245, 180),
        Mood::Chill => Color32::from_rgb(210, 230, 255),
        Mood::Energetic => Color32::from_rgb(255, 215, 215),
        Mood::Mixed => Color32::from_rgb(225, 225, 240),
    }
}

fn notify(message: &str) {
    rfd::MessageDialog::new()
        .set_title("Mood Player")
        .set_description(message)
        .set_level(rfd::MessageLevel::Info)
        .show();
}

fn confirm(question: &str) -> bool {
    rfd::MessageDialog::new()
        .set_title("Confirm Delete")
        .set_description(question)
        .set_buttons(rfd::MessageButtons::YesNo)
        .show()
        == rfd::MessageDialogResult::Yes
}

impl eframe::App for MoodPlayerApp {
    /// Saves once more when the window closes.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_bg_results();
        if self.is_loading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut actions = Vec::new();
        let current = self.session.current();

        // Top panel: mood buttons + now playing
        egui::TopBottomPanel::top("moods")
            .frame(egui::Frame::side_top_panel(&ctx.style()).fill(mood_color(current)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Select mood:");
                    for mood in Mood::ALL {
                        if ui.selectable_label(mood == current, mood.label()).clicked() {
                            actions.push(UiAction::Show(mood));
                        }
                    }
                    ui.add_space(10.0);
                    ui.label(format!(
                        "Now Playing: {}",
                        self.session.now_playing().unwrap_or("—")
                    ));
                });
            });

        // Bottom panel: URL box + toolbar
        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("URL:");
                let response = ui.text_edit_singleline(&mut self.url_input);
                if ui.button("Add").clicked()
                    || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
                {
                    actions.push(UiAction::AddFromField);
                }
                if ui.button("Add Link").clicked() {
                    actions.push(UiAction::AddFromClipboard);
                }
                if ui.button("Delete Selected").clicked() {
                    actions.push(UiAction::DeleteSelected);
                }
                if ui.button("Open Selected").clicked() {
                    actions.push(UiAction::OpenSelected);
                }
            });

            ui.horizontal(|ui| {
                if current.is_derived() {
                    egui::ComboBox::from_label("Add to")
                        .selected_text(self.add_target.label())
                        .show_ui(ui, |ui| {
                            for mood in Mood::EDITABLE {
                                ui.selectable_value(&mut self.add_target, mood, mood.label());
                            }
                        });
                }
                if self.is_loading {
                    ui.spinner();
                }
                ui.label(&self.status_msg);
            });
        });

        // Central panel: playlist
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if self.session.view().is_empty() {
                    ui.label("No links yet. Paste a URL below and press Add.");
                }
                for (i, item) in self.session.view().iter().enumerate() {
                    let response = ui.selectable_label(self.selected == Some(i), &item.title);
                    if response.double_clicked() {
                        actions.push(UiAction::OpenAt(i));
                    } else if response.clicked() {
                        actions.push(UiAction::Select(i));
                    }
                    response.on_hover_text(&item.url);
                }
            });
        });

        if !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
        {
            actions.push(UiAction::DeleteSelected);
        }

        for action in actions {
            self.dispatch(action);
        }

        self.title_window(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkRecord;

    #[test]
    fn test_save_links_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");

        let mut store = PlaylistStore::new();
        store.add(Mood::Chill, LinkRecord::new("Rain", "https://r")).unwrap();
        let session = Session::new(store, Mood::Chill);

        assert_eq!(save_links(&session, &path), None);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "chill|Rain|https://r\n"
        );
    }

    #[test]
    fn test_save_links_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(PlaylistStore::new(), Mood::Happy);

        let message = save_links(&session, dir.path()).unwrap();
        assert!(message.starts_with("Could not save"));
    }
}
