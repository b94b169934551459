use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use anyhow::Context as _;

use crate::codec::{self, ImageFile};
use crate::config::AppConfig;
use crate::controller::{Controller, JobTicket, Phase};
use crate::effect::Effect;
use crate::error::{EditError, UploadError};
use crate::gemini::{ImageEditor, InlineImage};
use crate::picker::Picker;
use crate::view::{self, OriginalPane, PanelAction, ResultPane};

/// Downscale displayed images to this longest-edge size.
const DISPLAY_MAX: u32 = 1920;

struct JobDone {
    ticket: JobTicket,
    outcome: Result<InlineImage, EditError>,
}

/// A texture and the data URL it was decoded from.
#[derive(Default)]
struct TextureSlot {
    source: Option<String>,
    texture: Option<egui::TextureHandle>,
}

impl TextureSlot {
    /// Decodes `source` unless it is what the slot already shows.
    /// Returns `true` if the slot changed.
    fn update(&mut self, ctx: &egui::Context, name: &str, source: Option<&str>) -> bool {
        if self.source.as_deref() == source {
            return false;
        }
        self.source = source.map(str::to_owned);
        self.texture = source.and_then(|url| load_texture_logged(ctx, name, url));
        true
    }
}

#[derive(Default)]
struct Textures {
    revision: Option<u64>,
    original: TextureSlot,
    edited: TextureSlot,
}

impl Textures {
    fn sync(&mut self, ctx: &egui::Context, controller: &Controller) {
        let revision = controller.revision();
        if self.revision == Some(revision) {
            return;
        }
        self.revision = Some(revision);

        self.original
            .update(ctx, "original", controller.preview_data_url());
        self.edited
            .update(ctx, "edited", controller.edited_image().as_deref());
    }

    fn original_pane(&self) -> OriginalPane<'_> {
        match self.original.texture.as_ref() {
            Some(tex) => OriginalPane::Image(tex),
            None => OriginalPane::Unavailable,
        }
    }
}

pub struct EffectsApp {
    controller: Controller,
    editor: Arc<dyn ImageEditor>,
    picker: Picker,
    textures: Textures,
    alert: Option<String>,
    tx: mpsc::SyncSender<JobDone>,
    rx: mpsc::Receiver<JobDone>,
    config: AppConfig,
}

impl EffectsApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        editor: Arc<dyn ImageEditor>,
    ) -> Self {
        let (tx, rx) = mpsc::sync_channel(4);
        Self {
            controller: Controller::new(),
            editor,
            picker: Picker::new(config.browse_path.clone()),
            textures: Textures::default(),
            alert: None,
            tx,
            rx,
            config,
        }
    }

    fn select_path(&mut self, path: PathBuf) {
        match ImageFile::from_path(&path) {
            Ok(file) => self.controller.upload(file),
            Err(err) => {
                let UploadError::NotAnImage(rejected) = &err;
                tracing::warn!(path = %rejected.display(), "rejected non-image selection");
                self.alert = Some(err.to_string());
            }
        }
    }

    fn start_effect(&mut self, effect: Effect, ctx: &egui::Context) {
        let Some(job) = self.controller.request_effect(effect) else {
            return;
        };

        let editor = Arc::clone(&self.editor);
        let tx = self.tx.clone();
        let ctx2 = ctx.clone();
        std::thread::spawn(move || {
            let outcome = job.run(editor.as_ref());
            let _ = tx.send(JobDone {
                ticket: job.ticket,
                outcome,
            });
            ctx2.request_repaint();
        });
    }

    fn poll_jobs(&mut self) {
        while let Ok(JobDone { ticket, outcome }) = self.rx.try_recv() {
            self.controller.complete(ticket, outcome);
        }
    }

    /// Picks up a dropped file or a picker choice. Only the empty screen
    /// accepts new files; anything arriving later is dropped.
    fn take_new_file(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        let chosen = self.picker.take_chosen();
        if self.controller.phase() != Phase::Empty {
            self.picker.open = false;
            return;
        }
        if let Some(path) = dropped.or(chosen) {
            self.select_path(path);
        }
    }
}

fn load_texture_logged(ctx: &egui::Context, name: &str, url: &str) -> Option<egui::TextureHandle> {
    match texture_from_data_url(ctx, name, url) {
        Ok(tex) => Some(tex),
        Err(err) => {
            tracing::warn!(texture = name, "could not display image: {err:#}");
            None
        }
    }
}

fn texture_from_data_url(
    ctx: &egui::Context,
    name: &str,
    url: &str,
) -> anyhow::Result<egui::TextureHandle> {
    let (_, payload) = codec::split_data_url(url).context("not a data URL")?;
    let bytes = codec::decode_payload(payload)?;
    let img = image::load_from_memory(&bytes).context("unsupported image data")?;
    let img = if img.width() > DISPLAY_MAX || img.height() > DISPLAY_MAX {
        img.thumbnail(DISPLAY_MAX, DISPLAY_MAX)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Ok(ctx.load_texture(name, color, egui::TextureOptions::LINEAR))
}

impl eframe::App for EffectsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window size for saving on exit
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        // Poll background work before drawing
        self.poll_jobs();
        self.take_new_file(ctx);
        self.textures.sync(ctx, &self.controller);

        let hovering_files = ctx.input(|i| !i.raw.hovered_files.is_empty());

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.add_space(4.0);
            view::footer(ui);
            ui.add_space(4.0);
        });

        let mut action = None;
        let mut browse = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    view::header(ui);

                    if self.controller.phase() == Phase::Empty {
                        browse = view::dropzone(ui, hovering_files);
                        if let Some(message) = self.controller.error() {
                            ui.add_space(12.0);
                            view::error_banner(ui, message);
                        }
                        return;
                    }

                    action = view::action_panel(ui, self.controller.is_loading());
                    ui.add_space(12.0);

                    if let Some(message) = self.controller.error() {
                        view::error_banner(ui, message);
                        ui.add_space(12.0);
                    }

                    let result = if self.controller.is_loading() {
                        ResultPane::Loading(self.controller.loading_message())
                    } else if let Some(tex) = self.textures.edited.texture.as_ref() {
                        ResultPane::Image(tex)
                    } else {
                        ResultPane::Placeholder
                    };
                    let file_name = self
                        .controller
                        .uploaded()
                        .map(|u| u.file.name.as_str())
                        .unwrap_or_default();
                    view::comparison(ui, file_name, self.textures.original_pane(), result);
                });
        });

        match action {
            Some(PanelAction::Effect(effect)) => self.start_effect(effect, ctx),
            Some(PanelAction::Reset) => self.controller.reset(),
            None => {}
        }
        if browse {
            self.picker.show_window();
        }

        self.picker.show(ctx);
        view::alert(ctx, &mut self.alert);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.browse_path = Some(self.picker.current_dir.clone());
        self.config.save();
    }
}
