use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::mpsc,
};

use crate::codec;

const CELL: f32 = 130.0;
const THUMB_SIZE: u32 = 256;

enum ThumbState {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

struct ThumbResult {
    path: PathBuf,
    rgba: Option<(Vec<u8>, usize, usize)>,
}

/// Click-to-browse image chooser shown as a floating window.
pub struct Picker {
    pub current_dir: PathBuf,
    pub open: bool,
    subdirs: Vec<(PathBuf, String)>,
    images: Vec<(PathBuf, String)>,
    scanned: bool,
    pending_nav: Option<PathBuf>,
    thumbnails: HashMap<PathBuf, ThumbState>,
    tx: mpsc::SyncSender<ThumbResult>,
    rx: mpsc::Receiver<ThumbResult>,
    chosen: Option<PathBuf>,
}

impl Picker {
    pub fn new(start_dir: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::sync_channel(64);
        let current_dir = start_dir
            .filter(|p| p.is_dir())
            .or_else(dirs::picture_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));
        Self {
            current_dir,
            open: false,
            subdirs: Vec::new(),
            images: Vec::new(),
            scanned: false,
            pending_nav: None,
            thumbnails: HashMap::new(),
            tx,
            rx,
            chosen: None,
        }
    }

    pub fn show_window(&mut self) {
        self.open = true;
        self.scanned = false;
    }

    /// Returns the file picked since the last call, if any.
    pub fn take_chosen(&mut self) -> Option<PathBuf> {
        self.chosen.take()
    }

    fn scan(&mut self) {
        let (subdirs, images) = list_dir(&self.current_dir);
        self.subdirs = subdirs;
        self.images = images;
        self.thumbnails.clear();
        self.scanned = true;
    }

    fn queue_pending_thumbs(&mut self, ctx: &egui::Context) {
        let to_queue: Vec<PathBuf> = self
            .images
            .iter()
            .filter(|(p, _)| !self.thumbnails.contains_key(p))
            .map(|(p, _)| p.clone())
            .collect();

        for path in to_queue {
            self.thumbnails.insert(path.clone(), ThumbState::Loading);
            let tx = self.tx.clone();
            let ctx2 = ctx.clone();
            std::thread::spawn(move || {
                let rgba = generate_thumb(&path);
                let _ = tx.send(ThumbResult { path, rgba });
                ctx2.request_repaint();
            });
        }
    }

    fn drain_channel(&mut self, ctx: &egui::Context) {
        while let Ok(ThumbResult { path, rgba }) = self.rx.try_recv() {
            // Thumbnails from a directory we already left.
            if !self.thumbnails.contains_key(&path) {
                continue;
            }
            let state = match rgba {
                Some((data, w, h)) => {
                    let img = egui::ColorImage::from_rgba_unmultiplied([w, h], &data);
                    let tex = ctx.load_texture(
                        path.to_string_lossy().as_ref(),
                        img,
                        egui::TextureOptions::LINEAR,
                    );
                    ThumbState::Ready(tex)
                }
                None => ThumbState::Failed,
            };
            self.thumbnails.insert(path, state);
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        if !self.open {
            return;
        }
        if let Some(nav) = self.pending_nav.take() {
            self.current_dir = nav;
            self.scanned = false;
        }
        if !self.scanned {
            self.scan();
        }

        self.drain_channel(ctx);
        self.queue_pending_thumbs(ctx);

        let mut new_sel: Option<PathBuf> = None;
        let mut nav_to: Option<PathBuf> = None;
        let mut open = self.open;

        egui::Window::new("Choose an image")
            .open(&mut open)
            .default_size([620.0, 520.0])
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("⬆").on_hover_text("Parent directory").clicked() {
                        if let Some(p) = self.current_dir.parent() {
                            nav_to = Some(p.to_path_buf());
                        }
                    }
                    ui.monospace(self.current_dir.display().to_string());
                });
                ui.separator();

                if !self.subdirs.is_empty() {
                    ui.horizontal_wrapped(|ui| {
                        for (path, name) in &self.subdirs {
                            if ui.button(format!("📁 {}", name)).clicked() {
                                nav_to = Some(path.clone());
                            }
                        }
                    });
                    ui.separator();
                }

                if self.images.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label("No images in this directory");
                    });
                    return;
                }

                let avail_w = ui.available_width();
                let cols = ((avail_w / (CELL + 8.0)) as usize).max(1);

                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        egui::Grid::new("picker_grid")
                            .num_columns(cols)
                            .spacing([8.0, 8.0])
                            .show(ui, |ui| {
                                for (i, (path, name)) in self.images.iter().enumerate() {
                                    let thumb = match self.thumbnails.get(path) {
                                        Some(ThumbState::Ready(tex)) => {
                                            Some((tex.id(), tex.size_vec2()))
                                        }
                                        _ => None,
                                    };
                                    if draw_thumb_cell(ui, name, thumb) {
                                        new_sel = Some(path.clone());
                                    }
                                    if (i + 1) % cols == 0 {
                                        ui.end_row();
                                    }
                                }
                            });
                    });
            });

        if let Some(nav) = nav_to {
            self.pending_nav = Some(nav);
        }
        if let Some(sel) = new_sel {
            self.chosen = Some(sel);
            open = false;
        }
        self.open = open;
    }
}

fn list_dir(dir: &Path) -> (Vec<(PathBuf, String)>, Vec<(PathBuf, String)>) {
    let mut subdirs = Vec::new();
    let mut images = Vec::new();

    let Ok(rd) = std::fs::read_dir(dir) else {
        return (subdirs, images);
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            subdirs.push((path, name));
        } else if codec::is_supported_image(&path) {
            images.push((path, name));
        }
    }

    subdirs.sort_by(|a, b| a.1.cmp(&b.1));
    images.sort_by(|a, b| a.1.cmp(&b.1));
    (subdirs, images)
}

fn draw_thumb_cell(
    ui: &mut egui::Ui,
    name: &str,
    thumb: Option<(egui::TextureId, egui::Vec2)>,
) -> bool {
    let (resp, painter) =
        ui.allocate_painter(egui::vec2(CELL, CELL + 22.0), egui::Sense::click());
    let rect = resp.rect;

    if resp.hovered() {
        painter.rect_filled(rect, 4.0, ui.visuals().widgets.hovered.bg_fill);
    }

    let img_rect = egui::Rect::from_min_size(rect.min, egui::vec2(CELL, CELL));
    match thumb {
        Some((tex_id, tex_size)) => {
            let scale = (CELL / tex_size.x).min(CELL / tex_size.y);
            let display = tex_size * scale;
            let offset = (egui::vec2(CELL, CELL) - display) * 0.5;
            let draw_rect = egui::Rect::from_min_size(img_rect.min + offset, display);
            painter.image(
                tex_id,
                draw_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.rect_filled(img_rect, 4.0, egui::Color32::from_gray(40));
            painter.text(
                img_rect.center(),
                egui::Align2::CENTER_CENTER,
                "…",
                egui::FontId::proportional(22.0),
                egui::Color32::GRAY,
            );
        }
    }

    let label_pos = egui::pos2(rect.center().x, img_rect.max.y + 11.0);
    painter.text(
        label_pos,
        egui::Align2::CENTER_CENTER,
        short_name(name, 20),
        egui::FontId::proportional(11.0),
        ui.visuals().text_color(),
    );

    resp.clicked()
}

/// Truncates to `max` characters without splitting a code point.
fn short_name(name: &str, max: usize) -> &str {
    match name.char_indices().nth(max) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

fn generate_thumb(path: &Path) -> Option<(Vec<u8>, usize, usize)> {
    let img = image::open(path).ok()?;
    let rgba = img.thumbnail(THUMB_SIZE, THUMB_SIZE).to_rgba8();
    let w = rgba.width() as usize;
    let h = rgba.height() as usize;
    Some((rgba.into_raw(), w, h))
}
