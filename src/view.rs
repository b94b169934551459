//! Render-only building blocks for the main window.

use crate::effect::Effect;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(129, 140, 248);
const PANE_WIDTH: f32 = 420.0;

pub enum PanelAction {
    Effect(Effect),
    Reset,
}

pub fn header(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(12.0);
        ui.label(
            egui::RichText::new("Image Effects AI")
                .size(32.0)
                .strong()
                .color(ACCENT),
        );
        ui.label(
            egui::RichText::new(
                "Upload any picture and let Gemini transform it. Choose an effect to get started.",
            )
            .weak(),
        );
        ui.add_space(16.0);
    });
}

pub fn footer(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new("Powered by Gemini.").small().weak());
    });
}

/// Upload area. Returns `true` when the user asked to browse for a file.
pub fn dropzone(ui: &mut egui::Ui, hovering_files: bool) -> bool {
    let width = ui.available_width().min(640.0);
    let height = 280.0;
    let mut browse = false;

    ui.vertical_centered(|ui| {
        let (rect, resp) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::click());
        let (stroke_color, fill) = if hovering_files {
            (ACCENT, egui::Color32::from_rgba_unmultiplied(49, 46, 129, 60))
        } else if resp.hovered() {
            (egui::Color32::from_gray(110), egui::Color32::from_gray(35))
        } else {
            (egui::Color32::from_gray(70), egui::Color32::from_gray(30))
        };
        let painter = ui.painter();
        painter.rect_filled(rect, 12.0, fill);
        draw_dashed_border(painter, rect, egui::Stroke::new(2.0, stroke_color));

        let center = rect.center();
        painter.text(
            center - egui::vec2(0.0, 36.0),
            egui::Align2::CENTER_CENTER,
            "⬆",
            egui::FontId::proportional(40.0),
            stroke_color,
        );
        painter.text(
            center + egui::vec2(0.0, 16.0),
            egui::Align2::CENTER_CENTER,
            "Click to upload or drag and drop",
            egui::FontId::proportional(18.0),
            ui.visuals().strong_text_color(),
        );
        painter.text(
            center + egui::vec2(0.0, 42.0),
            egui::Align2::CENTER_CENTER,
            "PNG, JPG, GIF, WEBP",
            egui::FontId::proportional(13.0),
            ui.visuals().weak_text_color(),
        );

        browse = resp.clicked();
    });

    browse
}

fn draw_dashed_border(painter: &egui::Painter, rect: egui::Rect, stroke: egui::Stroke) {
    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
        rect.left_top(),
    ];
    let shapes = egui::Shape::dashed_line(&corners, stroke, 10.0, 6.0);
    painter.extend(shapes);
}

pub fn action_panel(ui: &mut egui::Ui, is_loading: bool) -> Option<PanelAction> {
    let mut action = None;
    ui.vertical_centered(|ui| {
        ui.horizontal(|ui| {
            let button_size = egui::vec2(180.0, 40.0);
            let total = button_size.x * 3.0 + ui.spacing().item_spacing.x * 2.0;
            ui.add_space(((ui.available_width() - total) * 0.5).max(0.0));

            for effect in Effect::ALL {
                let button = egui::Button::new(egui::RichText::new(effect.label()).size(18.0))
                    .min_size(button_size)
                    .fill(egui::Color32::from_rgb(79, 70, 229));
                if ui.add_enabled(!is_loading, button).clicked() {
                    action = Some(PanelAction::Effect(effect));
                }
            }
            let reset = egui::Button::new(egui::RichText::new("↺ Start Over").size(16.0))
                .min_size(button_size);
            if ui.add_enabled(!is_loading, reset).clicked() {
                action = Some(PanelAction::Reset);
            }
        });
    });
    action
}

pub fn error_banner(ui: &mut egui::Ui, message: &str) {
    ui.vertical_centered(|ui| {
        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgba_unmultiplied(127, 29, 29, 120))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(185, 28, 28)))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new("Error:")
                            .strong()
                            .color(egui::Color32::from_rgb(252, 165, 165)),
                    );
                    ui.label(egui::RichText::new(message).color(egui::Color32::from_rgb(252, 165, 165)));
                });
            });
    });
}

/// What the left-hand pane should show.
pub enum OriginalPane<'a> {
    Image(&'a egui::TextureHandle),
    /// The file uploaded fine but cannot be decoded for display.
    Unavailable,
}

/// What the right-hand pane should show.
pub enum ResultPane<'a> {
    Loading(&'a str),
    Image(&'a egui::TextureHandle),
    Placeholder,
}

pub fn comparison(
    ui: &mut egui::Ui,
    file_name: &str,
    original: OriginalPane<'_>,
    result: ResultPane<'_>,
) {
    ui.columns(2, |cols| {
        cols[0].vertical_centered(|ui| {
            ui.label(egui::RichText::new("Original").size(20.0).weak());
            ui.label(egui::RichText::new(file_name).small().weak());
            ui.add_space(8.0);
            match original {
                OriginalPane::Image(tex) => draw_fitted(ui, tex),
                OriginalPane::Unavailable => placeholder_box(ui, |ui| {
                    ui.label(egui::RichText::new("Preview unavailable").weak());
                }),
            }
        });

        cols[1].vertical_centered(|ui| {
            ui.label(egui::RichText::new("AI Enhanced").size(20.0).weak());
            ui.add_space(8.0);
            match result {
                ResultPane::Image(tex) => draw_fitted(ui, tex),
                ResultPane::Loading(message) => placeholder_box(ui, |ui| loader(ui, message)),
                ResultPane::Placeholder => placeholder_box(ui, |ui| {
                    ui.label(egui::RichText::new("Your edited image will appear here").weak());
                }),
            }
        });
    });
}

fn loader(ui: &mut egui::Ui, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add(egui::Spinner::new().size(40.0).color(ACCENT));
        ui.add_space(12.0);
        ui.label(egui::RichText::new(message).size(16.0).strong());
        ui.label(egui::RichText::new("This can take a moment...").small().weak());
    });
}

fn placeholder_box(ui: &mut egui::Ui, contents: impl FnOnce(&mut egui::Ui)) {
    let side = ui.available_width().min(PANE_WIDTH);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::hover());
    ui.painter()
        .rect_filled(rect, 12.0, egui::Color32::from_gray(30));
    draw_dashed_border(
        ui.painter(),
        rect,
        egui::Stroke::new(2.0, egui::Color32::from_gray(60)),
    );
    let inner = rect.shrink(16.0);
    let mut child = ui.new_child(
        egui::UiBuilder::new()
            .max_rect(inner)
            .layout(egui::Layout::centered_and_justified(egui::Direction::TopDown)),
    );
    contents(&mut child);
}

fn draw_fitted(ui: &mut egui::Ui, tex: &egui::TextureHandle) {
    let avail_w = ui.available_width().min(PANE_WIDTH);
    let tex_size = tex.size_vec2();
    let scale = (avail_w / tex_size.x).min(PANE_WIDTH / tex_size.y);
    let display = tex_size * scale;
    let (img_rect, _) = ui.allocate_exact_size(display, egui::Sense::hover());
    ui.painter().image(
        tex.id(),
        img_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
}

/// Blocking alert. Clears `message` once dismissed.
pub fn alert(ctx: &egui::Context, message: &mut Option<String>) {
    let Some(text) = message.as_deref() else {
        return;
    };
    let mut dismissed = false;
    egui::Window::new("Notice")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            ui.label(text);
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });
    if dismissed {
        *message = None;
    }
}
