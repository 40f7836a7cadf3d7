use std::time::Duration;

use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui};
use tracing::warn;

use hn_search::{FetchController, Hit};

const LARGE_COLUMN: f32 = 0.4;
const MID_COLUMN: f32 = 0.3;
const SMALL_COLUMN: f32 = 0.1;

struct AppTheme {
    background: Color32,
    card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    separator: Color32,
    score_high: Color32,
    score_medium: Color32,
    score_low: Color32,
    error: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            highlight: Color32::from_rgb(255, 102, 0), // HN orange
            separator: Color32::from_rgb(60, 60, 60),
            score_high: Color32::from_rgb(76, 175, 80),    // Green
            score_medium: Color32::from_rgb(255, 193, 7),  // Yellow
            score_low: Color32::from_rgb(158, 158, 158),   // Gray
            error: Color32::from_rgb(239, 83, 80),         // Soft red, readable on dark cards
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(255, 102, 0),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),  // Darker for contrast on white
            highlight: Color32::from_rgb(235, 92, 0),       // Slightly darker orange
            separator: Color32::from_rgb(200, 200, 200),
            score_high: Color32::from_rgb(30, 110, 40),     // Darker green
            score_medium: Color32::from_rgb(190, 130, 0),   // Darker yellow
            score_low: Color32::from_rgb(80, 80, 80),
            error: Color32::from_rgb(198, 40, 40),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(235, 92, 0),  // Match highlight
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        // Set base colors
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        // Set button styles
        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        // Text selection and focused input use the accent color
        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        // Rounded buttons to match the cards
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }

    // Points column: green for hot stories, yellow for warm, gray otherwise
    fn score_color(&self, score: i64) -> Color32 {
        if score >= 300 {
            self.score_high
        } else if score >= 100 {
            self.score_medium
        } else {
            self.score_low
        }
    }
}

pub struct SearchApp {
    controller: FetchController,
    theme: AppTheme,
    is_dark_mode: bool,
    // egui edits a String in place; every change is forwarded to the controller
    input: String,
    // The search box grabs focus once, on the first frame
    focus_requested: bool,
}

impl SearchApp {
    pub fn new(controller: FetchController) -> Self {
        let input = controller.state().pending_term().to_string();
        Self {
            controller,
            theme: AppTheme::dark(),
            is_dark_mode: true,
            input,
            focus_requested: false,
        }
    }

    fn toggle_theme(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
        self.theme = if self.is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!(url, error = %e, "Failed to open URL");
        }
    }

    fn render_header(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("HN Search").color(self.theme.highlight).size(24.0));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme_icon = if self.is_dark_mode { "☀" } else { "☾" };
                let theme_btn = ui.add(
                    egui::Button::new(
                        RichText::new(theme_icon)
                            .color(self.theme.button_foreground)
                            .size(20.0),
                    )
                    .min_size(egui::Vec2::new(32.0, 32.0))
                    .corner_radius(CornerRadius::same(16))
                    .fill(self.theme.button_background),
                );
                if theme_btn.clicked() {
                    self.toggle_theme();
                }
            });
        });
    }

    fn render_search_form(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let input = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .desired_width(320.0)
                    .hint_text("Search stories"),
            );
            if !self.focus_requested {
                input.request_focus();
                self.focus_requested = true;
            }
            if input.changed() {
                self.controller.on_input_change(&self.input);
            }

            let entered = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui
                .add(
                    egui::Button::new(RichText::new("Search").color(self.theme.button_foreground))
                        .corner_radius(CornerRadius::same(6))
                        .fill(self.theme.button_background),
                )
                .clicked();

            if entered || clicked {
                self.controller.on_submit();
            }
        });
    }

    fn render_table(&self, ui: &mut Ui, hits: &[Hit]) -> Option<String> {
        let mut dismissed = None;
        let width = ui.available_width();

        for hit in hits {
            egui::Frame::new()
                .fill(self.theme.card_background)
                .corner_radius(CornerRadius::same(6))
                .stroke(Stroke::new(1.0, self.theme.separator))
                .inner_margin(8.0)
                .outer_margin(egui::vec2(4.0, 3.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.allocate_ui(egui::vec2(width * LARGE_COLUMN, 20.0), |ui| {
                            let title = ui.add(
                                egui::Label::new(
                                    RichText::new(&hit.title).color(self.theme.text).strong(),
                                )
                                .truncate()
                                .sense(egui::Sense::click()),
                            );
                            if title.clicked() && !hit.url.is_empty() {
                                self.open_link(&hit.url);
                            }
                            if title.hovered() && !hit.url.is_empty() {
                                ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                            }
                        });
                        ui.allocate_ui(egui::vec2(width * MID_COLUMN, 20.0), |ui| {
                            ui.label(RichText::new(&hit.author).color(self.theme.secondary_text));
                        });
                        ui.allocate_ui(egui::vec2(width * SMALL_COLUMN, 20.0), |ui| {
                            ui.label(
                                RichText::new(format!("{} comments", hit.comment_count))
                                    .color(self.theme.secondary_text),
                            );
                        });
                        ui.allocate_ui(egui::vec2(width * SMALL_COLUMN, 20.0), |ui| {
                            ui.label(
                                RichText::new(format!("{} pts", hit.score))
                                    .color(self.theme.score_color(hit.score))
                                    .strong(),
                            );
                        });
                        if ui
                            .add(
                                egui::Button::new(RichText::new("Dismiss").color(self.theme.button_foreground))
                                    .corner_radius(CornerRadius::same(6))
                                    .fill(self.theme.button_background),
                            )
                            .clicked()
                        {
                            dismissed = Some(hit.id.clone());
                        }
                    });
                });
        }

        dismissed
    }
}

impl eframe::App for SearchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}

impl SearchApp {
    // One frame of the window, kept apart from `eframe::App` so it can run
    // against a bare `egui::Context`
    fn show(&mut self, ctx: &egui::Context) {
        // Apply our custom theme
        self.theme.apply_to_ctx(ctx);

        // Pick up any fetches that finished since the last frame
        self.controller.poll();
        if self.controller.state().is_loading() {
            // Workers report over a channel, so keep frames coming until they do
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            ui.add_space(8.0);
            self.render_search_form(ui);
            ui.add_space(8.0);

            // Actions are collected while the state is borrowed and applied after
            let mut pending_dismiss = None;
            let mut load_more = false;

            {
                let state = self.controller.state();
                let has_entry = state.cache().contains(state.active_key());

                if state.visible_error().is_some() {
                    ui.label(RichText::new("Something went wrong.").color(self.theme.error).size(16.0));
                } else {
                    let projection = state.project();
                    ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .max_height((ui.available_height() - 48.0).max(120.0))
                        .show(ui, |ui| {
                            pending_dismiss = self.render_table(ui, projection.hits);
                        });
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if state.is_loading() {
                        ui.label(RichText::new("Loading ...").color(self.theme.secondary_text));
                    } else {
                        let more = ui.add_enabled(
                            has_entry,
                            egui::Button::new(RichText::new("More").color(self.theme.button_foreground))
                                .corner_radius(CornerRadius::same(6))
                                .fill(self.theme.button_background),
                        );
                        load_more = more.clicked();
                    }
                });
            }

            if let Some(hit_id) = pending_dismiss {
                self.controller.on_dismiss(&hit_id);
            }
            if load_more {
                self.controller.on_load_more();
            }
        });
    }
}
