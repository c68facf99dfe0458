use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use eframe::egui::{self, Color32, Margin, Rounding, Stroke};
use feed_core::{
    format_age, render_post, spawn_load, AppConfig, FeedLoader, FeedState, FilterMode,
    LoadEvent, LoadHandle, LoadStatus, MarkupSanitizer, PostCard, ThemeConfig,
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::markup::show_fragment;

const CARD_SPACING: f32 = 16.0;

fn rgb(c: [u8; 3]) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

enum Screen {
    Loading,
    Failed(String),
    Ready,
}

pub struct AppInit {
    pub runtime: Arc<Runtime>,
    pub loader: FeedLoader,
    pub config: AppConfig,
}

pub struct FeedApp {
    runtime: Arc<Runtime>,
    loader: FeedLoader,
    config: AppConfig,
    sanitizer: MarkupSanitizer,
    state: FeedState,
    events_tx: mpsc::Sender<LoadEvent>,
    events_rx: mpsc::Receiver<LoadEvent>,
    load: Option<LoadHandle>,
    // post id -> rendered card, rebuilt once per completed load
    cards: HashMap<String, PostCard>,
}

impl FeedApp {
    pub fn new(init: AppInit, ctx: &egui::Context) -> Self {
        let (events_tx, events_rx) = mpsc::channel(4);
        let sanitizer = MarkupSanitizer::new(init.config.render.link_base_url());
        let state = FeedState::new(init.config.ui.initial_filter());
        setup_theme(ctx, &init.config.ui.theme);

        let mut app = Self {
            runtime: init.runtime,
            loader: init.loader,
            config: init.config,
            sanitizer,
            state,
            events_tx,
            events_rx,
            load: None,
            cards: HashMap::new(),
        };
        let ticket = app.state.current_ticket();
        app.start_load(ticket);
        app
    }

    fn start_load(&mut self, ticket: u64) {
        if let Some(previous) = self.load.take() {
            self.runtime.block_on(previous.cancel());
        }
        info!(endpoint = %self.loader.endpoint(), ticket, "loading feed");
        let _guard = self.runtime.enter();
        self.load = Some(spawn_load(self.loader.clone(), ticket, self.events_tx.clone()));
    }

    fn refresh(&mut self) {
        let ticket = self.state.begin_load();
        self.cards.clear();
        self.start_load(ticket);
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            if self.state.apply_load(event.ticket, event.result) {
                self.load = None;
                self.rebuild_cards();
            }
        }
    }

    fn rebuild_cards(&mut self) {
        self.cards = self
            .state
            .posts()
            .iter()
            .map(|post| {
                let card = render_post(post, &self.sanitizer, &self.config.render);
                (post.id.clone(), card)
            })
            .collect();
    }

    fn screen(&self) -> Screen {
        match self.state.status() {
            LoadStatus::Loading => Screen::Loading,
            LoadStatus::Failed(message) => Screen::Failed(message.clone()),
            LoadStatus::Ready(_) => Screen::Ready,
        }
    }

    fn draw_loading(&self, ui: &mut egui::Ui) {
        let theme = &self.config.ui.theme;
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.add(egui::Spinner::new().size(36.0).color(rgb(theme.accent_color)));
            ui.add_space(8.0);
            ui.label(egui::RichText::new("Loading posts...").color(rgb(theme.secondary_text_color)));
        });
    }

    /// Returns true when the user asked to retry.
    fn draw_failed(&self, ui: &mut egui::Ui, message: &str) -> bool {
        let theme = &self.config.ui.theme;
        let error = rgb(theme.error_color);
        let mut retry = false;
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            egui::Frame::none()
                .fill(Color32::from_rgba_unmultiplied(127, 29, 29, 80))
                .stroke(Stroke::new(1.0, error))
                .rounding(Rounding::same(12.0))
                .inner_margin(Margin::same(24.0))
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(format!("Unable to fetch posts: {message}"))
                            .color(error)
                            .strong()
                            .size(16.0),
                    );
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
        });
        retry
    }

    fn draw_header(&mut self, ui: &mut egui::Ui) -> bool {
        let theme = self.config.ui.theme.clone();
        let mut refresh = false;
        ui.horizontal(|ui| {
            ui.heading(
                egui::RichText::new(&self.config.ui.heading)
                    .strong()
                    .size(28.0)
                    .color(rgb(theme.accent_color)),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("⟳").on_hover_text("Reload the feed").clicked() {
                    refresh = true;
                }
                ui.separator();
                // right-to-left: add in reverse so Recent stays first
                for mode in FilterMode::ALL.iter().rev() {
                    let selected = self.state.active_filter() == *mode;
                    if ui.selectable_label(selected, mode.label()).clicked() {
                        self.state.set_filter(*mode);
                    }
                }
                ui.separator();
                ui.label(
                    egui::RichText::new(format!("{} posts", self.state.posts().len()))
                        .color(rgb(theme.secondary_text_color))
                        .size(13.0),
                );
            });
        });
        refresh
    }

    fn draw_grid(&self, ui: &mut egui::Ui) {
        let visible = self.state.visible_posts();
        if visible.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(50.0);
                ui.label(egui::RichText::new("No posts in this feed.").size(16.0));
            });
            return;
        }

        let card_width = self.config.ui.card_width.max(200.0);
        let columns = (((ui.available_width() + CARD_SPACING) / (card_width + CARD_SPACING)).floor()
            as usize)
            .max(1);
        let now = Utc::now();
        let theme = &self.config.ui.theme;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.columns(columns, |cols| {
                    for (i, post) in visible.iter().enumerate() {
                        if let Some(card) = self.cards.get(&post.id) {
                            let col = &mut cols[i % columns];
                            draw_card(col, card, theme, now);
                            col.add_space(CARD_SPACING);
                        }
                    }
                });
            });
    }
}

fn draw_card(ui: &mut egui::Ui, card: &PostCard, theme: &ThemeConfig, now: chrono::DateTime<Utc>) {
    let secondary = rgb(theme.secondary_text_color);
    egui::Frame::group(ui.style())
        .fill(rgb(theme.card_color))
        .stroke(Stroke::new(1.0, rgb(theme.border_color)))
        .rounding(Rounding::same(10.0))
        .inner_margin(Margin::same(12.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.add(
                egui::Label::new(
                    egui::RichText::new(&card.title)
                        .strong()
                        .size(17.0)
                        .color(rgb(theme.text_color)),
                )
                .wrap(true),
            );

            ui.horizontal_wrapped(|ui| {
                if let Some(author) = &card.author {
                    ui.label(egui::RichText::new(format!("u/{author}")).color(secondary).size(12.0));
                    ui.separator();
                }
                ui.label(
                    egui::RichText::new(format!("{} comments", card.num_comments))
                        .color(secondary)
                        .size(12.0),
                );
                if let Some(created) = card.created_at {
                    ui.separator();
                    ui.label(
                        egui::RichText::new(format_age(created, now))
                            .color(secondary)
                            .size(12.0),
                    )
                    .on_hover_text(created.format("%Y-%m-%d %H:%M UTC").to_string());
                }
            });

            if let Some(body) = &card.body {
                ui.separator();
                show_fragment(ui, body, secondary);
                if card.truncated {
                    ui.label(egui::RichText::new("(truncated)").weak().italics().size(11.0));
                }
            }

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!("▲ {}", card.score))
                        .color(rgb(theme.accent_color))
                        .strong(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("View Post").on_hover_text(card.external_url.as_str()).clicked() {
                        open_in_browser(&card.external_url);
                    }
                    if let Some(discussion) = &card.discussion_url {
                        if ui.small_button("Discussion").on_hover_text(discussion.as_str()).clicked() {
                            open_in_browser(discussion);
                        }
                    }
                });
            });
        });
}

fn open_in_browser(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        warn!(url, error = %e, "failed to open link");
    }
}

fn setup_theme(ctx: &egui::Context, theme: &ThemeConfig) {
    let mut style = (*ctx.style()).clone();

    let bg_color = rgb(theme.background_color);
    let panel_color = rgb(theme.panel_color);
    let border_color = rgb(theme.border_color);
    let text_color = rgb(theme.text_color);
    let accent_color = rgb(theme.accent_color);

    style.visuals.dark_mode = true;
    style.visuals.panel_fill = bg_color;
    style.visuals.window_fill = panel_color;
    style.visuals.extreme_bg_color = panel_color;
    style.visuals.hyperlink_color = Color32::from_rgb(96, 165, 250);
    style.visuals.override_text_color = None;
    style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, text_color);
    style.visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, border_color);

    style.visuals.widgets.inactive.bg_fill = rgb(theme.card_color);
    style.visuals.widgets.inactive.weak_bg_fill = rgb(theme.card_color);
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, text_color);

    style.visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, accent_color);
    style.visuals.widgets.active.bg_fill = accent_color;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    style.visuals.selection.bg_fill = accent_color;
    style.visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);

    for widget in [
        &mut style.visuals.widgets.noninteractive,
        &mut style.visuals.widgets.inactive,
        &mut style.visuals.widgets.hovered,
        &mut style.visuals.widgets.active,
    ] {
        widget.rounding = Rounding::same(12.0);
    }

    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);

    ctx.set_style(style);
}

impl Drop for FeedApp {
    fn drop(&mut self) {
        if let Some(handle) = self.load.take() {
            self.runtime.block_on(handle.cancel());
        }
    }
}

impl eframe::App for FeedApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        if self.state.is_loading() {
            // results arrive over a channel; keep polling until one lands
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut refresh = false;
        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(&ctx.style()).inner_margin(Margin::same(24.0)))
            .show(ctx, |ui| match self.screen() {
                Screen::Loading => self.draw_loading(ui),
                Screen::Failed(message) => refresh = self.draw_failed(ui, &message),
                Screen::Ready => {
                    refresh = self.draw_header(ui);
                    ui.add_space(12.0);
                    self.draw_grid(ui);
                }
            });

        if refresh {
            self.refresh();
        }
    }
}
