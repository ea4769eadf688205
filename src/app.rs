use crate::directory::Character;
use crate::event::AppEvent;
use crate::responder::ReplyScheduler;
use crate::session::{ChatController, Message, Origin};
use crate::theme::Theme;
use chrono::Local;
use eframe::egui::{self, RichText, ScrollArea};
use log::warn;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

pub struct UniversumApp {
    rx: Receiver<AppEvent>,
    scheduler: ReplyScheduler,
    controller: ChatController,
    theme: Theme,
    search_input: String,
    message_input: String,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
    theme_applied: bool,
}

impl UniversumApp {
    pub fn new(rx: Receiver<AppEvent>, scheduler: ReplyScheduler, controller: ChatController) -> Self {
        Self {
            rx,
            scheduler,
            controller,
            theme: Theme::default(),
            search_input: String::new(),
            message_input: String::new(),
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
            theme_applied: false,
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log.push(message.into());
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, ctx),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, ctx: &egui::Context) {
        match event {
            AppEvent::ReplyReady { generation, text } => {
                self.controller.apply_reply(generation, text);
                self.scroll_to_bottom = true;
                ctx.request_repaint();
            }
        }
    }

    fn select_character(&mut self, id: &str) {
        match self.controller.select_character(id) {
            Ok(()) => {
                self.message_input.clear();
                self.scroll_to_bottom = false;
            }
            Err(err) => {
                warn!("selection rejected: {err}");
                self.log_diagnostic(err.to_string());
            }
        }
    }

    fn submit_message(&mut self, ctx: &egui::Context) {
        let text = std::mem::take(&mut self.message_input);
        let Some(reply) = self.controller.submit_message(&text) else {
            self.message_input = text;
            return;
        };

        // Wake the UI once the reply is due; egui only repaints on input.
        ctx.request_repaint_after(self.scheduler.delay() + Duration::from_millis(50));
        self.scheduler.schedule(reply);
        self.scroll_to_bottom = true;
        ctx.request_repaint();
    }

    fn render_directory(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        let total = self.controller.directory().len();

        egui::TopBottomPanel::top("directory_header").show(ctx, |ui| {
            ui.add_space(theme.spacing_8);
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Universum").color(theme.accent_primary));
                ui.separator();
                ui.label(RichText::new("Вселенная ИИ-персонажей").color(theme.text_muted));
            });
            ui.add_space(theme.spacing_8);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(theme.spacing_8);
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.search_input)
                    .desired_width(f32::INFINITY)
                    .hint_text("Найти персонажа по имени, описанию или тегам..."),
            );
            if response.changed() {
                self.controller.set_query(self.search_input.clone());
            }

            ui.add_space(theme.spacing_8);
            let matches: Vec<Character> = self
                .controller
                .filtered_characters()
                .into_iter()
                .cloned()
                .collect();
            ui.label(
                RichText::new(format!("Персонажи: {} из {}", matches.len(), total))
                    .color(theme.text_muted)
                    .size(12.0),
            );
            ui.add_space(theme.spacing_4);

            let mut clicked: Option<String> = None;
            ScrollArea::vertical()
                .id_salt("character_grid")
                .show(ui, |ui| {
                    if matches.is_empty() {
                        ui.add_space(theme.spacing_16);
                        ui.vertical_centered(|ui| {
                            ui.label(RichText::new("Персонажи не найдены").strong());
                            ui.label(
                                RichText::new("Попробуйте изменить поисковый запрос")
                                    .color(theme.text_muted),
                            );
                        });
                        return;
                    }

                    for character in &matches {
                        if self.render_character_card(ui, &theme, character) {
                            clicked = Some(character.id.clone());
                        }
                        ui.add_space(theme.spacing_8);
                    }
                });

            if !self.diagnostics_log.is_empty() {
                ui.separator();
                self.render_diagnostics(ui);
            }

            if let Some(id) = clicked {
                self.select_character(&id);
            }
        });
    }

    /// Returns true when the card's chat button was clicked.
    fn render_character_card(
        &self,
        ui: &mut egui::Ui,
        theme: &Theme,
        character: &Character,
    ) -> bool {
        let mut clicked = false;
        theme.card_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("●")
                        .color(theme.presence_color(character.is_online))
                        .size(12.0),
                );
                ui.label(RichText::new(&character.name).strong().size(16.0));
                ui.label(
                    RichText::new(&character.category)
                        .color(theme.accent_secondary)
                        .size(12.0),
                );
            });
            ui.label(RichText::new(&character.description).color(theme.text_muted));
            ui.horizontal(|ui| {
                for tag in &character.tags {
                    ui.label(
                        RichText::new(format!("#{tag}"))
                            .color(theme.accent_primary)
                            .size(12.0),
                    );
                }
            });
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("{} разговоров", character.conversations))
                        .color(theme.text_muted)
                        .size(12.0),
                );
                if ui.button("Чат").clicked() {
                    clicked = true;
                }
            });
        });
        clicked
    }

    fn render_chat(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        let Some(session) = self.controller.session() else {
            return;
        };
        let character = session.character().clone();
        let messages: Vec<Message> = session.log().to_vec();

        let mut go_back = false;
        egui::SidePanel::left("character_panel")
            .resizable(true)
            .show(ctx, |ui| {
                if ui.button("← Назад к персонажам").clicked() {
                    go_back = true;
                }
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("●")
                            .color(theme.presence_color(character.is_online))
                            .size(12.0),
                    );
                    ui.heading(&character.name);
                });
                ui.label(
                    RichText::new(if character.is_online { "В сети" } else { "Не в сети" })
                        .color(theme.text_muted)
                        .size(12.0),
                );
                ui.add_space(theme.spacing_8);
                ui.label(RichText::new(&character.description).color(theme.text_muted));
                ui.add_space(theme.spacing_8);
                ui.horizontal_wrapped(|ui| {
                    for tag in &character.tags {
                        ui.label(
                            RichText::new(format!("#{tag}"))
                                .color(theme.accent_primary)
                                .size(12.0),
                        );
                    }
                });
            });

        let mut send_now = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(format!("Чат с {}", character.name));
            ui.label(
                RichText::new(format!("{} разговоров", character.conversations))
                    .color(theme.text_muted)
                    .size(12.0),
            );
            ui.separator();

            let transcript_height = (ui.available_height() - 150.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if messages.is_empty() {
                        ui.add_space(theme.spacing_16);
                        ui.vertical_centered(|ui| {
                            ui.label(
                                RichText::new(format!(
                                    "Начните разговор с {}",
                                    character.name
                                ))
                                .strong(),
                            );
                        });
                    }

                    for message in &messages {
                        self.render_message(ui, &theme, &character.name, message);
                        ui.add_space(theme.spacing_8);
                    }

                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            self.scroll_to_bottom = false;

            ui.separator();
            if !self.diagnostics_log.is_empty() {
                self.render_diagnostics(ui);
                ui.separator();
            }

            theme.composer_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.message_input)
                            .desired_width(ui.available_width() - 110.0)
                            .hint_text("Напишите сообщение..."),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }

                    let clicked = ui
                        .add_enabled(
                            !self.message_input.trim().is_empty(),
                            egui::Button::new("Отправить"),
                        )
                        .clicked();
                    send_now |= clicked;
                });
            });
        });

        if go_back {
            self.controller.deselect();
            self.message_input.clear();
        } else if send_now {
            self.submit_message(ctx);
        }
    }

    fn render_message(
        &self,
        ui: &mut egui::Ui,
        theme: &Theme,
        character_name: &str,
        message: &Message,
    ) {
        let (fill, sender) = match message.origin {
            Origin::User => (theme.surface_3, "Вы"),
            Origin::Character => (theme.surface_2, character_name),
        };
        theme.bubble_frame(fill).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(sender)
                        .color(theme.accent_primary)
                        .size(12.0),
                );
                ui.label(
                    RichText::new(
                        message
                            .timestamp
                            .with_timezone(&Local)
                            .format("%H:%M")
                            .to_string(),
                    )
                    .color(theme.text_muted)
                    .size(11.0),
                );
            });
            ui.label(&message.text);
        });
    }

    fn render_diagnostics(&self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Диагностика")
            .default_open(false)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("diagnostics_log")
                    .max_height(90.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for entry in &self.diagnostics_log {
                            ui.label(RichText::new(entry).color(self.theme.danger));
                        }
                    });
            });
    }
}

impl eframe::App for UniversumApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            self.theme.apply_visuals(ctx);
            self.theme_applied = true;
        }

        self.drain_events(ctx);
        if self.controller.session().is_some() {
            self.render_chat(ctx);
        } else {
            self.render_directory(ctx);
        }
    }
}
