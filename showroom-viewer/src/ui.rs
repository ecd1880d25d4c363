//! egui overlay: headings, control buttons, load progress and the caption

use crate::experience::{ArSessionState, Experience, LandingExperience, ShowcaseExperience, UiAction};
use crate::presenter::ModelStatus;
use showroom_core::{ViewState, ViewerKind};
use showroom_io::LoadProgress;

/// Label of the Android deep-link button
pub const AR_DEEP_LINK_LABEL: &str = "📱 Experience in Your Room (AR)";
/// Seconds the explore button takes to fade out
pub const EXPLORE_FADE_SECONDS: f32 = 0.7;

/// A button of the control row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlButton {
    pub label: &'static str,
    pub action: UiAction,
}

impl ControlButton {
    const fn new(label: &'static str, action: UiAction) -> Self {
        Self { label, action }
    }
}

/// Buttons offered by the landing page's viewer
pub fn control_buttons(landing: &LandingExperience) -> Vec<ControlButton> {
    match landing.viewer() {
        ViewerKind::Orbit => {
            let rotate_label = if landing.controller().is_rotating() {
                "🛑 Stop Rotation"
            } else {
                "🔄 Start Rotation"
            };
            vec![
                ControlButton::new(rotate_label, UiAction::ToggleRotation),
                ControlButton::new("🔁 Reset Size & Position", UiAction::Reset),
                ControlButton::new("📍 Recenter Model", UiAction::Recenter),
            ]
        }
        ViewerKind::Ar => {
            let mut buttons = Vec::with_capacity(3);
            if landing.ar_session() != &ArSessionState::Active {
                buttons.push(ControlButton::new("Start AR", UiAction::StartArSession));
            }
            buttons.push(ControlButton::new("🔁 Reset Size", UiAction::Reset));
            buttons.push(ControlButton::new("📍 Recenter", UiAction::Recenter));
            buttons
        }
    }
}

/// Whole-percent progress text, e.g. `42%`
pub fn progress_text(progress: &LoadProgress) -> String {
    format!("{}%", progress.percent().floor() as u32)
}

/// Opacity the explore button fades towards
pub fn explore_button_opacity(state: &ViewState) -> f32 {
    if state.exploring {
        0.0
    } else {
        1.0
    }
}

/// Draw the overlay for `experience` and collect what the user clicked
pub fn show(ctx: &egui::Context, experience: &Experience) -> Vec<UiAction> {
    let mut actions = Vec::new();

    match experience {
        Experience::Landing(landing) => landing_overlay(ctx, landing, &mut actions),
        Experience::Showcase(showcase) => showcase_overlay(ctx, showcase, &mut actions),
    }
    model_status_overlay(ctx, experience.presenter().status());

    actions
}

fn landing_overlay(ctx: &egui::Context, landing: &LandingExperience, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::top("landing_header")
        .frame(egui::Frame::NONE.inner_margin(egui::Margin::same(16)))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new(&landing.title).size(28.0).strong());
                ui.label(egui::RichText::new(&landing.tagline).color(egui::Color32::LIGHT_GRAY));
            });
        });

    egui::Area::new(egui::Id::new("landing_controls"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -24.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for button in control_buttons(landing) {
                    if ui.button(button.label).clicked() {
                        actions.push(button.action);
                    }
                }
            });

            if let Some(link) = &landing.selection().deep_link {
                ui.vertical_centered(|ui| {
                    ui.hyperlink_to(AR_DEEP_LINK_LABEL, link);
                });
            }

            if let ArSessionState::Failed(reason) = landing.ar_session() {
                ui.colored_label(egui::Color32::LIGHT_RED, format!("AR unavailable: {}", reason));
            }
        });
}

fn showcase_overlay(ctx: &egui::Context, showcase: &ShowcaseExperience, actions: &mut Vec<UiAction>) {
    let state = showcase.view_state();

    if state.button_visible {
        let target = explore_button_opacity(&state);
        let opacity = ctx.animate_value_with_time(egui::Id::new("explore_opacity"), target, EXPLORE_FADE_SECONDS);

        egui::Area::new(egui::Id::new("explore_button"))
            .anchor(egui::Align2::LEFT_CENTER, [96.0, 0.0])
            .show(ctx, |ui| {
                ui.multiply_opacity(opacity);
                let button = egui::Button::new(egui::RichText::new("Explore").size(16.0).strong())
                    .corner_radius(16.0)
                    .min_size(egui::vec2(120.0, 36.0));
                if ui.add_enabled(!state.exploring, button).clicked() {
                    actions.push(UiAction::Explore);
                }
            });
    }

    if state.show_caption {
        egui::Area::new(egui::Id::new("showcase_caption"))
            .anchor(egui::Align2::LEFT_TOP, [40.0, ctx.screen_rect().height() / 3.0])
            .show(ctx, |ui| {
                ui.set_max_width(560.0);
                ui.label(
                    egui::RichText::new(showcase.caption())
                        .size(30.0)
                        .strong()
                        .color(egui::Color32::from_rgb(34, 211, 238)),
                );
            });
    }
}

fn model_status_overlay(ctx: &egui::Context, status: &ModelStatus) {
    match status {
        ModelStatus::Ready => {}
        ModelStatus::Loading(progress) => {
            egui::Area::new(egui::Id::new("model_loading"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add(egui::Spinner::new().size(48.0));
                        ui.label(egui::RichText::new(progress_text(progress)).color(egui::Color32::WHITE));
                    });
                });
            // Keep repainting while bytes arrive
            ctx.request_repaint();
        }
        ModelStatus::Failed(reason) => {
            egui::Area::new(egui::Id::new("model_error"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(egui::Color32::LIGHT_RED, format!("Model failed to load: {}", reason));
                });
        }
    }
}
