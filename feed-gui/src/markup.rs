use eframe::egui::{self, Color32, RichText};
use feed_core::{Marker, SafeFragment, TextSpan};

const INDENT_WIDTH: f32 = 14.0;
const BODY_TEXT_SIZE: f32 = 13.5;

/// Draws a sanitized body. Links become hyperlinks, everything else labels.
pub fn show_fragment(ui: &mut egui::Ui, fragment: &SafeFragment, text_color: Color32) {
    for block in fragment.blocks() {
        let indent = block.indent as f32 * INDENT_WIDTH;
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for (row, line) in block.lines.iter().enumerate() {
                if row > 0 {
                    ui.end_row();
                }
                ui.add_space(indent);
                if row == 0 {
                    match &block.marker {
                        Some(Marker::Bullet) => {
                            ui.label(RichText::new("• ").color(text_color).size(BODY_TEXT_SIZE));
                        }
                        Some(Marker::Number(n)) => {
                            ui.label(RichText::new(format!("{n}. ")).color(text_color).size(BODY_TEXT_SIZE));
                        }
                        None => {}
                    }
                }
                for span in line {
                    show_span(ui, span, text_color);
                }
            }
        });
    }
}

fn show_span(ui: &mut egui::Ui, span: &TextSpan, text_color: Color32) {
    let mut text = RichText::new(&span.text).size(BODY_TEXT_SIZE);
    if span.style.bold {
        text = text.strong();
    }
    if span.style.italic {
        text = text.italics();
    }
    match &span.link {
        Some(url) => {
            ui.add(egui::Hyperlink::from_label_and_url(text, url).open_in_new_tab(span.new_tab))
                .on_hover_text(url.as_str());
        }
        None if span.style.bold => {
            // strong text keeps the theme's brighter color
            ui.label(text);
        }
        None => {
            ui.label(text.color(text_color));
        }
    }
}
