use std::cmp::min;
use std::time::Instant;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use crate::core::{Card, CardAction, Field, FieldAccess, FormState};
use crate::model::TaskStatus;
use crate::tui::constants::APP_VERSION;
use crate::tui::helpers::{
    accent_title, badge_style, build_help_lines, centered_rect, inset_rect, BG_ACCENT, BG_BASE,
    BG_FLASH, BG_PANEL, FG_ACCENT,
};

use super::{App, ConfirmChoice, InputMode};

const MAX_SUGGESTIONS: usize = 4;

impl App {
    pub(crate) fn draw(&mut self, f: &mut Frame<'_>) {
        let size = f.size();
        f.render_widget(Clear, size);
        f.render_widget(Block::default().style(Style::default().bg(BG_BASE)), size);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(8),
                Constraint::Length(2),
            ])
            .split(size);

        self.draw_header(f, chunks[0]);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
            .split(chunks[1]);
        self.draw_form(f, body[0]);
        self.draw_cards(f, body[1]);
        self.draw_footer(f, chunks[2]);

        match self.input_mode {
            InputMode::Help => self.draw_help_overlay(f, size),
            InputMode::ConfirmDelete => self.draw_confirm_overlay(f, size),
            InputMode::Form | InputMode::Cards => {}
        }
        if let Some(message) = self.controller.alert() {
            draw_alert_overlay(f, size, message);
        }
    }

    fn draw_header(&self, f: &mut Frame<'_>, area: Rect) {
        let backend = if self.offline {
            String::from("sin conexión (datos de ejemplo)")
        } else {
            self.config.api_url().to_string()
        };
        let session = match self.controller.state() {
            FormState::Idle => String::from("Sin usuario"),
            FormState::UserResolved => self
                .controller
                .current_user()
                .map(|user| format!("👤 {} ({})", user.nombre_completo, user.documento))
                .unwrap_or_default(),
            FormState::Editing => self
                .controller
                .editing_task_id()
                .map(|id| format!("✏️ Editando tarea #{id}"))
                .unwrap_or_default(),
        };

        let mut spans = vec![
            Span::styled(
                format!(" tareas v{} ", APP_VERSION),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("🌐 {backend}"), Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            Span::styled(session, Style::default().fg(Color::Yellow)),
        ];
        let in_flight = self.dispatcher.in_flight();
        if in_flight > 0 {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("⏳ {in_flight}"),
                Style::default().fg(Color::Cyan),
            ));
        }
        f.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG_BASE)),
            area,
        );
    }

    fn draw_form(&self, f: &mut Frame<'_>, area: Rect) {
        let title = match self.controller.state() {
            FormState::Editing => "✏️ Editar tarea",
            FormState::Idle | FormState::UserResolved => "➕ Nueva tarea",
        };
        let focused = self.input_mode == InputMode::Form;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title(title))
            .border_style(Style::default().fg(if focused {
                FG_ACCENT
            } else {
                Color::DarkGray
            }))
            .style(Style::default().bg(BG_PANEL));
        let inner = inset_rect(block.inner(area), 1);
        f.render_widget(block, area);

        let mut lines: Vec<Line> = Vec::new();
        let mut cursor = None;
        for field in Field::ALL {
            let access = self.controller.field_access(field);
            let is_focus = focused && field == self.focus;
            lines.push(field_label(field, access, is_focus));

            let value_row = lines.len() as u16;
            lines.push(self.field_value(field, access, is_focus));
            if is_focus && field != Field::Status && access == FieldAccess::Editable {
                cursor = Some((2 + self.input.cursor_col() as u16, value_row));
            }

            match self.controller.errors().get(field) {
                Some(message) => lines.push(Line::from(Span::styled(
                    format!("  {message}"),
                    Style::default().fg(Color::Red),
                ))),
                None if is_focus => lines.extend(self.field_hints(field)),
                None => {}
            }
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            match self.controller.state() {
                FormState::Idle => "Enter: buscar usuario",
                FormState::UserResolved => "Enter: crear tarea",
                FormState::Editing => "Enter: guardar • Esc: cancelar",
            },
            Style::default().fg(Color::DarkGray),
        )));

        f.render_widget(
            Paragraph::new(lines).style(Style::default().bg(BG_PANEL)),
            inner,
        );

        if let Some((x, y)) = cursor {
            if y < inner.height {
                f.set_cursor(inner.x + x.min(inner.width.saturating_sub(1)), inner.y + y);
            }
        }
    }

    fn field_value(&self, field: Field, access: FieldAccess, is_focus: bool) -> Line<'static> {
        let raw = if is_focus {
            self.input.as_str().to_string()
        } else {
            self.controller.fields().get(field).to_string()
        };
        let base = match access {
            FieldAccess::Editable if is_focus => Style::default().fg(Color::White).bg(BG_ACCENT),
            FieldAccess::Editable => Style::default().fg(Color::Gray),
            FieldAccess::Locked | FieldAccess::Disabled => Style::default().fg(Color::DarkGray),
        };

        if field == Field::Status {
            let label = raw
                .parse::<TaskStatus>()
                .map(|status| status.label().to_string())
                .unwrap_or(raw);
            return Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("◀ {label} ▶"), base),
            ]);
        }
        Line::from(vec![Span::raw("  "), Span::styled(format!("{raw} "), base)])
    }

    fn field_hints(&self, field: Field) -> Vec<Line<'static>> {
        match field {
            Field::Documento => self
                .controller
                .documento_suggestions()
                .into_iter()
                .take(MAX_SUGGESTIONS)
                .enumerate()
                .map(|(idx, user)| {
                    let style = if idx == self.suggestion_index {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Line::from(vec![
                        Span::styled(format!("  {} ", user.documento), style),
                        Span::styled(user.nombre_completo.clone(), style),
                    ])
                })
                .collect(),
            Field::Nombre => {
                let names = self.controller.name_suggestions();
                if names.len() > 1 {
                    vec![Line::from(Span::styled(
                        format!("  Registrados: {}", names.join(", ")),
                        Style::default().fg(Color::DarkGray),
                    ))]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn draw_cards(&mut self, f: &mut Frame<'_>, area: Rect) {
        let focused = self.input_mode == InputMode::Cards;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title(&format!(
                "🗂 Tareas · {}",
                self.controller.deck().count_label()
            )))
            .border_style(Style::default().fg(if focused {
                FG_ACCENT
            } else {
                Color::DarkGray
            }))
            .style(Style::default().bg(BG_PANEL));

        if self.controller.deck().shows_empty_state() {
            let inner = block.inner(area);
            f.render_widget(block, area);
            if inner.width == 0 || inner.height == 0 {
                return;
            }
            let lines = vec![
                Line::from(Span::styled(
                    "No hay tareas",
                    Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(Span::styled(
                    "Ingresa un documento registrado para empezar.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            let content = centered_rect(inner.width.min(60), 3, inner);
            f.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .style(Style::default().bg(BG_PANEL)),
                content,
            );
            return;
        }

        let now = Instant::now();
        let editing = self.controller.editing_task_id().cloned();
        let items: Vec<ListItem> = self
            .controller
            .deck()
            .cards()
            .iter()
            .map(|card| {
                let is_editing = editing.as_ref() == Some(card.task_id());
                card_item(card, is_editing, card.is_highlighted(now))
            })
            .collect();

        let highlight = if focused {
            Style::default().bg(BG_ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight)
            .highlight_symbol(if focused { "▶ " } else { "  " });
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_footer(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.style())])
        } else {
            Line::from(vec![Span::raw("Listo")])
        };
        f.render_widget(Paragraph::new(status_line), lines[0]);

        let help = match self.input_mode {
            InputMode::Form => {
                "tab/shift+tab campo | enter enviar | ↑/↓ sugerencias | esc tarjetas o cancelar | F5 sincronizar | F1 ayuda | ctrl+c salir"
            }
            InputMode::Cards => {
                "j/k mover | e editar ✏️ | x eliminar 🗑️ | r sincronizar 🔄 | i/tab formulario | ? ayuda | q salir"
            }
            InputMode::Help => "Enter/Esc cierra ❔",
            InputMode::ConfirmDelete => "←/→ elegir • y sí • n no • Enter confirma • Esc cancela",
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                help,
                Style::default().fg(Color::DarkGray),
            ))),
            lines[1],
        );
    }

    fn draw_help_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = build_help_lines();
        let width = min(area.width.saturating_sub(10), 80);
        let height = min(lines.len() as u16 + 4, area.height.saturating_sub(2)).max(10);
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("⌨️ Atajos"))
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let help_lines: Vec<Line> = lines
            .into_iter()
            .map(|(combo, desc)| {
                Line::from(vec![
                    Span::styled(combo, Style::default().fg(Color::Cyan)),
                    Span::raw("  "),
                    Span::raw(desc),
                ])
            })
            .collect();

        if inner.width < 3 || inner.height < 3 {
            return;
        }
        f.render_widget(
            Paragraph::new(help_lines)
                .wrap(Wrap { trim: true })
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }

    fn draw_confirm_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let width = min(area.width.saturating_sub(20), 60).max(40);
        let popup_area = centered_rect(width, 8, area);
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(accent_title("🗑 Eliminar tarea"))
            .border_style(Style::default().fg(Color::Red))
            .style(Style::default().bg(BG_PANEL));
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);

        let task_title = self
            .pending_delete
            .as_ref()
            .and_then(|id| self.controller.deck().find(id))
            .map(|card| card.title.as_str())
            .unwrap_or("la tarea seleccionada");

        let choice_style = |choice: ConfirmChoice, color: Color| {
            if self.confirm_choice == choice {
                Style::default()
                    .fg(Color::Black)
                    .bg(color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            }
        };

        let lines = vec![
            Line::from(Span::styled(
                "Esta acción no se puede deshacer.",
                Style::default().fg(Color::Red),
            )),
            Line::from(Span::styled(
                format!("¿Eliminar '{}'?", task_title),
                Style::default().fg(Color::White),
            )),
            Line::default(),
            Line::from(vec![
                Span::styled("  Sí  ", choice_style(ConfirmChoice::Yes, Color::Red)),
                Span::raw("    "),
                Span::styled("  No  ", choice_style(ConfirmChoice::No, Color::Gray)),
            ]),
        ];

        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center)
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }
}

fn field_label(field: Field, access: FieldAccess, is_focus: bool) -> Line<'static> {
    let style = if is_focus {
        Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD)
    } else if access == FieldAccess::Editable {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![Span::styled(field.label().to_string(), style)];
    if access == FieldAccess::Locked {
        spans.push(Span::styled(" 🔒", Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

fn card_item(card: &Card, is_editing: bool, highlighted: bool) -> ListItem<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let mut header = vec![
        Span::styled(
            format!(" {} ", card.avatar),
            Style::default()
                .fg(Color::Black)
                .bg(FG_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            card.username.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" · {} · {}", card.documento(), card.timestamp), dim),
    ];
    if is_editing {
        header.push(Span::styled("  ✏️", Style::default().fg(Color::Yellow)));
    }

    let actions = card
        .actions()
        .iter()
        .map(|action| match action {
            CardAction::Edit => format!("[e] {}", action.label()),
            CardAction::Delete => format!("[x] {}", action.label()),
        })
        .collect::<Vec<_>>()
        .join("  ");

    let lines = vec![
        Line::from(header),
        Line::from(Span::styled(
            format!("  {}", card.title),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::raw(format!("  {}", card.content))),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!(" {} ", card.badge.label), badge_style(card.status)),
            Span::styled(format!("  {actions}"), dim),
        ]),
        Line::default(),
    ];

    let item = ListItem::new(lines);
    if highlighted {
        item.style(Style::default().bg(BG_FLASH))
    } else {
        item
    }
}

fn draw_alert_overlay(f: &mut Frame<'_>, area: Rect, message: &str) {
    let width = min(area.width.saturating_sub(10), 70).max(30);
    let popup_area = centered_rect(width, 7, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(Span::styled(
            "⚠ Aviso",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )))
        .border_style(Style::default().fg(Color::Red))
        .style(Style::default().bg(BG_PANEL));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let lines = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::White),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Enter para continuar",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .style(Style::default().bg(BG_PANEL)),
        inset_rect(inner, 1),
    );
}
