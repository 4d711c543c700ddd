use std::cmp::min;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::model::TaskStatus;

pub const BG_BASE: Color = Color::Rgb(14, 17, 23);
pub const BG_PANEL: Color = Color::Rgb(22, 26, 34);
pub const BG_ACCENT: Color = Color::Rgb(32, 37, 47);
pub const BG_FLASH: Color = Color::Rgb(58, 52, 24);
pub const FG_ACCENT: Color = Color::Rgb(120, 161, 255);

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = min(width, area.width);
    let h = min(height, area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

pub fn inset_rect(area: Rect, padding: u16) -> Rect {
    if area.width == 0 || area.height == 0 {
        return area;
    }
    let px = padding.min(area.width / 2);
    let py = padding.min(area.height / 2);
    Rect {
        x: area.x + px,
        y: area.y + py,
        width: area.width.saturating_sub(px * 2),
        height: area.height.saturating_sub(py * 2),
    }
}

pub fn badge_style(status: TaskStatus) -> Style {
    let color = match status {
        TaskStatus::Activa => Color::Green,
        TaskStatus::Inactiva => Color::DarkGray,
    };
    Style::default()
        .fg(Color::Black)
        .bg(color)
        .add_modifier(Modifier::BOLD)
}

pub fn build_help_lines() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Tab / Shift+Tab", "Siguiente / anterior campo"),
        ("Enter", "Buscar usuario, crear o guardar la tarea"),
        ("↑ / ↓ (documento)", "Recorrer sugerencias"),
        ("→ (al final)", "Completar con la sugerencia marcada"),
        ("←/→ o Espacio (estado)", "Alternar activa / inactiva"),
        ("Esc", "Cancelar edición o ir a las tarjetas"),
        ("j / k o ↓ / ↑", "Moverse entre tarjetas"),
        ("e / Enter (tarjetas)", "Editar tarjeta"),
        ("x / Supr (tarjetas)", "Eliminar tarjeta (con confirmación)"),
        ("r (tarjetas) / F5", "Sincronizar con el servidor"),
        ("i / Tab (tarjetas)", "Volver al formulario"),
        ("? / F1", "Mostrar esta ayuda"),
        ("q (tarjetas) / Ctrl+C", "Salir"),
    ]
}

pub fn accent_title(text: &str) -> Line<'static> {
    Line::from(vec![Span::styled(
        text.to_owned(),
        Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD),
    )])
}
