//! Card projection of the task list.
//!
//! A [`Card`] is the display unit for one task. The [`CardDeck`] keeps them
//! newest first and is only ever driven from authoritative task records; it
//! is never read back to recover task data.

use std::time::{Duration, Instant};

use crate::model::{RecordId, Task, TaskStatus};

pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Delete,
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Edit => "Editar",
            CardAction::Delete => "Eliminar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub class: &'static str,
}

impl From<TaskStatus> for StatusBadge {
    fn from(status: TaskStatus) -> Self {
        Self {
            label: status.label(),
            class: status.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Card {
    task_id: RecordId,
    documento: String,
    pub avatar: String,
    pub username: String,
    pub timestamp: String,
    pub title: String,
    pub content: String,
    pub status: TaskStatus,
    pub badge: StatusBadge,
    highlighted_at: Option<Instant>,
}

impl Card {
    pub fn task_id(&self) -> &RecordId {
        &self.task_id
    }

    pub fn documento(&self) -> &str {
        &self.documento
    }

    /// Addressable attributes carried by the card for later lookup.
    pub fn attributes(&self) -> [(&'static str, &str); 2] {
        [
            ("data-id", self.task_id.as_str()),
            ("data-documento", self.documento.as_str()),
        ]
    }

    pub fn actions(&self) -> [CardAction; 2] {
        [CardAction::Edit, CardAction::Delete]
    }

    pub fn is_highlighted(&self, now: Instant) -> bool {
        self.highlighted_at
            .map(|at| now.saturating_duration_since(at) < HIGHLIGHT_DURATION)
            .unwrap_or(false)
    }
}

/// Build a fresh card for `task`.
pub fn render(task: &Task) -> Card {
    Card {
        task_id: task.id.clone(),
        documento: task.documento.clone(),
        avatar: initials(&task.nombre_completo),
        username: task.nombre_completo.clone(),
        timestamp: task.fecha.clone(),
        title: task.title.clone(),
        content: task.description.clone(),
        status: task.status,
        badge: StatusBadge::from(task.status),
        highlighted_at: None,
    }
}

/// Refresh the mutable text of an existing card in place and flash it.
pub fn update(card: &mut Card, task: &Task, now: Instant) {
    card.title = task.title.clone();
    card.content = task.description.clone();
    card.status = task.status;
    card.badge = StatusBadge::from(task.status);
    card.highlighted_at = Some(now);
}

/// Two-letter avatar: first letters of the first two words, or the first two
/// letters of a single word.
pub fn initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).collect::<String>().to_uppercase(),
        many => many
            .iter()
            .take(2)
            .filter_map(|part| part.chars().next())
            .collect::<String>()
            .to_uppercase(),
    }
}

pub fn count_label(count: usize) -> String {
    format!("{} Tarea{}", count, if count == 1 { "" } else { "s" })
}

#[derive(Debug, Clone, Default)]
pub struct CardDeck {
    cards: Vec<Card>,
}

impl CardDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Whether the empty-state indicator should be visible.
    pub fn shows_empty_state(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn count_label(&self) -> String {
        count_label(self.cards.len())
    }

    pub fn find(&self, id: &RecordId) -> Option<&Card> {
        self.cards.iter().find(|card| &card.task_id == id)
    }

    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.cards.iter().position(|card| &card.task_id == id)
    }

    /// Insert a card for `task` at the top.
    pub fn prepend(&mut self, task: &Task) {
        if let Some(idx) = self.position(&task.id) {
            let card = &mut self.cards[idx];
            update(card, task, Instant::now());
            return;
        }
        self.cards.insert(0, render(task));
    }

    /// Update the card for `task` in place. Returns false when no card exists.
    pub fn refresh(&mut self, task: &Task, now: Instant) -> bool {
        match self.cards.iter_mut().find(|card| card.task_id == task.id) {
            Some(card) => {
                update(card, task, now);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.cards.len();
        self.cards.retain(|card| &card.task_id != id);
        self.cards.len() != before
    }

    /// Bring the deck in line with `tasks` (newest first): changed cards are
    /// updated in place, vanished ones dropped, unknown ones inserted at their
    /// listing position.
    pub fn reconcile(&mut self, tasks: &[Task], now: Instant) {
        self.cards
            .retain(|card| tasks.iter().any(|task| task.id == card.task_id));

        let mut next = Vec::with_capacity(tasks.len());
        for task in tasks {
            match self.position(&task.id) {
                Some(idx) => {
                    let mut card = self.cards[idx].clone();
                    if card.title != task.title
                        || card.content != task.description
                        || card.status != task.status
                    {
                        update(&mut card, task, now);
                    }
                    next.push(card);
                }
                None => next.push(render(task)),
            }
        }
        self.cards = next;
    }

    pub fn clear_expired_highlights(&mut self, now: Instant) {
        for card in &mut self.cards {
            if !card.is_highlighted(now) {
                card.highlighted_at = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: RecordId::new(id),
            user_id: RecordId::new("1"),
            documento: "10314".into(),
            nombre_completo: "Ana Pérez".into(),
            title: title.into(),
            description: "Check diff".into(),
            status: TaskStatus::Activa,
            fecha: "19 de octubre de 2026, 14:05".into(),
        }
    }

    #[rstest]
    #[case("Ana Pérez", "AP")]
    #[case("sofía", "SO")]
    #[case("  maría  luisa gómez ", "ML")]
    #[case("", "")]
    #[case("É", "É")]
    fn initials_follow_word_rules(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(initials(name), expected);
    }

    #[rstest]
    #[case(0, "0 Tareas")]
    #[case(1, "1 Tarea")]
    #[case(2, "2 Tareas")]
    fn count_label_pluralizes(#[case] count: usize, #[case] expected: &str) {
        assert_eq!(count_label(count), expected);
    }

    #[test]
    fn render_carries_attributes_and_actions() {
        let card = render(&task("7", "Review PR"));
        assert_eq!(
            card.attributes(),
            [("data-id", "7"), ("data-documento", "10314")]
        );
        assert_eq!(card.actions(), [CardAction::Edit, CardAction::Delete]);
        assert_eq!(card.badge.label, "Activa");
        assert_eq!(card.badge.class, "activa");
        assert_eq!(card.avatar, "AP");
    }

    #[test]
    fn update_mutates_text_and_highlights_briefly() {
        let now = Instant::now();
        let mut card = render(&task("7", "Review PR"));
        let mut changed = task("7", "Review PR again");
        changed.status = TaskStatus::Inactiva;

        update(&mut card, &changed, now);

        assert_eq!(card.title, "Review PR again");
        assert_eq!(card.badge.class, "inactiva");
        assert_eq!(card.timestamp, "19 de octubre de 2026, 14:05");
        assert!(card.is_highlighted(now));
        assert!(!card.is_highlighted(now + HIGHLIGHT_DURATION));
    }

    #[test]
    fn deck_prepends_newest_first_and_tracks_empty_state() {
        let mut deck = CardDeck::new();
        assert!(deck.shows_empty_state());

        deck.prepend(&task("1", "first"));
        deck.prepend(&task("2", "second"));

        let titles: Vec<&str> = deck.cards().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(deck.count_label(), "2 Tareas");
        assert!(!deck.shows_empty_state());

        assert!(deck.remove(&RecordId::new("1")));
        assert!(deck.remove(&RecordId::new("2")));
        assert!(!deck.remove(&RecordId::new("2")));
        assert!(deck.shows_empty_state());
    }

    #[test]
    fn reconcile_updates_in_place_and_drops_vanished_cards() {
        let now = Instant::now();
        let mut deck = CardDeck::new();
        deck.prepend(&task("1", "one"));
        deck.prepend(&task("2", "two"));

        let listing = vec![task("3", "three"), task("1", "one edited")];
        deck.reconcile(&listing, now);

        let ids: Vec<&str> = deck.cards().iter().map(|c| c.task_id().as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        let edited = deck.find(&RecordId::new("1")).unwrap();
        assert_eq!(edited.title, "one edited");
        assert!(edited.is_highlighted(now));
        assert!(!deck.find(&RecordId::new("3")).unwrap().is_highlighted(now));
    }
}
