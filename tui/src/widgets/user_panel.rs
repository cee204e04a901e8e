//! UserPanel Widget
//!
//! The right-hand roster: a blank entry, then every user. The `> ` cursor
//! marks the entry Enter would pick; the current selection is drawn in the
//! accent colors. Details of the selected user sit underneath.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

use delphi_core::User;

use crate::theme;

/// Label of the blank roster entry
pub const NO_USER: &str = "(no user)";

/// Roster panel
pub struct UserPanel<'a> {
    users: &'a [User],
    selected: Option<usize>,
    cursor: Option<usize>,
}

impl<'a> UserPanel<'a> {
    /// Roster with the cursor on the selection
    pub fn new(users: &'a [User], selected: Option<usize>) -> Self {
        Self {
            users,
            selected,
            cursor: selected,
        }
    }

    /// Put the cursor on another entry
    #[must_use]
    pub fn highlighted(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }
}

impl Widget for UserPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 4 || area.height < 2 {
            return;
        }
        let width = area.width as usize - 1;
        let bottom = area.y + area.height;

        buf.set_stringn(area.x + 1, area.y, "--- Users ---", width, theme::dim());

        let entries = std::iter::once((None, NO_USER))
            .chain(self.users.iter().enumerate().map(|(i, u)| (Some(i), u.name.as_str())));

        let mut y = area.y + 2;
        for (index, name) in entries {
            if y >= bottom {
                return;
            }
            let marker = if index == self.cursor { "> " } else { "  " };
            let style = if index == self.selected {
                theme::selected_user()
            } else {
                Style::default()
            };
            buf.set_stringn(area.x + 1, y, format!("{marker}{name}"), width, style);
            y += 1;
        }

        let Some(user) = self.selected.and_then(|i| self.users.get(i)) else {
            return;
        };

        y += 1;
        for detail in [user.email.clone(), format!("Plan: {}", user.program_type)] {
            if y >= bottom {
                return;
            }
            buf.set_stringn(area.x + 1, y, detail, width, theme::dim());
            y += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delphi_core::demo_users;
    use pretty_assertions::assert_eq;

    fn rows(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_selected_user_details() {
        let users = demo_users();
        let area = Rect::new(0, 0, 24, 10);
        let mut buf = Buffer::empty(area);
        UserPanel::new(&users, Some(1)).render(area, &mut buf);

        assert_eq!(
            rows(&buf),
            vec![
                " --- Users ---",
                "",
                "   (no user)",
                "   Deepak",
                " > Avtar",
                "   Regina",
                "",
                " avtar@iotasol.com",
                " Plan: Free",
                "",
            ]
        );
        assert_eq!(buf[(1, 4)].bg, theme::USER_ORANGE);
    }

    #[test]
    fn test_blank_entry_selected() {
        let users = demo_users();
        let area = Rect::new(0, 0, 24, 6);
        let mut buf = Buffer::empty(area);
        UserPanel::new(&users, None).render(area, &mut buf);
        assert_eq!(rows(&buf)[2], " > (no user)");
    }

    #[test]
    fn test_cursor_apart_from_selection() {
        let users = demo_users();
        let area = Rect::new(0, 0, 24, 10);
        let mut buf = Buffer::empty(area);
        UserPanel::new(&users, Some(0))
            .highlighted(Some(2))
            .render(area, &mut buf);

        let rows = rows(&buf);
        assert_eq!(rows[3], "   Deepak");
        assert_eq!(rows[5], " > Regina");
        assert_eq!(buf[(3, 3)].bg, theme::USER_ORANGE);
        assert_eq!(buf[(3, 5)].bg, ratatui::style::Color::Reset);
        assert_eq!(rows[7], " deepak02@iotasol.com");
    }
}
