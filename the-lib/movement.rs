//! Caret movement over a rope.
//!
//! Movements collapse the range they act on: moving a non-empty range
//! horizontally lands on its edge in the direction of travel, every other
//! movement starts from the head.

use ropey::RopeSlice;

use crate::selection::Range;

/// The direction of cursor movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
  /// Toward the end of the document (increasing positions).
  Forward,
  /// Toward the start of the document (decreasing positions).
  Backward,
}

/// Length of `line` without its line ending.
pub fn line_len(text: RopeSlice, line: usize) -> usize {
  let slice = text.line(line);
  let mut len = slice.len_chars();
  while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
    len -= 1;
  }
  len
}

pub fn move_horizontally(text: RopeSlice, range: Range, dir: Direction) -> Range {
  if !range.is_empty() {
    return match dir {
      Direction::Forward => Range::point(range.to()),
      Direction::Backward => Range::point(range.from()),
    };
  }
  let pos = match dir {
    Direction::Forward => (range.head + 1).min(text.len_chars()),
    Direction::Backward => range.head.saturating_sub(1),
  };
  Range::point(pos)
}

/// Move `count` lines, keeping the column where the target line allows it.
pub fn move_vertically(text: RopeSlice, range: Range, dir: Direction, count: usize) -> Range {
  let pos = range.head.min(text.len_chars());
  let line = text.char_to_line(pos);
  let column = pos - text.line_to_char(line);
  let last_line = text.len_lines().saturating_sub(1);

  let target = match dir {
    Direction::Forward => line.saturating_add(count).min(last_line),
    Direction::Backward => line.saturating_sub(count),
  };
  if target == line {
    let edge = match dir {
      Direction::Forward if count > 0 => text.len_chars(),
      Direction::Backward if count > 0 => 0,
      _ => pos,
    };
    return Range::point(edge);
  }
  let start = text.line_to_char(target);
  Range::point(start + column.min(line_len(text, target)))
}

pub fn line_start(text: RopeSlice, range: Range) -> Range {
  let line = text.char_to_line(range.head.min(text.len_chars()));
  Range::point(text.line_to_char(line))
}

pub fn line_end(text: RopeSlice, range: Range) -> Range {
  let line = text.char_to_line(range.head.min(text.len_chars()));
  Range::point(text.line_to_char(line) + line_len(text, line))
}

/// Leading whitespace of the line containing `pos`.
pub fn line_indent(text: RopeSlice, pos: usize) -> String {
  let line = text.char_to_line(pos.min(text.len_chars()));
  text
    .line(line)
    .chars()
    .take_while(|ch| *ch == ' ' || *ch == '\t')
    .collect()
}

#[cfg(test)]
mod tests {
  use ropey::Rope;

  use super::*;

  #[test]
  fn horizontal_movement_clamps() {
    let text = Rope::from("ab");
    let slice = text.slice(..);
    assert_eq!(
      move_horizontally(slice, Range::point(2), Direction::Forward),
      Range::point(2)
    );
    assert_eq!(
      move_horizontally(slice, Range::point(0), Direction::Backward),
      Range::point(0)
    );
    assert_eq!(
      move_horizontally(slice, Range::new(0, 2), Direction::Backward),
      Range::point(0)
    );
  }

  #[test]
  fn vertical_movement_keeps_column() {
    let text = Rope::from("hello\nhi\nworld");
    let slice = text.slice(..);
    let down = move_vertically(slice, Range::point(4), Direction::Forward, 1);
    assert_eq!(down, Range::point(8));
    let down = move_vertically(slice, Range::point(4), Direction::Forward, 2);
    assert_eq!(down, Range::point(13));
    let up = move_vertically(slice, Range::point(13), Direction::Backward, 5);
    assert_eq!(up, Range::point(4));
    let last = move_vertically(slice, Range::point(10), Direction::Forward, 1);
    assert_eq!(last, Range::point(14));
  }

  #[test]
  fn line_edges_and_indent() {
    let text = Rope::from("  foo\r\nbar");
    let slice = text.slice(..);
    assert_eq!(line_start(slice, Range::point(4)), Range::point(0));
    assert_eq!(line_end(slice, Range::point(1)), Range::point(5));
    assert_eq!(line_indent(slice, 3), "  ");
    assert_eq!(line_indent(slice, 8), "");
  }
}
