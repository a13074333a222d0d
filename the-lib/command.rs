//! Keymap commands executed against an [`EditorState`].
//!
//! Every command turns into a transaction dispatched through
//! [`EditorState::apply`]. Edits are refused while the state is read-only;
//! navigation and search keep working.

use smallvec::SmallVec;

use crate::{
  Tendril,
  auto_pairs,
  effect::Effect,
  keymap::Command,
  movement::{
    self,
    Direction,
  },
  search::SearchDirection,
  selection::{
    Range,
    Selection,
  },
  state::{
    EditorState,
    Result,
  },
  transaction::{
    Change,
    Transaction,
  },
};

/// Lines moved by page commands when the host does not know its viewport.
pub const DEFAULT_PAGE_LINES: usize = 20;

/// Run `command`. Returns whether it was handled; unhandled keys fall through
/// to the host.
pub fn execute(state: &mut EditorState, command: Command, page_lines: usize) -> Result<bool> {
  use Command::*;

  match command {
    MoveLeft => move_each(state, |text, range| {
      movement::move_horizontally(text, range, Direction::Backward)
    }),
    MoveRight => move_each(state, |text, range| {
      movement::move_horizontally(text, range, Direction::Forward)
    }),
    MoveUp if state.completion().is_some() => cycle_completion(state, Direction::Backward),
    MoveDown if state.completion().is_some() => cycle_completion(state, Direction::Forward),
    MoveUp => move_each(state, |text, range| {
      movement::move_vertically(text, range, Direction::Backward, 1)
    }),
    MoveDown => move_each(state, |text, range| {
      movement::move_vertically(text, range, Direction::Forward, 1)
    }),
    PageUp => move_each(state, |text, range| {
      movement::move_vertically(text, range, Direction::Backward, page_lines)
    }),
    PageDown => move_each(state, |text, range| {
      movement::move_vertically(text, range, Direction::Forward, page_lines)
    }),
    LineStart => move_each(state, movement::line_start),
    LineEnd => move_each(state, movement::line_end),
    DocumentStart => set_selection(state, Selection::point(0)),
    DocumentEnd => {
      let end = state.text().len_chars();
      set_selection(state, Selection::point(end))
    },
    SelectAll => {
      let end = state.text().len_chars();
      set_selection(state, Selection::single(0, end))
    },
    DeleteBackward => delete(state, Direction::Backward),
    DeleteForward => delete(state, Direction::Forward),
    InsertNewline => insert_newline(state),
    Undo if state.read_only() => Ok(false),
    Redo if state.read_only() => Ok(false),
    Undo => state.undo(),
    Redo => state.redo(),
    OpenSearch => open_search(state),
    FindNext => find(state, Direction::Forward),
    FindPrevious => find(state, Direction::Backward),
    Cancel => cancel(state),
    AcceptCompletion => accept_completion(state),
    Indent => Ok(true),
    // Routed to the host by the view.
    Save => Ok(false),
  }
}

/// Type `ch` at every cursor, pairing brackets when close-brackets is on.
pub fn insert_char(state: &mut EditorState, ch: char) -> Result<bool> {
  if state.read_only() {
    return Ok(false);
  }
  if let Some(pairs) = state.auto_pairs()
    && let Some(tx) = auto_pairs::hook(state.text(), state.selection(), ch, &pairs)?
  {
    state.apply(&tx)?;
    return Ok(true);
  }
  let mut text = Tendril::new();
  text.push(ch);
  let tx = replace_ranges(state, |_| text.clone())?;
  state.apply(&tx)?;
  Ok(true)
}

/// Replace every range with the text `text_for` picks, leaving a caret after
/// each insertion.
fn replace_ranges(
  state: &EditorState,
  mut text_for: impl FnMut(&Range) -> Tendril,
) -> Result<Transaction> {
  let selection = state.selection();
  let mut end_ranges: SmallVec<[Range; 1]> = SmallVec::with_capacity(selection.len());
  let mut offset = 0isize;

  let tx = Transaction::change_by_selection(state.text(), selection, |range| {
    let text = text_for(range);
    let inserted = text.chars().count();
    let from = (range.from() as isize + offset) as usize;
    end_ranges.push(Range::point(from + inserted));
    offset += inserted as isize - range.len() as isize;
    (range.from(), range.to(), Some(text))
  })?;
  let selection = Selection::new(end_ranges, selection.primary_index())?;
  Ok(tx.with_selection(selection))
}

fn move_each(
  state: &mut EditorState,
  mut f: impl FnMut(ropey::RopeSlice, Range) -> Range,
) -> Result<bool> {
  let text = state.text().slice(..);
  let selection = state.selection().clone().transform(|range| f(text, range));
  set_selection(state, selection)
}

fn set_selection(state: &mut EditorState, selection: Selection) -> Result<bool> {
  let tx = Transaction::new(state.text()).with_selection(selection);
  state.apply(&tx)?;
  Ok(true)
}

fn dispatch_effect(state: &mut EditorState, effect: Effect) -> Result<bool> {
  let tx = Transaction::effects_only(state.text(), [effect]);
  state.apply(&tx)?;
  Ok(true)
}

fn cycle_completion(state: &mut EditorState, direction: Direction) -> Result<bool> {
  dispatch_effect(state, Effect::CycleCompletion(direction))
}

fn delete(state: &mut EditorState, direction: Direction) -> Result<bool> {
  if state.read_only() {
    return Ok(false);
  }
  if direction == Direction::Backward
    && let Some(pairs) = state.auto_pairs()
    && let Some(tx) = auto_pairs::delete_hook(state.text(), state.selection(), &pairs)?
  {
    state.apply(&tx)?;
    return Ok(true);
  }

  let len = state.text().len_chars();
  let mut deletions: Vec<Change> = Vec::with_capacity(state.selection().len());
  for range in state.selection().iter() {
    let (from, to) = if !range.is_empty() {
      (range.from(), range.to())
    } else {
      match direction {
        Direction::Backward if range.head > 0 => (range.head - 1, range.head),
        Direction::Forward if range.head < len => (range.head, range.head + 1),
        _ => continue,
      }
    };
    // A caret deleting into the previous range would overlap it.
    match deletions.last_mut() {
      Some((_, last_to, _)) if from < *last_to => *last_to = (*last_to).max(to),
      _ => deletions.push((from, to, None)),
    }
  }
  if deletions.is_empty() {
    return Ok(true);
  }

  let tx = Transaction::change(state.text(), deletions)?;
  let selection = state.selection().clone().map(tx.changes())?;
  state.apply(&tx.with_selection(selection))?;
  Ok(true)
}

fn insert_newline(state: &mut EditorState) -> Result<bool> {
  if state.read_only() {
    return Ok(false);
  }
  let text = state.text().slice(..);
  let tx = replace_ranges(state, |range| {
    let mut line = Tendril::from("\n");
    line.push_str(&movement::line_indent(text, range.from()));
    line
  })?;
  state.apply(&tx)?;
  Ok(true)
}

fn open_search(state: &mut EditorState) -> Result<bool> {
  let primary = state.selection().primary();
  let query = if primary.is_empty() {
    state.search().query().unwrap_or_default().to_string()
  } else {
    state.text().slice(primary.from()..primary.to()).to_string()
  };
  dispatch_effect(state, Effect::SetSearchQuery(Some(query)))
}

fn find(state: &mut EditorState, direction: Direction) -> Result<bool> {
  let search_direction = match direction {
    Direction::Forward => SearchDirection::Next,
    Direction::Backward => SearchDirection::Prev,
  };
  let found = state
    .search()
    .step(state.text().slice(..), state.selection(), search_direction);
  match found {
    Some(selection) => set_selection(state, selection),
    None => Ok(state.search().is_open()),
  }
}

fn cancel(state: &mut EditorState) -> Result<bool> {
  if state.completion().is_some() {
    dispatch_effect(state, Effect::CloseCompletion)
  } else if state.search().is_open() {
    dispatch_effect(state, Effect::SetSearchQuery(None))
  } else {
    Ok(false)
  }
}

/// Tab: accept the open completion, otherwise the reserved indent no-op.
fn accept_completion(state: &mut EditorState) -> Result<bool> {
  if state.read_only() {
    return Ok(true);
  }
  let Some(completion) = state.completion() else {
    return execute(state, Command::Indent, DEFAULT_PAGE_LINES);
  };
  let tx = completion
    .accept(state.text(), state.selection())?
    .with_effect(Effect::CloseCompletion);
  state.apply(&tx)?;
  Ok(true)
}
