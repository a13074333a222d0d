//! Read-only notice shown at the caret.
//!
//! While the view is read-only, every key except the cancel key asks for the
//! notice. The state is a reducer over `(read_only, effects)`: a transaction
//! that leaves the view editable always hides it, even when the same
//! transaction also carries a show request.

use smallvec::SmallVec;

use crate::{
  effect::Effect,
  selection::Selection,
  transaction::{
    Assoc,
    Transaction,
  },
};

pub const READ_ONLY_MESSAGE: &str = "Cannot edit in read-only editor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipToggle {
  Show,
  Hide,
}

impl TooltipToggle {
  pub fn for_key(is_cancel: bool) -> Self {
    if is_cancel { Self::Hide } else { Self::Show }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tooltip {
  /// Character offset the tooltip is anchored to.
  pub pos:     usize,
  /// Rendered above the line.
  pub above:   bool,
  pub arrow:   bool,
  pub message: &'static str,
}

impl Tooltip {
  fn read_only_notice(pos: usize) -> Self {
    Self {
      pos,
      above: true,
      arrow: true,
      message: READ_ONLY_MESSAGE,
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum TooltipState {
  #[default]
  Hidden,
  Shown(SmallVec<[Tooltip; 1]>),
}

impl TooltipState {
  pub fn tooltips(&self) -> &[Tooltip] {
    match self {
      TooltipState::Hidden => &[],
      TooltipState::Shown(tooltips) => tooltips,
    }
  }

  pub fn is_shown(&self) -> bool {
    matches!(self, TooltipState::Shown(_))
  }

  /// Next state after `tx`. `read_only` and `selection` are the values after
  /// the transaction has been applied.
  pub fn update(&self, read_only: bool, tx: &Transaction, selection: &Selection) -> Self {
    if !read_only {
      return TooltipState::Hidden;
    }

    let mut next = self.map(tx);
    for effect in tx.effects() {
      if let Effect::ReadOnlyTooltip(toggle) = effect {
        next = match toggle {
          TooltipToggle::Show => Self::at_carets(selection),
          TooltipToggle::Hide => TooltipState::Hidden,
        };
      }
    }
    next
  }

  fn at_carets(selection: &Selection) -> Self {
    let tooltips: SmallVec<[Tooltip; 1]> =
      selection.carets().map(Tooltip::read_only_notice).collect();
    if tooltips.is_empty() {
      TooltipState::Hidden
    } else {
      TooltipState::Shown(tooltips)
    }
  }

  fn map(&self, tx: &Transaction) -> Self {
    let TooltipState::Shown(tooltips) = self else {
      return TooltipState::Hidden;
    };
    if tx.changes().is_empty() {
      return self.clone();
    }
    let mapped = tooltips
      .iter()
      .map(|tooltip| {
        tx.changes()
          .map_pos(tooltip.pos, Assoc::Before)
          .map(|pos| Tooltip { pos, ..*tooltip })
      })
      .collect::<Result<SmallVec<[Tooltip; 1]>, _>>();
    match mapped {
      Ok(tooltips) => TooltipState::Shown(tooltips),
      Err(err) => {
        tracing::debug!(%err, "dropping read-only tooltips that no longer map");
        TooltipState::Hidden
      },
    }
  }
}
