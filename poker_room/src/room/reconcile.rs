//! Client-side view of staged bets.
//!
//! Stage hints arrive before the row update that persists them, and row
//! updates can arrive out of order with respect to local gestures. The view
//! keeps the larger of what it has seen locally and what storage reports,
//! and treats a stored zero as authoritative (a clear, confirm or action).

use std::collections::HashMap;

use super::events::{BetHint, HintKind};
use crate::game::{Chips, Player, PlayerId};

/// Merge a locally observed staged amount with the last stored value.
pub fn merge_staged(local: Chips, remote: Chips) -> Chips {
    if remote == 0 { 0 } else { local.max(remote) }
}

/// Staged amounts per player as a subscriber should display them.
#[derive(Clone, Debug, Default)]
pub struct StagedBets {
    amounts: HashMap<PlayerId, Chips>,
}

impl StagedBets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: &str) -> Chips {
        self.amounts.get(player_id).copied().unwrap_or(0)
    }

    /// Fold a stored row into the view. Returns the displayed amount.
    pub fn reconcile(&mut self, player: &Player) -> Chips {
        let merged = merge_staged(self.get(&player.player_id), player.staged_bet);
        self.set(&player.player_id, merged);
        merged
    }

    pub fn reconcile_all<'a>(&mut self, players: impl IntoIterator<Item = &'a Player>) {
        for player in players {
            self.reconcile(player);
        }
    }

    /// Optimistically apply an animation hint ahead of the row update.
    pub fn apply_hint(&mut self, hint: &BetHint) -> Chips {
        let next = match hint.kind {
            HintKind::Stage => self.get(&hint.player_id) + hint.amount,
            HintKind::Bet => 0,
        };
        self.set(&hint.player_id, next);
        next
    }

    fn set(&mut self, player_id: &str, amount: Chips) {
        if amount == 0 {
            self.amounts.remove(player_id);
        } else {
            self.amounts.insert(player_id.to_string(), amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::NewPlayer;

    fn row(staged: Chips) -> Player {
        let mut player = NewPlayer {
            name: "alice".to_string(),
            avatar: "A".to_string(),
            seat: 2,
            buy_in: 500,
            color: None,
        }
        .into_player("ROOM01", "player_a");
        player.staged_bet = staged;
        player
    }

    #[test]
    fn merge_prefers_larger_value() {
        assert_eq!(merge_staged(50, 30), 50);
        assert_eq!(merge_staged(30, 50), 50);
    }

    #[test]
    fn remote_zero_resets() {
        assert_eq!(merge_staged(80, 0), 0);
    }

    #[test]
    fn stale_row_does_not_shrink_optimistic_stage() {
        let mut view = StagedBets::new();
        view.apply_hint(&BetHint::stage("player_a", 25, None));
        view.apply_hint(&BetHint::stage("player_a", 25, None));

        // Row written after the first gesture only.
        assert_eq!(view.reconcile(&row(25)), 50);
        assert_eq!(view.reconcile(&row(50)), 50);
    }

    #[test]
    fn confirm_clears_view() {
        let mut view = StagedBets::new();
        view.reconcile(&row(40));
        assert_eq!(view.get("player_a"), 40);

        view.reconcile(&row(0));
        assert_eq!(view.get("player_a"), 0);
    }

    #[test]
    fn bet_hint_clears_staged_chips() {
        let mut view = StagedBets::new();
        view.reconcile(&row(40));
        let hint = BetHint {
            kind: HintKind::Bet,
            player_id: "player_a".to_string(),
            amount: 40,
            velocity: None,
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(view.apply_hint(&hint), 0);
    }
}
