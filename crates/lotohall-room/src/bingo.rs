//! The bingo approval workflow: claim queue, verdicts, restart.
//!
//! Players shout "bingo!" with the numbers they think complete their card.
//! Claims wait in a FIFO queue, one entry per player; while anything is
//! queued the drawer holds still. The admin settles the head of the queue:
//! approving ends the game for everyone, rejecting drops only that claim.

use lotohall_protocol::{BingoClaim, Username};

use crate::room::{Room, unix_secs};
use crate::{GameEvent, RoomError, Winner};

/// What happened to a submitted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimReceipt {
    /// New entry at this 0-based queue position.
    Queued(usize),
    /// The player already had an entry; its numbers were replaced in place.
    Updated(usize),
}

/// Outcome of settling the head claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The claim won. The queue is empty and the game is over.
    Approved(Winner),
    /// The claim was dropped. `remaining` claims are still queued.
    Rejected { user: Username, remaining: usize },
}

impl Room {
    /// Queues (or updates) `user`'s claim and pauses the draw.
    ///
    /// `nums` must already be validated.
    pub(crate) fn submit_claim(
        &mut self,
        user: &Username,
        nums: String,
    ) -> Result<ClaimReceipt, RoomError> {
        if self.phase.is_won() {
            return Err(RoomError::forbidden(&self.id, "game already won"));
        }

        if let Some(pos) = self.bingo_queue.iter().position(|c| &c.user == user) {
            self.bingo_queue[pos].nums = nums;
            return Ok(ClaimReceipt::Updated(pos));
        }

        self.bingo_queue.push_back(BingoClaim {
            user: user.clone(),
            nums,
        });
        self.transition(GameEvent::ClaimQueued)?;
        Ok(ClaimReceipt::Queued(self.bingo_queue.len() - 1))
    }

    /// Settles the claim at the head of the queue.
    pub(crate) fn resolve_claim(&mut self, approve: bool) -> Result<Verdict, RoomError> {
        let Some(head) = self.bingo_queue.front().cloned() else {
            return Err(RoomError::forbidden(&self.id, "no pending bingo claim"));
        };

        if approve {
            let winner = Winner {
                user: head.user,
                nums: head.nums,
                approved_at: unix_secs(),
            };
            self.transition(GameEvent::Approve(winner.clone()))?;
            self.bingo_queue.clear();
            self.game = 0;
            return Ok(Verdict::Approved(winner));
        }

        self.bingo_queue.pop_front();
        if self.bingo_queue.is_empty() {
            self.transition(GameEvent::QueueEmptied)?;
        }
        Ok(Verdict::Rejected {
            user: head.user,
            remaining: self.bingo_queue.len(),
        })
    }

    /// Resets a won game to a fresh, not-yet-started state.
    pub(crate) fn restart(&mut self) -> Result<(), RoomError> {
        if !self.phase.is_won() {
            return Err(RoomError::forbidden(&self.id, "game not won, cannot restart"));
        }
        self.transition(GameEvent::Restart)?;
        self.reset_draw();
        self.game = 0;
        Ok(())
    }
}
