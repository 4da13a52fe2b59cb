//! Card ownership. A card index belongs to at most one player at a time.

use lotohall_protocol::Username;

use crate::RoomError;
use crate::room::Room;

impl Room {
    /// Gives `card` to `user`. Idempotent for the current owner.
    ///
    /// Returns `true` if ownership changed.
    pub(crate) fn select_card(&mut self, user: &Username, card: u32) -> Result<bool, RoomError> {
        match self.lotos.get(&card) {
            Some(owner) if owner == user => Ok(false),
            Some(owner) => Err(RoomError::CardTaken {
                room: self.id.clone(),
                card,
                owner: owner.clone(),
            }),
            None => {
                self.lotos.insert(card, user.clone());
                Ok(true)
            }
        }
    }

    /// Frees `card` only if `user` holds it. Returns `true` if it was freed.
    pub(crate) fn unselect_card(&mut self, user: &Username, card: u32) -> bool {
        if self.lotos.get(&card) == Some(user) {
            self.lotos.remove(&card);
            true
        } else {
            false
        }
    }

    /// Frees every card held by `user`, returning their indices.
    pub(crate) fn release_cards(&mut self, user: &Username) -> Vec<u32> {
        let mut released: Vec<u32> = self
            .lotos
            .iter()
            .filter(|(_, owner)| *owner == user)
            .map(|(card, _)| *card)
            .collect();
        for card in &released {
            self.lotos.remove(card);
        }
        released.sort_unstable();
        released
    }
}
