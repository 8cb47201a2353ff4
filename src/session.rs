use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::CityCatalog;
use crate::city::CityRecord;

/// Separator placed between names in the visited trail.
pub const TRAIL_SEPARATOR: &str = " -> ";

/// What the page shows for the most recent pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing picked yet, or history was just cleared.
    NoSelection,
    /// Current photo shown with its name plate covered.
    Masked,
    /// Current photo shown in full.
    Revealed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no selectable cities are available")]
    EmptyPool,
    #[error("no city has been selected yet")]
    NothingSelected,
    #[error("clearing history requires confirmation")]
    ClearNotConfirmed,
}

/// Per-session quiz state. One value per visitor; nothing here is global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    history: Vec<u32>,
    revealed: bool,
    clear_confirmed: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picked city numbers, most recent last.
    pub fn history(&self) -> &[u32] {
        &self.history
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_clear_confirmed(&self) -> bool {
        self.clear_confirmed
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.history.is_empty(), self.revealed) {
            (true, _) => SessionPhase::NoSelection,
            (false, false) => SessionPhase::Masked,
            (false, true) => SessionPhase::Revealed,
        }
    }

    /// Picks a city uniformly from the catalog's valid ids and makes it current.
    ///
    /// Earlier picks are not excluded, so the same city can come up twice in a row.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyPool`] when the catalog has no selectable city.
    pub fn pick_next<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        catalog: &CityCatalog,
    ) -> Result<u32, SessionError> {
        let number = *catalog
            .valid_ids()
            .choose(rng)
            .ok_or(SessionError::EmptyPool)?;

        self.history.push(number);
        self.revealed = false;

        Ok(number)
    }

    /// Lifts the mask on the current photo. Calling it twice is harmless.
    ///
    /// # Errors
    /// Returns [`SessionError::NothingSelected`] when history is empty.
    pub fn reveal(&mut self) -> Result<(), SessionError> {
        if self.history.is_empty() {
            return Err(SessionError::NothingSelected);
        }

        self.revealed = true;
        Ok(())
    }

    /// Mirrors the confirmation checkbox next to the clear button.
    pub fn set_clear_confirmation(&mut self, checked: bool) {
        self.clear_confirmed = checked;
    }

    /// Empties history. Only runs once the confirmation flag is set, and
    /// unsets it again afterwards.
    ///
    /// # Errors
    /// Returns [`SessionError::ClearNotConfirmed`] and leaves state untouched
    /// when the confirmation flag is not set.
    pub fn clear_history(&mut self) -> Result<(), SessionError> {
        if !self.clear_confirmed {
            return Err(SessionError::ClearNotConfirmed);
        }

        self.history.clear();
        self.revealed = false;
        self.clear_confirmed = false;
        Ok(())
    }

    pub fn current_number(&self) -> Option<u32> {
        self.history.last().copied()
    }

    pub fn current_city<'a>(&self, catalog: &'a CityCatalog) -> Option<&'a CityRecord> {
        self.current_number().and_then(|number| catalog.get(number))
    }

    /// Numbers of every pick before the current one, in order.
    pub fn visited_numbers(&self) -> &[u32] {
        match self.history.split_last() {
            Some((_, visited)) => visited,
            None => &[],
        }
    }

    /// Names of every pick before the current one, in order, repeats kept.
    pub fn visited_names(&self, catalog: &CityCatalog) -> Vec<String> {
        self.visited_numbers()
            .iter()
            .filter_map(|number| catalog.get(*number))
            .map(|city| city.name.clone())
            .collect()
    }

    pub fn trail(&self, catalog: &CityCatalog) -> String {
        self.visited_names(catalog).join(TRAIL_SEPARATOR)
    }
}
