// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate selection over the latest analysis.
//!
//! Two modes coexist: per-row toggle and a random sampler that uniformly
//! shuffles the analysis list and keeps 2-4 entries. A selection is bound to
//! one analysis identity; a newer analysis drops it.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;
use resona_core::{ResonaError, UserId};
use tracing::debug;

use crate::EngagePanel;

/// The selected user ids of one analysis.
#[derive(Debug, Clone, Default)]
pub(crate) struct Selection {
    analysis_id: Option<u64>,
    selected: BTreeSet<UserId>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_analysis(analysis_id: u64) -> Self {
        Self {
            analysis_id: Some(analysis_id),
            selected: BTreeSet::new(),
        }
    }

    /// True when this selection belongs to `analysis_id` and is non-empty.
    pub fn applies_to(&self, analysis_id: u64) -> bool {
        self.analysis_id == Some(analysis_id) && !self.selected.is_empty()
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.selected.contains(user_id)
    }

    pub fn user_ids(&self) -> &BTreeSet<UserId> {
        &self.selected
    }

    pub(crate) fn toggle(&mut self, user_id: UserId) -> bool {
        if self.selected.remove(&user_id) {
            false
        } else {
            self.selected.insert(user_id);
            true
        }
    }
}

impl EngagePanel {
    /// Toggle one row of the current analysis. Returns whether the user is
    /// now selected.
    pub async fn toggle_selection(&self, user_id: &UserId) -> Result<bool, ResonaError> {
        let mut state = self.state.lock().await;
        let analysis_id = match state.analysis.as_ref() {
            Some(analysis) if analysis.engagers.iter().any(|e| &e.user_id == user_id) => {
                analysis.id
            }
            Some(_) => {
                return Err(ResonaError::Validation(format!(
                    "user {user_id} is not part of the current analysis"
                )));
            }
            None => {
                return Err(ResonaError::Validation(
                    "run an analysis before selecting".to_string(),
                ));
            }
        };

        if state.selection.analysis_id != Some(analysis_id) {
            state.selection = Selection::for_analysis(analysis_id);
        }
        let now_selected = state.selection.toggle(user_id.clone());
        self.publish(&state);
        Ok(now_selected)
    }

    /// Replace the selection with a uniform random sample of 2-4 candidates
    /// (fewer when the analysis is smaller). The injected `rng` makes the
    /// sample reproducible under a fixed seed.
    pub async fn select_random<R: Rng>(&self, rng: &mut R) -> Result<Vec<UserId>, ResonaError> {
        let mut state = self.state.lock().await;
        let analysis = state.analysis.as_ref().ok_or_else(|| {
            ResonaError::Validation("run an analysis before selecting".to_string())
        })?;
        if analysis.engagers.is_empty() {
            return Err(ResonaError::Validation(
                "the current analysis has no candidates".to_string(),
            ));
        }

        let analysis_id = analysis.id;
        let want = rng.gen_range(2..=4usize).min(analysis.engagers.len());
        let mut indices: Vec<usize> = (0..analysis.engagers.len()).collect();
        indices.shuffle(rng);
        let picked: Vec<UserId> = indices
            .into_iter()
            .take(want)
            .map(|i| analysis.engagers[i].user_id.clone())
            .collect();

        let mut selection = Selection::for_analysis(analysis_id);
        for user_id in &picked {
            selection.toggle(user_id.clone());
        }
        debug!(count = picked.len(), "random sample selected");
        state.selection = selection;
        self.publish(&state);
        Ok(picked)
    }

    /// The currently selected user ids, in id order.
    pub async fn selected_user_ids(&self) -> Vec<UserId> {
        let state = self.state.lock().await;
        state.selection.user_ids().iter().cloned().collect()
    }

    /// Drop the selection.
    pub async fn clear_selection(&self) {
        let mut state = self.state.lock().await;
        state.selection = Selection::empty();
        self.publish(&state);
    }
}
