// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last confirmed switch state.

use parking_lot::RwLock;

use crate::types::SwitchState;

/// Last switch state confirmed by the device.
///
/// Starts unknown (`None`). Only successful device operations write to it;
/// no history is kept.
#[derive(Debug, Default)]
pub struct SwitchCache {
    state: RwLock<Option<SwitchState>>,
}

impl SwitchCache {
    /// Creates a cache in the unknown state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache already holding `state`.
    #[must_use]
    pub fn with_state(state: SwitchState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }

    /// Returns the cached state, or `None` if no operation has succeeded yet.
    #[must_use]
    pub fn get(&self) -> Option<SwitchState> {
        *self.state.read()
    }

    /// Records the outcome of a successful set.
    pub fn store(&self, state: SwitchState) {
        *self.state.write() = Some(state);
    }

    /// Records an observed state and reports whether it differed.
    ///
    /// An unknown cache differs from every observation.
    pub fn reconcile(&self, observed: SwitchState) -> bool {
        let mut state = self.state.write();
        if *state == Some(observed) {
            return false;
        }
        *state = Some(observed);
        true
    }
}
