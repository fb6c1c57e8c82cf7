// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cached switch state.
//!
//! The [`SwitchCache`] holds the last state confirmed by the device, either
//! by a successful set or by a successful read. It answers host queries
//! without any network I/O.
//!
//! # Examples
//!
//! ```
//! use sonoff_diy::state::SwitchCache;
//! use sonoff_diy::types::SwitchState;
//!
//! let cache = SwitchCache::new();
//! assert_eq!(cache.get(), None);
//!
//! assert!(cache.reconcile(SwitchState::On));
//! assert!(!cache.reconcile(SwitchState::On));
//! assert_eq!(cache.get(), Some(SwitchState::On));
//! ```

mod switch_cache;

pub use switch_cache::SwitchCache;
