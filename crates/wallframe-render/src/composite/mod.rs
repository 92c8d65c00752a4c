// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mockup compositing: perspective placement, spill cleanup, platform sizing
// and logo branding.

pub mod branding;
pub mod compositor;
pub mod spill;

pub use branding::apply_logo;
pub use compositor::{Compositor, DEFAULT_OVERSHOOT_PX, load_room};
pub use spill::remove_spill;
