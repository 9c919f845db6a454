// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One module per subcommand.

pub mod annotate;
pub mod cut;
pub mod detect;
pub mod profiles;
