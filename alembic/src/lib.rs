// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0
pub use self::defaults::Defaults;
pub use self::env::Env;
pub use self::paths::Paths;
pub use self::recipe::Recipe;
pub use self::timing::Timing;

pub mod build;
pub mod defaults;
pub mod dependency;
pub mod env;
pub mod interpreter;
pub mod paths;
pub mod recipe;
pub mod request;
pub mod runtime;
pub mod style;
pub mod timing;
pub mod util;
