// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{future::Future, sync::OnceLock};

use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Run the provided future to completion on a lazily-built
/// current-thread runtime.
///
/// The evaluator is strictly sequential; async only exists for
/// streamed downloads, so suspension points all sit behind this call.
pub fn block_on<T, F>(task: F) -> T
where
    F: Future<Output = T>,
{
    let rt = RUNTIME.get_or_init(|| {
        Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime")
    });

    rt.block_on(task)
}
