// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::time::{Duration, Instant};

const ELAPSED_WIDTH: usize = 10;
const PROGRESS_WIDTH: usize = 6;

/// Wall-clock accounting per executor phase, printed after a
/// successful install
#[derive(Debug, Default)]
pub struct Timing {
    entries: Vec<(Kind, Duration)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Kind {
    Preflight,
    Resources,
    Fetch,
    Build,
    Stage,
    Bundle,
}

pub struct Timer(Kind, Instant);

impl Timing {
    pub fn begin(&self, kind: Kind) -> Timer {
        Timer(kind, Instant::now())
    }

    pub fn finish(&mut self, timer: Timer) {
        self.entries.push((timer.0, timer.1.elapsed()));
    }

    pub fn print_table(&self) {
        let name_width = self
            .entries
            .iter()
            .map(|(kind, _)| kind.to_string().len())
            .max()
            .unwrap_or_default()
            .max("Total".len());
        let total = self.entries.iter().map(|(_, elapsed)| *elapsed).sum::<Duration>();

        println!(
            "{:<name_width$}  {:>ELAPSED_WIDTH$} {:>PROGRESS_WIDTH$}",
            "Phases", "Elapsed", "%",
        );

        for (kind, elapsed) in &self.entries {
            println!(
                "{:<name_width$}  {:>ELAPSED_WIDTH$} {:>PROGRESS_WIDTH$}",
                kind.to_string(),
                fmt_elapsed(*elapsed),
                fmt_progress(*elapsed, total),
            );
        }

        println!(
            "{:<name_width$}  {:>ELAPSED_WIDTH$}",
            "Total",
            fmt_elapsed(total),
        );
    }
}

fn fmt_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f32();

    if secs >= 60.0 {
        format!("{}m {:05.2}s", (secs / 60.0) as u64, secs % 60.0)
    } else {
        format!("{secs:.2}s")
    }
}

fn fmt_progress(elapsed: Duration, total: Duration) -> String {
    let ratio = if total.is_zero() {
        0.0
    } else {
        elapsed.as_secs_f32() / total.as_secs_f32()
    };

    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fmt_elapsed_switches_units() {
        assert_eq!(fmt_elapsed(Duration::from_millis(1500)), "1.50s");
        assert_eq!(fmt_elapsed(Duration::from_secs(90)), "1m 30.00s");
    }

    #[test]
    fn entries_keep_order() {
        let mut timing = Timing::default();

        let timer = timing.begin(Kind::Preflight);
        timing.finish(timer);
        let timer = timing.begin(Kind::Build);
        timing.finish(timer);

        let kinds = timing.entries.iter().map(|(kind, _)| *kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![Kind::Preflight, Kind::Build]);
    }
}
