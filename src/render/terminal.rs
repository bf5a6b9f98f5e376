use std::io::Write;

use crate::clock;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::render::{Renderer, ViewModel};

const BAR_WIDTH: usize = 30;

/// Prints a text panel per applied view.
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    show_clock: bool,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, show_clock: true }
    }

    /// Deterministic output for tests and piping.
    pub fn without_clock(mut self) -> Self {
        self.show_clock = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn panel(&self, view: &ViewModel) -> String {
        let mut s = String::new();
        let stamp = if self.show_clock {
            format!("  [{}]", clock::hms(&chrono::Local::now()))
        } else {
            String::new()
        };
        s.push_str(&format!("== {} ({}){}\n", view.hud_name, view.title_color, stamp));
        s.push_str(&format!("   species  {}\n", view.title));
        s.push_str(&format!("   harmony  {}\n", view.harmony));
        s.push_str(&format!("   input    {}\n", view.input));
        for (species, p, _) in view.bars() {
            s.push_str(&format!(
                "   {:<10} {:<width$} {:.3}\n",
                species.short_name(),
                bar(p),
                p,
                width = BAR_WIDTH
            ));
        }
        let r = view.radar.data;
        s.push_str(&format!(
            "   radar    SL {:.2}  SW {:.2}  PL {:.2}  PW {:.2}  ({})\n",
            r[0], r[1], r[2], r[3], view.radar.fill_color
        ));
        let m = view.mesh.scale;
        s.push_str(&format!(
            "   mesh     scale {:.3} x {:.3} x {:.3}  color {}\n",
            m[0], m[1], m[2], view.mesh.color
        ));
        s
    }
}

fn bar(p: f64) -> String {
    let filled = (p.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, view: &ViewModel) {
        let panel = self.panel(view);
        if let Err(err) = self.out.write_all(panel.as_bytes()).and_then(|_| self.out.flush()) {
            log(
                Level::Warn,
                Domain::Render,
                "write_failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }
}
