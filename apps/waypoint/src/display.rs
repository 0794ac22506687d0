//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use console::{Style, Term};
use std::io;
use waypoint_install::{InstallSummary, TestScenario};
use waypoint_types::ColorChoice;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render the outcome of a finished install
    pub fn render_summary(&self, summary: &InstallSummary) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::json!({
                "installed": summary.installed,
                "failed": summary.failed,
                "skipped": summary.skipped,
                "successLink": summary.success_link,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).map_err(io::Error::other)?
            );
            return Ok(());
        }

        println!();
        println!("{}", self.bold("Installation Summary"));
        println!();

        if summary.total_attempted() == 0 && summary.skipped.is_empty() {
            println!("Nothing was installed.");
        }

        for (label, names) in [
            ("Installed", &summary.installed),
            ("Failed", &summary.failed),
            ("Skipped", &summary.skipped),
        ] {
            if names.is_empty() {
                continue;
            }
            println!("{label} ({}):", names.len());
            for name in names {
                println!("  • {name}");
            }
            println!();
        }

        if let Some(link) = &summary.success_link {
            println!("View your data at: {link}");
        }

        Ok(())
    }

    /// Render the scripted scenarios available to `install --scenario`
    pub fn render_scenarios(&self, scenarios: &[TestScenario]) -> io::Result<()> {
        if self.json_output {
            let json: Vec<_> = scenarios
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.as_str(),
                        "description": s.description(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json).map_err(io::Error::other)?
            );
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Scenario").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
        ]);

        for scenario in scenarios {
            table.add_row(vec![
                Cell::new(scenario.as_str()),
                Cell::new(scenario.description()),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    fn bold(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    pub fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}
