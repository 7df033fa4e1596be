use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};
use pyship_installer::{
    BootstrapAction, DependencySync, InstalledState, ProvisionReport, PthPatch, RecoveredSeverity,
    RuntimeAction,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool) -> OutputStyle {
    if stdout_is_tty {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

fn current_output_style() -> OutputStyle {
    resolve_output_style(std::io::stdout().is_terminal())
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        if self.style == OutputStyle::Rich {
            println!();
            println!("{}", colorize(section_style(), &format!("== {title} ==")));
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    /// Byte-level bar for archive downloads. Plain output gets none.
    pub(crate) fn download_progress(self) -> Option<ProgressBar> {
        if self.style != OutputStyle::Rich || !std::io::stderr().is_terminal() {
            return None;
        }
        let progress_bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.cyan.bold} {msg:<10} [{bar:24.cyan/blue}] {bytes:>10}/{total_bytes:10} {bytes_per_sec}",
        ) {
            progress_bar.set_style(style.tick_chars("|/-\\ ").progress_chars("=>-"));
        }
        progress_bar.set_message("download");
        progress_bar.enable_steady_tick(Duration::from_millis(80));
        Some(progress_bar)
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("[{}] {message}", status.to_ascii_uppercase()),
    }
}

pub(crate) fn format_report_lines(report: &ProvisionReport, style: OutputStyle) -> Vec<String> {
    let mut lines = vec![
        format!(
            "application: {} {}",
            report.metadata.app_name, report.metadata.version
        ),
        format!(
            "classification: {}",
            report.decision.classification.as_str()
        ),
        format!("installed state: {}", report.installed_state.label()),
    ];

    if let Some(wipe) = &report.wipe {
        lines.push(format!(
            "wipe: removed {} preserved {} failed {}",
            wipe.removed.len(),
            wipe.preserved.len(),
            wipe.failures.len()
        ));
    }

    lines.push(match &report.runtime.action {
        RuntimeAction::Reused => format!("runtime: {} reused", report.metadata.runtime_version),
        RuntimeAction::Provisioned { files, .. } => format!(
            "runtime: {} provisioned ({files} files)",
            report.metadata.runtime_version
        ),
    });
    match &report.runtime.pth {
        PthPatch::Applied { path } => lines.push(format!("path file: {}", path.display())),
        PthPatch::SkippedNoTemplate => lines.push("path file: template missing".to_string()),
        PthPatch::NotNeeded => {}
    }

    lines.push(match &report.package_manager {
        BootstrapAction::AlreadyPresent { version_line } => {
            format!("package manager: {version_line}")
        }
        BootstrapAction::Installed { version_line } => {
            format!("package manager: bootstrapped {version_line}")
        }
    });
    lines.push(match &report.dependencies.sync {
        DependencySync::NoDescriptor => "dependencies: no descriptor".to_string(),
        DependencySync::NothingToInstall => "dependencies: none".to_string(),
        DependencySync::Installed { specs } => format!("dependencies: {}", specs.join(", ")),
    });

    let recovered = report
        .runtime
        .recovered
        .iter()
        .chain(&report.dependencies.recovered)
        .chain(report.wipe.iter().flat_map(|wipe| &wipe.failures));
    for item in recovered {
        let status = match item.severity {
            RecoveredSeverity::Warn => "warn",
            RecoveredSeverity::Error => "error",
        };
        lines.push(render_status_line(style, status, &item.message));
    }
    lines
}

pub(crate) fn format_probe_lines(state: &InstalledState) -> Vec<String> {
    match state {
        InstalledState::NoPriorInstall => vec!["state: NoPriorInstall".to_string()],
        InstalledState::CompatibleInstall {
            record,
            runtime_version,
        } => vec![
            format!("state: {}", state.label()),
            format!("recorded: {} {}", record.app_name, record.version),
            format!("runtime: {runtime_version}"),
        ],
        InstalledState::IncompatibleOrStale { record, reason } => vec![
            format!("state: {}", state.label()),
            format!("recorded: {} {}", record.app_name, record.version),
            format!("reason: {}", reason.describe()),
        ],
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
