//! Crontab rendering of registered schedules, for installation into the
//! system cron daemon.

use super::ScheduleEntry;

/// First line of every rendered crontab
pub const CRONTAB_HEADER: &str = "# jobflow process triggers (generated by `jobflow-trigger rebuild`)";

/// One crontab line: the cron expression, `program`, then the entry's
/// arguments, shell-quoted.
pub fn crontab_line(entry: &ScheduleEntry, program: &str) -> String {
    let mut line = format!("{} {}", entry.cron, escape_percent(program));
    for argument in entry.arguments() {
        line.push(' ');
        line.push_str(&escape_percent(&shell_quote(&argument)));
    }
    line
}

/// Full crontab for `entries`, one line each, in the order given.
pub fn render_crontab(entries: &[ScheduleEntry], program: &str) -> String {
    let mut crontab = String::from(CRONTAB_HEADER);
    crontab.push('\n');
    for entry in entries {
        crontab.push_str(&crontab_line(entry, program));
        crontab.push('\n');
    }
    crontab
}

fn shell_quote(argument: &str) -> String {
    let plain = !argument.is_empty()
        && argument
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./:,@+".contains(c));
    if plain {
        argument.to_string()
    } else {
        format!("'{}'", argument.replace('\'', r"'\''"))
    }
}

// cron turns an unescaped `%` into a newline
fn escape_percent(value: &str) -> String {
    value.replace('%', r"\%")
}
