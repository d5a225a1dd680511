//! Plain-text output for the terminal.

use std::fmt::Write as _;

use products_directory::{ImportSummary, RecordId, Snapshot, TeamMember};

pub fn member_line(member: &TeamMember) -> String {
    let mut line = format!("#{:<4} {}", member.id, member.full_name());
    if !member.position.is_empty() {
        let _ = write!(line, ", {}", member.position);
    }
    if !member.department.is_empty() {
        let _ = write!(line, " ({})", member.department);
    }
    line
}

pub fn member_table(members: &[&TeamMember]) -> String {
    if members.is_empty() {
        return "no team members".to_string();
    }
    members
        .iter()
        .map(|member| member_line(member))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn member_detail(snapshot: &Snapshot, member: &TeamMember) -> String {
    let location = member
        .location_id
        .and_then(|id| snapshot.location(id))
        .map(|location| location.name.as_str())
        .unwrap_or("-");
    let manager = snapshot
        .manager_of(member.id)
        .map(TeamMember::full_name)
        .unwrap_or_else(|| "-".to_string());
    let reports = snapshot.direct_reports(member.id).len();
    let mut out = member_line(member);
    let _ = write!(
        out,
        "\n  email:    {}\n  location: {location}\n  manager:  {manager}\n  reports:  {reports}",
        if member.email.is_empty() { "-" } else { member.email.as_str() },
    );
    out
}

/// The member first, then each manager above them, indented one step per level.
pub fn chain(member: &TeamMember, managers: &[&TeamMember]) -> String {
    std::iter::once(member)
        .chain(managers.iter().copied())
        .enumerate()
        .map(|(depth, member)| format!("{}{}", "  ".repeat(depth), member_line(member)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn named<'a>(rows: impl Iterator<Item = (RecordId, &'a str)>) -> String {
    let lines: Vec<String> = rows.map(|(id, name)| format!("#{id:<4} {name}")).collect();
    if lines.is_empty() {
        "none".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn import_summary(summary: &ImportSummary) -> String {
    let mut out = format!("imported {} row(s)", summary.imported);
    for rejected in &summary.rejected {
        let _ = write!(out, "\n  skipped line {}: {}", rejected.line, rejected.reason);
    }
    out
}
