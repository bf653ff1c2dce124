//! Renders API responses for the terminal.
//!
//! Responses are treated as untrusted JSON: every field access has a
//! fallback and nothing is assumed about the payload shape beyond the
//! top-level collection each command expects.

use std::cmp::Reverse;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::formatters::color;
use crate::options::OutputMode;

/// Format the `groups` response: one entry per group, most victims first.
pub(crate) fn groups(data: &Value, mode: &OutputMode) -> Result<String> {
    let groups = expect_list(data, "groups")?;
    let mut sorted: Vec<&Value> = groups.iter().collect();
    sorted.sort_by_key(|group| Reverse(count(group, "victims")));

    let mut out = String::new();
    writeln!(out)?;
    writeln!(out, "[+] Found {} active groups:", groups.len())?;
    writeln!(out, "{}", "=".repeat(80))?;

    for (i, group) in sorted.iter().enumerate() {
        let name = text(group, "group").unwrap_or("Unknown");
        let victims = count(group, "victims");

        writeln!(out)?;
        writeln!(
            out,
            "{:2}. {} {}",
            i + 1,
            activity_marker(victims, mode),
            heading(name, mode)
        )?;
        if let Some(altname) = text(group, "altname") {
            if !altname.is_empty() && altname != name {
                writeln!(out, "    └─ Also known as: {altname}")?;
            }
        }
        writeln!(out, "    └─ Victims: {}", group_digits(victims))?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(80))?;
    let total: u64 = groups.iter().map(|group| count(group, "victims")).sum();
    write!(
        out,
        "Total groups: {} | Total victims: {}",
        groups.len(),
        group_digits(total)
    )?;
    Ok(out)
}

/// Format the `victims/recent` response, showing at most `limit` entries.
pub(crate) fn recent_victims(data: &Value, limit: u64, mode: &OutputMode) -> Result<String> {
    let victims = expect_list(data, "victims")?;
    let end = victims.len().min(to_index(limit));
    let shown = &victims[..end];

    let mut out = String::new();
    writeln!(out)?;
    writeln!(out, "[+] Recent victims ({}):", shown.len())?;
    writeln!(out, "{}", "=".repeat(100))?;

    for (i, victim) in shown.iter().enumerate() {
        let company = text(victim, "victim").unwrap_or("Unknown");
        let group = text(victim, "group").unwrap_or("Unknown");
        let date = text(victim, "discovered")
            .map_or_else(|| "Unknown".to_string(), discovery_date);
        let country = text(victim, "country").unwrap_or("Unknown");
        let description = text(victim, "description")
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("No details");

        writeln!(out)?;
        writeln!(out, "{:2}. {}", i + 1, heading(company, mode))?;
        writeln!(out, "    ┌─ Group:     {group}")?;
        writeln!(out, "    ├─ Date:      {date}")?;
        writeln!(out, "    ├─ Country:   {country}")?;
        if let Some(website) = text(victim, "website") {
            if !website.is_empty() {
                writeln!(out, "    ├─ Website:   {website}")?;
            }
        }
        writeln!(out, "    └─ Details:   {}", shorten(description, 80))?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(100))?;
    write!(out, "Total: {} recent victims displayed", shown.len())?;
    Ok(out)
}

/// The `victims/recent` payload with the victim list cut down to `limit`
/// entries, for raw JSON output.
pub(crate) fn truncated_victims(data: &Value, limit: u64) -> Result<Value> {
    let victims = expect_list(data, "victims")?;
    let end = victims.len().min(to_index(limit));
    Ok(json!({ "victims": victims[..end] }))
}

/// Format the detail view for a single group.
pub(crate) fn group_info(data: &Value, requested: &str, mode: &OutputMode) -> Result<String> {
    let mut out = String::new();
    writeln!(out)?;
    writeln!(out, "[+] Group information:")?;
    writeln!(out, "{}", "=".repeat(60))?;

    let name = text(data, "group").unwrap_or(requested);
    writeln!(out)?;
    writeln!(out, "{}", heading(name, mode))?;
    if let Some(altname) = text(data, "altname") {
        if !altname.is_empty() && altname != name {
            writeln!(out, "    └─ Also known as: {altname}")?;
        }
    }
    writeln!(
        out,
        "    └─ Total victims: {}",
        group_digits(count(data, "victims"))
    )?;

    let first_seen = text(data, "first_seen");
    let last_seen = text(data, "last_seen");
    if first_seen.is_some() || last_seen.is_some() {
        writeln!(out)?;
        writeln!(out, "{}", heading("Activity period:", mode))?;
        if let Some(first) = first_seen {
            writeln!(out, "    ├─ First seen: {first}")?;
        }
        if let Some(last) = last_seen {
            writeln!(out, "    └─ Last seen:  {last}")?;
        }
    }

    if let Some(ttps) = data.get("ttps").and_then(Value::as_array) {
        if !ttps.is_empty() {
            write_ttps(&mut out, ttps, mode)?;
        }
    }

    if let Some(tools) = data.get("tools") {
        write_tools(&mut out, tools, mode)?;
    }

    if let Some(description) = text(data, "description") {
        if !description.trim().is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", heading("Description:", mode))?;
            writeln!(out, "    └─ {}", shorten(description, 200))?;
        }
    }

    writeln!(out)?;
    write!(out, "{}", "=".repeat(60))?;
    Ok(out)
}

/// Format the `stats` response.
pub(crate) fn stats(data: &Value, mode: &OutputMode) -> Result<String> {
    let stats = expect_object(data, "stats")?;

    let groups = stats.get("groups").and_then(Value::as_u64).unwrap_or(0);
    let victims = stats.get("victims").and_then(Value::as_u64).unwrap_or(0);
    let press = stats.get("press").and_then(Value::as_u64).unwrap_or(0);

    let mut out = String::new();
    writeln!(out)?;
    writeln!(out, "[+] Ransomware statistics:")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out)?;
    writeln!(out, "{}", heading("Overview:", mode))?;
    writeln!(out, "    ┌─ Total groups:     {}", group_digits(groups))?;
    writeln!(out, "    ├─ Total victims:    {}", group_digits(victims))?;
    writeln!(out, "    └─ Press mentions:   {}", group_digits(press))?;

    if let Some(last_update) = text(data, "last_update") {
        writeln!(out)?;
        writeln!(out, "Last update: {last_update}")?;
    }

    if groups > 0 && victims > 0 {
        #[allow(clippy::cast_precision_loss)]
        let average = victims as f64 / groups as f64;
        writeln!(out)?;
        writeln!(out, "{}", heading("Metrics:", mode))?;
        writeln!(out, "    └─ Average victims per group: {average:.1}")?;
    }

    writeln!(out)?;
    write!(out, "{}", "=".repeat(50))?;
    Ok(out)
}

/// Tactics capped at 10 entries, techniques at 5 per tactic. The feeds
/// carry very deep TTP trees for the older groups.
fn write_ttps(out: &mut String, ttps: &[Value], mode: &OutputMode) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        heading("TTPs (tactics, techniques, procedures):", mode)
    )?;
    for (i, ttp) in ttps.iter().take(10).enumerate() {
        let tactic = text(ttp, "tactic_name").unwrap_or("Unknown");
        let tactic_id = text(ttp, "tactic_id").unwrap_or("");
        writeln!(out, "    {}. {tactic} ({tactic_id})", i + 1)?;

        let Some(techniques) = ttp.get("techniques").and_then(Value::as_array) else {
            continue;
        };
        for technique in techniques.iter().take(5) {
            let name = text(technique, "technique_name").unwrap_or("Unknown");
            let id = text(technique, "technique_id").unwrap_or("");
            let details = text(technique, "technique_details")
                .filter(|d| !d.trim().is_empty())
                .map_or_else(|| "No details available".to_string(), |d| shorten(d, 100));
            writeln!(out, "       - {name} ({id}): {details}")?;
        }
        if techniques.len() > 5 {
            writeln!(out, "       ... and {} more techniques", techniques.len() - 5)?;
        }
    }
    if ttps.len() > 10 {
        writeln!(out, "    ... and {} more TTPs", ttps.len() - 10)?;
    }
    Ok(())
}

/// Tools arrive either as a category map or a flat list, depending on the
/// group record.
fn write_tools(out: &mut String, tools: &Value, mode: &OutputMode) -> Result<()> {
    match tools {
        Value::Object(categories) if !categories.is_empty() => {
            writeln!(out)?;
            writeln!(out, "{}", heading("Tools:", mode))?;
            for (category, items) in categories {
                writeln!(out, "    {category}:")?;
                match items {
                    Value::Array(list) => {
                        for tool in list.iter().filter_map(Value::as_str) {
                            if !tool.is_empty() {
                                writeln!(out, "      - {tool}")?;
                            }
                        }
                    }
                    Value::String(tool) if !tool.is_empty() => {
                        writeln!(out, "      - {tool}")?;
                    }
                    _ => {}
                }
            }
        }
        Value::Array(list) if !list.is_empty() => {
            writeln!(out)?;
            writeln!(out, "{}", heading("Tools:", mode))?;
            let named: Vec<&str> = list
                .iter()
                .filter_map(Value::as_str)
                .filter(|tool| !tool.is_empty())
                .collect();
            for (i, tool) in named.iter().take(5).enumerate() {
                writeln!(out, "    {}. {tool}", i + 1)?;
            }
            if named.len() > 5 {
                writeln!(out, "    ... and {} more", named.len() - 5)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn expect_list<'a>(data: &'a Value, field: &str) -> Result<&'a [Value]> {
    data.get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .with_context(|| format!("unexpected API response: missing `{field}` list"))
}

fn expect_object<'a>(data: &'a Value, field: &str) -> Result<&'a serde_json::Map<String, Value>> {
    data.get(field)
        .and_then(Value::as_object)
        .with_context(|| format!("unexpected API response: missing `{field}` object"))
}

fn text<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}

fn count(value: &Value, field: &str) -> u64 {
    value.get(field).and_then(Value::as_u64).unwrap_or(0)
}

fn to_index(limit: u64) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

fn heading(label: &str, mode: &OutputMode) -> String {
    if mode.is_plain() {
        label.to_string()
    } else {
        color::BOLD.apply_to(label).to_string()
    }
}

/// A colored bullet grading how active a group is by victim count.
fn activity_marker(victims: u64, mode: &OutputMode) -> String {
    if mode.is_plain() {
        return "*".to_string();
    }
    let style = match victims {
        v if v > 100 => &color::RED,
        v if v > 50 => &color::YELLOW,
        v if v > 10 => &color::GREEN,
        _ => &color::DIM,
    };
    style.apply_to("●").to_string()
}

/// Insert thousands separators: `1234567` becomes `1,234,567`.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Collapse whitespace and truncate at a word boundary, appending `...`
/// when anything was cut.
fn shorten(input: &str, width: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let mut out = String::new();
    for word in collapsed.split(' ') {
        let candidate = out.chars().count() + word.chars().count() + usize::from(!out.is_empty());
        if candidate > width.saturating_sub(3) {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.push_str("...");
    out
}

/// Render an RFC 3339 timestamp as `YYYY-MM-DD HH:MM`; anything that does
/// not look like one is passed through untouched.
fn discovery_date(raw: &str) -> String {
    let looks_like_date = raw.len() >= 16
        && raw.is_char_boundary(16)
        && raw[..10].chars().all(|c| c.is_ascii_digit() || c == '-');
    if looks_like_date {
        raw[..16].replace('T', " ")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_groups_sorted_by_victims() {
        let data = json!({
            "groups": [
                {"group": "smallfry", "victims": 3},
                {"group": "lockbit3", "altname": "lockbit", "victims": 120},
            ]
        });
        let out = groups(&data, &OutputMode::Plain).unwrap();

        let lockbit = out.find("lockbit3").unwrap();
        let smallfry = out.find("smallfry").unwrap();
        assert!(lockbit < smallfry);
        assert!(out.contains("Also known as: lockbit"));
        assert!(out.contains("Total groups: 2 | Total victims: 123"));
    }

    #[test]
    fn test_groups_rejects_unexpected_payload() {
        let err = groups(&json!({"victims": []}), &OutputMode::Plain).unwrap_err();
        assert!(err.to_string().contains("groups"));
    }

    #[test]
    fn test_recent_victims_respects_limit() {
        let data = json!({
            "victims": [
                {"victim": "Acme Corp", "group": "lockbit3", "discovered": "2025-07-01T12:30:00Z", "country": "US"},
                {"victim": "Globex", "group": "akira", "discovered": "2025-07-02T08:00:00Z", "country": "DE"},
            ]
        });
        let out = recent_victims(&data, 1, &OutputMode::Plain).unwrap();
        assert!(out.contains("Acme Corp"));
        assert!(out.contains("Date:      2025-07-01 12:30"));
        assert!(!out.contains("Globex"));
        assert!(out.contains("Total: 1 recent victims displayed"));
    }

    #[test]
    fn test_truncated_victims() {
        let data = json!({"victims": [{"victim": "a"}, {"victim": "b"}]});
        let truncated = truncated_victims(&data, 1).unwrap();
        assert_eq!(truncated, json!({"victims": [{"victim": "a"}]}));
    }

    #[test]
    fn test_group_info_sections() {
        let data = json!({
            "group": "lockbit3",
            "victims": 1234,
            "first_seen": "2019-09-01",
            "last_seen": "2025-07-01",
            "ttps": [{
                "tactic_name": "Initial Access",
                "tactic_id": "TA0001",
                "techniques": [{
                    "technique_name": "Phishing",
                    "technique_id": "T1566",
                    "technique_details": "Spearphishing with malicious attachments"
                }]
            }],
            "tools": {"exfiltration": ["rclone", "StealBit"]},
            "description": "Ransomware-as-a-service operation"
        });
        let out = group_info(&data, "lockbit3", &OutputMode::Plain).unwrap();
        assert!(out.contains("Total victims: 1,234"));
        assert!(out.contains("First seen: 2019-09-01"));
        assert!(out.contains("Initial Access (TA0001)"));
        assert!(out.contains("- Phishing (T1566):"));
        assert!(out.contains("exfiltration:"));
        assert!(out.contains("- rclone"));
        assert!(out.contains("Ransomware-as-a-service operation"));
    }

    #[test]
    fn test_group_info_falls_back_to_requested_name() {
        let out = group_info(&json!({}), "akira", &OutputMode::Plain).unwrap();
        assert!(out.contains("akira"));
        assert!(out.contains("Total victims: 0"));
    }

    #[test]
    fn test_stats_with_average() {
        let data = json!({
            "stats": {"groups": 4, "victims": 10, "press": 2},
            "last_update": "2025-07-01"
        });
        let out = stats(&data, &OutputMode::Plain).unwrap();
        assert!(out.contains("Total groups:     4"));
        assert!(out.contains("Total victims:    10"));
        assert!(out.contains("Press mentions:   2"));
        assert!(out.contains("Last update: 2025-07-01"));
        assert!(out.contains("Average victims per group: 2.5"));
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short text", 80), "short text");
        assert_eq!(shorten("spread   over\nlines", 80), "spread over lines");
        let shortened = shorten("one two three four five six", 15);
        assert!(shortened.ends_with("..."));
        assert!(shortened.chars().count() <= 15);
    }

    #[test]
    fn test_discovery_date() {
        assert_eq!(
            discovery_date("2025-07-01T12:30:00Z"),
            "2025-07-01 12:30"
        );
        assert_eq!(discovery_date("yesterday"), "yesterday");
    }
}
