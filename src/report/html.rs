//! Standalone HTML report

use crate::analyzer::Report;
use crate::report::Summary;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, reports: &[Report]) -> io::Result<()> {
    let summary = Summary::from_reports(reports);

    // Suspicious first, then by number of reasons, then highest entropy
    let mut sorted: Vec<&Report> = reports.iter().collect();
    sorted.sort_by(|a, b| {
        b.suspicious
            .cmp(&a.suspicious)
            .then(b.reasons.len().cmp(&a.reasons.len()))
            .then(b.entropy.total_cmp(&a.entropy))
    });

    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>sigsift Analysis Report</title>
    <style>
        :root {{
            --bg: #0d1117;
            --card: #161b22;
            --border: #30363d;
            --text: #e6edf3;
            --dim: #7d8590;
            --ok: #3fb950;
            --suspicious: #f85149;
            --accent: #58a6ff;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }}
        .container {{ max-width: 1600px; margin: 0 auto; padding: 2rem; }}
        .header {{ margin-bottom: 2rem; padding-bottom: 1rem; border-bottom: 1px solid var(--border); }}
        .logo {{ font-size: 2.5rem; font-weight: 800; color: var(--accent); }}
        .subtitle {{ color: var(--dim); }}
        .stats {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; margin-bottom: 2rem; }}
        .stat {{ background: var(--card); border: 1px solid var(--border); border-radius: 12px; padding: 1.5rem; text-align: center; }}
        .stat-value {{ font-size: 3rem; font-weight: 700; line-height: 1; }}
        .stat-label {{ color: var(--dim); font-size: 0.875rem; text-transform: uppercase; margin-top: 0.5rem; }}
        .stat.ok .stat-value {{ color: var(--ok); }}
        .stat.suspicious .stat-value {{ color: var(--suspicious); }}
        table {{ width: 100%; border-collapse: collapse; background: var(--card); }}
        th, td {{ text-align: left; padding: 0.6rem 0.8rem; border-bottom: 1px solid var(--border); vertical-align: top; }}
        th {{ color: var(--dim); font-size: 0.8rem; text-transform: uppercase; }}
        code {{ font-family: ui-monospace, SFMono-Regular, Menlo, monospace; font-size: 0.8rem; color: var(--dim); }}
        .verdict-ok {{ color: var(--ok); font-weight: 600; }}
        .verdict-suspicious {{ color: var(--suspicious); font-weight: 600; }}
        ul {{ list-style: none; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div class="logo">sigsift</div>
            <div class="subtitle">File Signature &amp; Anomaly Report</div>
        </div>

        <div class="stats">
            <div class="stat ok">
                <div class="stat-value">{clean}</div>
                <div class="stat-label">Clean</div>
            </div>
            <div class="stat suspicious">
                <div class="stat-value">{suspicious}</div>
                <div class="stat-label">Suspicious</div>
            </div>
            <div class="stat">
                <div class="stat-value">{total}</div>
                <div class="stat-label">Total Files</div>
            </div>
        </div>

        <table>
            <thead>
                <tr>
                    <th>Verdict</th>
                    <th>File</th>
                    <th>Ext</th>
                    <th>Detected</th>
                    <th>Embedded</th>
                    <th>Entropy</th>
                    <th>Reasons</th>
                </tr>
            </thead>
            <tbody>
"#,
        clean = summary.clean,
        suspicious = summary.suspicious,
        total = summary.total,
    )?;

    for r in sorted {
        write_row(writer, r)?;
    }

    write!(
        writer,
        r#"            </tbody>
        </table>
    </div>
</body>
</html>
"#
    )?;
    writer.flush()
}

fn write_row<W: Write>(writer: &mut W, r: &Report) -> io::Result<()> {
    let (class, label) = if r.suspicious {
        ("verdict-suspicious", "SUSPICIOUS")
    } else {
        ("verdict-ok", "CLEAN")
    };

    let detected = if r.detected_signature.is_empty() {
        "-".to_string()
    } else {
        html_escape(&r.detected_signature.join(", "))
    };

    let embedded: Vec<String> = r
        .embedded_signatures
        .iter()
        .filter(|d| d.offset > 0)
        .map(|d| format!("{}@{}", html_escape(&d.label), d.offset))
        .collect();

    let reasons: String = r
        .reasons
        .iter()
        .map(|reason| format!("<li>{}</li>", html_escape(reason)))
        .collect();

    writeln!(
        writer,
        r#"                <tr>
                    <td class="{class}">{label}</td>
                    <td>{file}<br><code>{header}</code></td>
                    <td>{ext}</td>
                    <td>{detected}</td>
                    <td>{embedded}</td>
                    <td>{entropy:.2}</td>
                    <td><ul>{reasons}</ul></td>
                </tr>"#,
        file = html_escape(&r.file),
        header = html_escape(&r.header_hex),
        ext = html_escape(&r.extension),
        embedded = if embedded.is_empty() {
            "-".to_string()
        } else {
            embedded.join(" ")
        },
        entropy = r.entropy,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
