//! CSV report, one row per analyzed file

use crate::analyzer::Report;
use std::io::{self, Write};

const HEADER: &str = "file,extension,detected,embedded_count,entropy,suspicious,reasons";

pub fn write<W: Write>(writer: &mut W, reports: &[Report]) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;
    for r in reports {
        writeln!(
            writer,
            "{},{},{},{},{:.4},{},{}",
            escape(&r.file),
            escape(&r.extension),
            escape(&r.detected_signature.join("|")),
            r.embedded_signatures.len(),
            r.entropy,
            r.suspicious,
            escape(&r.reasons.join("; "))
        )?;
    }
    writer.flush()
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::report;

    #[test]
    fn test_header_and_row() {
        let mut out = Vec::new();
        write(&mut out, &[report("docs/a.pdf", true)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "docs/a.pdf,pdf,pdf,2,3.2500,true,Embedded file detected: zip at offset 100"
        );
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut r = report("a,b.pdf", true);
        r.reasons = vec!["Extension 'x' does not match detected type(s): ['a', 'b']".to_string()];
        let mut out = Vec::new();
        write(&mut out, &[r]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("\"a,b.pdf\""));
        assert!(text.contains("\"Extension 'x' does not match detected type(s): ['a', 'b']\""));
    }

    #[test]
    fn test_escape_doubles_quotes() {
        assert_eq!(escape(r#"say "hi""#), r#""say ""hi""""#);
        assert_eq!(escape("plain"), "plain");
    }
}
