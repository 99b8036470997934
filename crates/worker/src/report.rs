use std::fmt::Write;
use takeoff_core::domain::candidate::symbol_code;
use takeoff_core::domain::evaluation::EvaluationResult;

/// Plain-text table of matches in the order given. Volume is shown in lots of 1,000 shares.
pub fn render_table(matches: &[EvaluationResult]) -> String {
    if matches.is_empty() {
        return "no matches\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:>10} {:>12} {:>8} {:<6}",
        "code", "close", "volume_lots", "bias", "trend"
    );
    for m in matches {
        let _ = writeln!(
            out,
            "{:<8} {:>10.2} {:>12} {:>8} {:<6}",
            symbol_code(&m.symbol),
            m.close,
            m.volume_lots(),
            m.bias_display(),
            m.trend
        );
    }
    let _ = writeln!(out, "{} match(es)", matches.len());
    out
}
