//! HTML rendering of the daily report.
//!
//! Consumes the composed [`Report`] — it never re-classifies or re-diffs.
//! Every section is always emitted; an empty section renders an explicit
//! "Ninguno" placeholder rather than disappearing. All record-sourced text
//! is HTML-escaped.

use chrono::{DateTime, Utc};

use cimawatch_core::report::{Priority, Report, ReportEntry, ResolvedEntry};
use cimawatch_core::{EndEstimate, Verdict};

/// Subject line for the day's report, derived from the report priority.
pub fn subject(report: &Report) -> String {
    let date = report.meta.date.format("%d/%m/%Y");
    let (new_count, _, resolved_count) = report.counts();
    match report.priority() {
        Priority::Urgent => {
            let plural = if new_count > 1 { "s" } else { "" };
            format!(
                "🚨 CIMA Watch — {new_count} nuevo{plural} desabastecimiento{plural} ({date})"
            )
        }
        Priority::ResolvedOnly => {
            let plural = if resolved_count > 1 { "s" } else { "" };
            format!(
                "✅ CIMA Watch — {resolved_count} medicamento{plural} restablecido{plural} ({date})"
            )
        }
        Priority::Routine => format!("📊 CIMA Watch — Informe diario ({date})"),
    }
}

/// Renders the full HTML body of the report email.
pub fn render_html(report: &Report) -> String {
    let (new_count, continuing_count, resolved_count) = report.counts();

    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n");
    html.push_str("<body style=\"margin:0;padding:0;background-color:#f1f5f9;font-family:-apple-system,'Segoe UI',Roboto,sans-serif;\">\n");
    html.push_str("<div style=\"max-width:800px;margin:0 auto;padding:24px;\">\n");

    // Header
    html.push_str("<div style=\"background:#0d9488;border-radius:12px;padding:24px;text-align:center;margin-bottom:24px;\">");
    html.push_str("<h1 style=\"margin:0;color:#ffffff;font-size:24px;\">💊 CIMA Watch</h1>");
    html.push_str("<p style=\"margin:8px 0 0;color:#ccfbf1;font-size:14px;\">Informe Diario de Desabastecimientos</p>");
    html.push_str(&format!(
        "<p style=\"margin:4px 0 0;color:#99f6e4;font-size:13px;\">{} — {}</p>",
        escape(&report.meta.hospital_name),
        report.meta.date.format("%d/%m/%Y")
    ));
    html.push_str("</div>\n");

    // Summary counters
    html.push_str("<table width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" style=\"margin-bottom:24px;\"><tr>");
    for (count, label, color, bg) in [
        (new_count, "Nuevos", "#ef4444", "#fef2f2"),
        (continuing_count, "Continúan", "#f59e0b", "#fff7ed"),
        (resolved_count, "Resueltos", "#10b981", "#ecfdf5"),
    ] {
        html.push_str(&format!(
            "<td width=\"33%\" style=\"padding:0 4px;\"><div style=\"background:{bg};border-radius:8px;padding:16px;text-align:center;\">\
             <div style=\"font-size:28px;font-weight:800;color:{color};\">{count}</div>\
             <div style=\"font-size:12px;color:#64748b;text-transform:uppercase;\">{label}</div></div></td>"
        ));
    }
    html.push_str("</tr></table>\n");

    html.push_str(&detailed_section(
        "Nuevos Desabastecimientos",
        "🆕",
        "#fef2f2",
        "#ef4444",
        "#dc2626",
        &report.new_items,
    ));
    html.push_str(&detailed_section(
        "Continúan en Desabastecimiento",
        "⚠️",
        "#fff7ed",
        "#f59e0b",
        "#d97706",
        &report.continuing_items,
    ));
    html.push_str(&resolved_section(&report.resolved_items));

    // Footer
    html.push_str("<div style=\"text-align:center;padding:16px;color:#94a3b8;font-size:12px;border-top:1px solid #e2e8f0;margin-top:24px;\">");
    html.push_str("<p style=\"margin:0;\">Generado automáticamente por CIMA Watch</p>");
    html.push_str("<p style=\"margin:4px 0 0;\">Datos de la API de CIMA — AEMPS</p>");
    html.push_str("</div>\n</div>\n</body>\n</html>\n");

    html
}

fn detailed_section(
    title: &str,
    icon: &str,
    bg: &str,
    border: &str,
    text_color: &str,
    items: &[ReportEntry],
) -> String {
    if items.is_empty() {
        return format!(
            "<div style=\"margin-bottom:24px;padding:16px;background:{bg};border-left:4px solid {border};border-radius:8px;\">\
             <h2 style=\"margin:0;font-size:16px;color:{text_color};\">{icon} {title}</h2>\
             <p style=\"margin:8px 0 0;color:#64748b;font-style:italic;\">Ninguno</p></div>\n"
        );
    }

    let mut section = format!(
        "<div style=\"margin-bottom:24px;\">\
         <div style=\"padding:12px 16px;background:{bg};border-left:4px solid {border};border-radius:8px;margin-bottom:12px;\">\
         <h2 style=\"margin:0;font-size:16px;color:{text_color};\">{icon} {title} ({})</h2></div>\n",
        items.len()
    );
    for entry in items {
        section.push_str(&detail_card(entry));
    }
    section.push_str("</div>\n");
    section
}

fn detail_card(entry: &ReportEntry) -> String {
    let code = entry.code.as_deref().unwrap_or("N/A");
    let name = entry.name.as_deref().unwrap_or("Sin nombre");
    let (badge_text, badge_fg, badge_bg, accent) = match entry.verdict {
        Verdict::Critical => ("⚠ CRÍTICO", "#ef4444", "#fef2f2", "#ef4444"),
        Verdict::Alleviated => ("Alternativa disponible", "#10b981", "#ecfdf5", "#0d9488"),
    };

    let mut card = format!(
        "<div style=\"background:#ffffff;border:1px solid #e2e8f0;border-left:4px solid {accent};border-radius:8px;padding:16px;margin-bottom:12px;\">\
         <div style=\"margin-bottom:8px;\">\
         <span style=\"font-family:monospace;font-size:12px;background:#f1f5f9;padding:2px 8px;border-radius:4px;color:#64748b;\">CN: {}</span> \
         <span style=\"display:inline-block;padding:2px 8px;border-radius:999px;font-size:11px;font-weight:700;background:{badge_bg};color:{badge_fg};\">{badge_text}</span></div>\
         <h3 style=\"margin:0 0 10px;font-size:15px;font-weight:700;color:#0f172a;\">{}</h3>\
         <div style=\"font-size:13px;color:#64748b;margin-bottom:10px;\">📅 {} → {}</div>",
        escape(code),
        escape(name),
        format_start(entry.start_date),
        format_end(entry.end_estimate),
    );

    if let Some(observation) = entry.observation.as_deref().filter(|o| !o.is_empty()) {
        card.push_str(&format!(
            "<div style=\"background:#f8fafc;border:1px solid #e2e8f0;border-radius:6px;padding:10px;font-size:13px;color:#475569;\">\
             <strong style=\"color:#0d9488;\">ℹ Observaciones AEMPS:</strong><br>{}</div>",
            escape(observation)
        ));
    }
    card.push_str("</div>\n");
    card
}

fn resolved_section(items: &[ResolvedEntry]) -> String {
    if items.is_empty() {
        return "<div style=\"margin-bottom:24px;padding:16px;background:#ecfdf5;border-left:4px solid #10b981;border-radius:8px;\">\
                <h2 style=\"margin:0;font-size:16px;color:#059669;\">✅ Restablecidos</h2>\
                <p style=\"margin:8px 0 0;color:#64748b;font-style:italic;\">Ninguno</p></div>\n"
            .to_string();
    }

    let mut section = format!(
        "<div style=\"margin-bottom:24px;\">\
         <div style=\"padding:12px 16px;background:#ecfdf5;border-left:4px solid #10b981;border-radius:8px 8px 0 0;\">\
         <h2 style=\"margin:0;font-size:16px;color:#059669;\">✅ Restablecidos ({})</h2></div>\
         <table style=\"width:100%;border-collapse:collapse;background:#ffffff;border:1px solid #e2e8f0;\">\
         <thead><tr style=\"background:#f8fafc;\">\
         <th style=\"padding:8px 12px;text-align:left;font-size:12px;color:#64748b;\">CN</th>\
         <th style=\"padding:8px 12px;text-align:left;font-size:12px;color:#64748b;\">Medicamento</th>\
         </tr></thead><tbody>",
        items.len()
    );
    for entry in items {
        section.push_str(&format!(
            "<tr><td style=\"padding:8px 12px;border-bottom:1px solid #e2e8f0;font-family:monospace;font-size:13px;color:#64748b;\">{}</td>\
             <td style=\"padding:8px 12px;border-bottom:1px solid #e2e8f0;font-weight:600;color:#0f172a;\">{}</td></tr>",
            escape(entry.code.as_deref().unwrap_or("N/A")),
            escape(entry.name.as_deref().unwrap_or("Sin nombre")),
        ));
    }
    section.push_str("</tbody></table></div>\n");
    section
}

fn format_start(start: Option<DateTime<Utc>>) -> String {
    start
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn format_end(end: EndEstimate) -> String {
    match end {
        EndEstimate::Date(d) => d.format("%d/%m/%Y").to_string(),
        EndEstimate::Indefinite => "Sin fecha estimada".to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cimawatch_core::diff::DiffResult;
    use cimawatch_core::report::{compose, ReportMeta};
    use cimawatch_core::{ReducedRecord, ShortageRecord};

    fn meta() -> ReportMeta {
        ReportMeta {
            hospital_name: "Hospital La Paz".into(),
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        }
    }

    fn record(code: &str, observation: &str) -> ShortageRecord {
        ShortageRecord {
            code: Some(code.into()),
            registry_number: None,
            name: Some("AMOXICILINA 500MG <cápsulas>".into()),
            active: Some(true),
            observation: Some(observation.into()),
            start_date: Some(1_700_000_000_000),
            end_date: None,
        }
    }

    #[test]
    fn test_subject_urgent_singular_and_plural() {
        let one = compose(
            &DiffResult {
                new_items: vec![record("1", "")],
                ..Default::default()
            },
            meta(),
        );
        assert_eq!(
            subject(&one),
            "🚨 CIMA Watch — 1 nuevo desabastecimiento (30/08/2026)"
        );

        let two = compose(
            &DiffResult {
                new_items: vec![record("1", ""), record("2", "")],
                ..Default::default()
            },
            meta(),
        );
        assert!(subject(&two).contains("2 nuevos desabastecimientos"));
    }

    #[test]
    fn test_subject_resolved_only() {
        let report = compose(
            &DiffResult {
                resolved_items: vec![ReducedRecord::placeholder("111111")],
                ..Default::default()
            },
            meta(),
        );
        assert_eq!(
            subject(&report),
            "✅ CIMA Watch — 1 medicamento restablecido (30/08/2026)"
        );
    }

    #[test]
    fn test_subject_routine() {
        let report = compose(&DiffResult::default(), meta());
        assert_eq!(subject(&report), "📊 CIMA Watch — Informe diario (30/08/2026)");
    }

    #[test]
    fn test_all_sections_rendered_even_when_empty() {
        let html = render_html(&compose(&DiffResult::default(), meta()));
        assert!(html.contains("Nuevos Desabastecimientos"));
        assert!(html.contains("Continúan en Desabastecimiento"));
        assert!(html.contains("Restablecidos"));
        assert_eq!(html.matches("Ninguno").count(), 3);
    }

    #[test]
    fn test_indefinite_end_renders_placeholder_text() {
        let html = render_html(&compose(
            &DiffResult {
                new_items: vec![record("712345", "")],
                ..Default::default()
            },
            meta(),
        ));
        assert!(html.contains("Sin fecha estimada"));
        assert!(html.contains("CN: 712345"));
    }

    #[test]
    fn test_critical_badge_follows_verdict() {
        let html = render_html(&compose(
            &DiffResult {
                new_items: vec![
                    record("1", "medicamento extranjero"),
                    record("2", "existen otros medicamentos"),
                ],
                ..Default::default()
            },
            meta(),
        ));
        assert!(html.contains("CRÍTICO"));
        assert!(html.contains("Alternativa disponible"));
    }

    #[test]
    fn test_record_text_is_escaped() {
        let html = render_html(&compose(
            &DiffResult {
                new_items: vec![record("712345", "dosis < 5mg & \"control\"")],
                ..Default::default()
            },
            meta(),
        ));
        assert!(html.contains("&lt;cápsulas&gt;"));
        assert!(html.contains("dosis &lt; 5mg &amp; &quot;control&quot;"));
    }
}
